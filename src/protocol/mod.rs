//! Secure Q-table protocol
//!
//! The Q-table lives as one homomorphic ciphertext per state. Updates and
//! queries index into it with encrypted one-hot vectors, so every row is
//! touched on every call.
//!
//! Trust model: the party running the protocol holds the homomorphic secret
//! key, because the noise refresh inside [`secure_update`] decrypts and
//! re-encrypts. Confidentiality covers table storage and transit only.
//!
//! # Example
//!
//! ```no_run
//! use secure_qtable::bfv::BfvScheme;
//! use secure_qtable::codec::IntegerCodec;
//! use secure_qtable::params::{SchemeParams, TransportParams};
//! use secure_qtable::protocol::SecureQtable;
//! use secure_qtable::transport::TransportKeys;
//!
//! let scheme = BfvScheme::generate(SchemeParams::default()).unwrap();
//! let keys = TransportKeys::generate(&TransportParams::default(), &mut rand::thread_rng()).unwrap();
//! let mut table = SecureQtable::new(scheme, keys, IntegerCodec::default(), 16, 4).unwrap();
//!
//! table.update(5, 2, 3.25).unwrap();
//! assert_eq!(table.select(5).unwrap(), vec![0.0, 0.0, 3.25, 0.0]);
//! assert_eq!(table.select_action(5).unwrap(), 2);
//! ```

mod select;
mod selection;
mod table;
mod update;

pub use select::{greedy_action, secure_select, secure_select_action, RESULT_CHANNEL};
pub use selection::SelectionVector;
pub use table::{ConfidentialityWaiver, EncryptedQtable, KeyMaterial};
pub use update::{secure_update, state_channel_name, ACTION_CHANNEL, QNEW_CHANNEL};

use crate::codec::IntegerCodec;
use crate::error::{PprlError, Result};
use crate::scheme::HomomorphicScheme;
use crate::transport::TransportKeys;
use table::check_shape;

/// Key material, encrypted table and codec bundled for an RL driver
pub struct SecureQtable<S: HomomorphicScheme> {
    km: KeyMaterial<S>,
    table: EncryptedQtable<S::Ciphertext>,
    codec: IntegerCodec,
}

impl<S: HomomorphicScheme> SecureQtable<S> {
    /// Zero-initialized `states × actions` table
    pub fn new(
        scheme: S,
        transport: TransportKeys,
        codec: IntegerCodec,
        states: usize,
        actions: usize,
    ) -> Result<Self> {
        Self::from_key_material(KeyMaterial::new(scheme, transport), codec, states, actions)
    }

    /// Zero-initialized table over existing key material; checks shape and codec range
    pub fn from_key_material(
        mut km: KeyMaterial<S>,
        codec: IntegerCodec,
        states: usize,
        actions: usize,
    ) -> Result<Self> {
        check_shape(states, actions, km.scheme.slot_count())?;
        let t = km.scheme.plaintext_modulus();
        if 2 * codec.bound() as u128 > t as u128 {
            return Err(PprlError::InvalidParameters(format!(
                "codec range 2·{} exceeds plaintext modulus {}",
                codec.bound(),
                t
            )));
        }

        let table = EncryptedQtable::zeros(&mut km, states, actions)?;
        Ok(Self { km, table, codec })
    }

    /// Number of states S
    pub fn states(&self) -> usize {
        self.table.states()
    }

    /// Number of actions A
    pub fn actions(&self) -> usize {
        self.table.actions()
    }

    /// Codec used by update and select
    pub fn codec(&self) -> &IntegerCodec {
        &self.codec
    }

    /// Encrypted rows
    pub fn table(&self) -> &EncryptedQtable<S::Ciphertext> {
        &self.table
    }

    /// Scheme and transport keys
    pub fn key_material(&self) -> &KeyMaterial<S> {
        &self.km
    }

    /// Set Q(state, action) to `q`; fails on values outside the codec range
    pub fn update(&mut self, state: usize, action: usize, q: f64) -> Result<()> {
        let mapped = self.codec.to_slot(q)?;
        secure_update(&mut self.km, &mut self.table, state, action, mapped)
    }

    /// Decoded Q-values of `state`
    pub fn select(&mut self, state: usize) -> Result<Vec<f64>> {
        secure_select(&mut self.km, &self.table, &self.codec, state)
    }

    /// Greedy action at `state`
    pub fn select_action(&mut self, state: usize) -> Result<usize> {
        secure_select_action(&mut self.km, &self.table, &self.codec, state)
    }

    /// Re-zero the table at a trial boundary
    pub fn reset(&mut self) -> Result<()> {
        let (states, actions) = (self.states(), self.actions());
        self.table = EncryptedQtable::zeros(&mut self.km, states, actions)?;
        Ok(())
    }

    /// Unmap and decode raw slot values
    pub fn decode_slots(&self, slots: &[u64]) -> Vec<f64> {
        self.codec.decode_slots(slots)
    }

    /// Decrypt and decode the whole table
    pub fn debug_decrypt(&self, waiver: ConfidentialityWaiver) -> Result<Vec<Vec<f64>>> {
        let rows = self.table.debug_decrypt(&self.km.scheme, waiver)?;
        Ok(rows.iter().map(|row| self.decode_slots(row)).collect())
    }

    /// Mean squared error between the decrypted table and a plaintext shadow
    pub fn mse_against(&self, shadow: &[Vec<f64>], waiver: ConfidentialityWaiver) -> Result<f64> {
        if shadow.len() != self.states() || shadow.iter().any(|row| row.len() != self.actions()) {
            return Err(PprlError::InvalidParameters(format!(
                "shadow table shape does not match {}×{}",
                self.states(),
                self.actions()
            )));
        }

        let decrypted = self.debug_decrypt(waiver)?;
        let sum: f64 = decrypted
            .iter()
            .flatten()
            .zip(shadow.iter().flatten())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        Ok(sum / (self.states() * self.actions()) as f64)
    }
}

impl<S> std::fmt::Debug for SecureQtable<S>
where
    S: HomomorphicScheme + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureQtable")
            .field("states", &self.states())
            .field("actions", &self.actions())
            .field("codec", &self.codec)
            .field("km", &self.km)
            .finish()
    }
}
