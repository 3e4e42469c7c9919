//! Encrypted Q-table store and key material

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{PprlError, Result};
use crate::scheme::HomomorphicScheme;
use crate::transport::TransportKeys;

/// Everything the trusted key-holding party owns
pub struct KeyMaterial<S: HomomorphicScheme> {
    /// Homomorphic backend with secret and relinearization keys
    pub scheme: S,
    /// RSA keypair for sealing ciphertexts in transit
    pub transport: TransportKeys,
    /// Randomness for OAEP padding
    pub(crate) rng: ChaCha20Rng,
}

impl<S: HomomorphicScheme> KeyMaterial<S> {
    /// OAEP padding randomness seeded from OS entropy
    pub fn new(scheme: S, transport: TransportKeys) -> Self {
        Self {
            scheme,
            transport,
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Deterministic OAEP padding randomness
    pub fn with_seed(scheme: S, transport: TransportKeys, seed: u64) -> Self {
        Self {
            scheme,
            transport,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl<S: HomomorphicScheme + std::fmt::Debug> std::fmt::Debug for KeyMaterial<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("scheme", &self.scheme)
            .field("chunk_max", &self.transport.chunk_max())
            .finish_non_exhaustive()
    }
}

/// Explicit acknowledgement that plaintext Q-values will be exposed.
///
/// Required by every entry point that decrypts the whole table.
#[derive(Debug, Clone, Copy)]
pub struct ConfidentialityWaiver {
    _private: (),
}

impl ConfidentialityWaiver {
    /// Accept that the caller sees decrypted table contents
    pub fn acknowledge() -> Self {
        tracing::warn!("confidentiality waiver issued: table contents will be decrypted");
        Self { _private: () }
    }
}

/// One ciphertext per state, each holding `actions` Q-value slots
#[derive(Debug, Clone)]
pub struct EncryptedQtable<C> {
    entries: Vec<C>,
    actions: usize,
}

impl<C: Clone> EncryptedQtable<C> {
    /// Encrypt an all-zero row for each of `states` states
    pub fn zeros<S>(km: &mut KeyMaterial<S>, states: usize, actions: usize) -> Result<Self>
    where
        S: HomomorphicScheme<Ciphertext = C>,
    {
        check_shape(states, actions, km.scheme.slot_count())?;
        let zeros = vec![0u64; actions];
        let entries = (0..states)
            .map(|_| km.scheme.encrypt(&zeros))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries, actions })
    }

    /// Wrap existing per-state ciphertexts
    pub fn from_entries(entries: Vec<C>, actions: usize) -> Result<Self> {
        if entries.is_empty() || actions == 0 {
            return Err(PprlError::InvalidParameters(
                "table needs at least one state and one action".to_string(),
            ));
        }
        Ok(Self { entries, actions })
    }

    /// Number of states S
    pub fn states(&self) -> usize {
        self.entries.len()
    }

    /// Number of actions A
    pub fn actions(&self) -> usize {
        self.actions
    }

    pub fn entry(&self, state: usize) -> Option<&C> {
        self.entries.get(state)
    }

    pub fn entries(&self) -> &[C] {
        &self.entries
    }

    /// Replace every entry at once with a fully staged row set
    pub(crate) fn commit(&mut self, staged: Vec<C>) -> Result<()> {
        if staged.len() != self.entries.len() {
            return Err(PprlError::InvalidParameters(format!(
                "staged {} rows for a {}-state table",
                staged.len(),
                self.entries.len()
            )));
        }
        self.entries = staged;
        Ok(())
    }

    /// Decrypt every row, truncated to `actions` slots
    pub fn debug_decrypt<S>(&self, scheme: &S, _waiver: ConfidentialityWaiver) -> Result<Vec<Vec<u64>>>
    where
        S: HomomorphicScheme<Ciphertext = C>,
    {
        self.entries
            .iter()
            .map(|ct| {
                let mut slots = scheme.decrypt(ct)?;
                slots.truncate(self.actions);
                Ok(slots)
            })
            .collect()
    }
}

pub(crate) fn check_shape(states: usize, actions: usize, slots: usize) -> Result<()> {
    if states == 0 || actions == 0 {
        return Err(PprlError::InvalidParameters(
            "table needs at least one state and one action".to_string(),
        ));
    }
    if actions > slots {
        return Err(PprlError::InvalidParameters(format!(
            "{} actions exceed the {} plaintext slots",
            actions, slots
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bfv::BfvScheme;
    use crate::params::SchemeParams;
    use crate::transport::test_keys;

    fn key_material() -> KeyMaterial<BfvScheme> {
        let scheme = BfvScheme::with_seed(SchemeParams::default(), 9).unwrap();
        KeyMaterial::with_seed(scheme, test_keys().clone(), 9)
    }

    #[test]
    fn test_zeros_decrypts_to_zero() {
        let mut km = key_material();
        let table = EncryptedQtable::zeros(&mut km, 3, 4).unwrap();
        assert_eq!(table.states(), 3);

        let plain = table
            .debug_decrypt(&km.scheme, ConfidentialityWaiver::acknowledge())
            .unwrap();
        assert_eq!(plain, vec![vec![0; 4]; 3]);
    }

    #[test]
    fn test_zeros_rejects_too_many_actions() {
        let mut km = key_material();
        assert!(matches!(
            EncryptedQtable::zeros(&mut km, 2, 17),
            Err(PprlError::InvalidParameters(_))
        ));
        assert!(EncryptedQtable::zeros(&mut km, 0, 4).is_err());
    }

    #[test]
    fn test_commit_requires_full_row_set() {
        let mut km = key_material();
        let mut table = EncryptedQtable::zeros(&mut km, 2, 2).unwrap();
        let one_row = vec![table.entries()[0].clone()];
        assert!(table.commit(one_row).is_err());
        assert_eq!(table.states(), 2);
    }
}
