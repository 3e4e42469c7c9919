//! Secure Q-table update
//!
//! For every state i the update builds `mask = broadcast(v[i]) ⊙ w`, which is
//! the one-hot action vector at the target state and all zeros elsewhere, and
//! moves the masked slot from its old value to `Q_new`:
//!
//! ```text
//! T[i] ← T[i] + refresh(mask ⊙ Q_new) − refresh(mask ⊙ T[i])
//! ```
//!
//! All S rows are touched so the access pattern does not reveal the state.
//! Rows are staged and committed together: a failure at any state leaves the
//! table exactly as it was.

use std::time::Instant;

use tracing::debug;

use super::selection::SelectionVector;
use super::table::{EncryptedQtable, KeyMaterial};
use crate::error::{scheme_err, Result};
use crate::scheme::HomomorphicScheme;
use crate::transport::{open_ciphertext, seal_ciphertext, SealedChannel};

/// Channel name of the broadcast state entry for row `i`
pub fn state_channel_name(i: usize) -> String {
    format!("VtName_{}", i)
}

/// Channel name of the one-hot action vector
pub const ACTION_CHANNEL: &str = "WtName";

/// Channel name of the broadcast target value
pub const QNEW_CHANNEL: &str = "QnewName";

/// Seal `ct` under `name`, then take and open it on the other side
pub(crate) fn transit<S: HomomorphicScheme>(
    km: &mut KeyMaterial<S>,
    channel: &mut SealedChannel,
    name: &str,
    ct: &S::Ciphertext,
) -> Result<S::Ciphertext> {
    let sealed = seal_ciphertext(&km.scheme, ct, &km.transport, &mut km.rng)?;
    channel.post(name, sealed);
    let sealed = channel.take(name)?;
    open_ciphertext(&km.scheme, &sealed, &km.transport)
}

/// Set slot `action` of row `state` to the mapped value `q_new_mapped`.
///
/// `q_new_mapped` is already codec-mapped into `[0, t)`.
pub fn secure_update<S: HomomorphicScheme>(
    km: &mut KeyMaterial<S>,
    table: &mut EncryptedQtable<S::Ciphertext>,
    state: usize,
    action: usize,
    q_new_mapped: u64,
) -> Result<()> {
    let states = table.states();
    let width = table.actions();
    let v = SelectionVector::one_hot(states, state)?;
    let w = SelectionVector::one_hot(width, action)?;

    let t = km.scheme.plaintext_modulus();
    if q_new_mapped >= t {
        return Err(scheme_err!(
            "mapped value {} not below plaintext modulus {}",
            q_new_mapped,
            t
        ));
    }

    let start = Instant::now();
    let mut channel = SealedChannel::new();

    let w_ct = km.scheme.encrypt(w.as_slots())?;
    let q_ct = km.scheme.encrypt(&vec![q_new_mapped; width])?;
    let q_ct = transit(km, &mut channel, QNEW_CHANNEL, &q_ct)?;

    let mut staged = Vec::with_capacity(states);
    for (i, current) in table.entries().iter().enumerate() {
        let v_ct = km.scheme.encrypt(&v.broadcast(i, width))?;
        let v_ct = transit(km, &mut channel, &state_channel_name(i), &v_ct)?;
        let w_i = transit(km, &mut channel, ACTION_CHANNEL, &w_ct)?;

        let mask = km.scheme.multiply_relin(&v_ct, &w_i)?;
        let new_part = km.scheme.multiply_relin(&mask, &q_ct)?;
        let old_part = km.scheme.multiply_relin(&mask, current)?;

        let new_part = km.scheme.refresh(&new_part, width)?;
        let old_part = km.scheme.refresh(&old_part, width)?;

        let row = km.scheme.add(current, &new_part)?;
        staged.push(km.scheme.sub(&row, &old_part)?);
    }

    table.commit(staged)?;

    debug!(
        states,
        width,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "secure update committed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bfv::{BfvCiphertext, BfvScheme};
    use crate::error::PprlError;
    use crate::params::SchemeParams;
    use crate::protocol::table::ConfidentialityWaiver;
    use crate::transport::{mismatched_test_keys, test_keys};

    type Table = EncryptedQtable<BfvCiphertext>;

    fn setup(states: usize, actions: usize) -> (KeyMaterial<BfvScheme>, Table) {
        let scheme = BfvScheme::with_seed(SchemeParams::default(), 21).unwrap();
        let mut km = KeyMaterial::with_seed(scheme, test_keys().clone(), 21);
        let table = EncryptedQtable::zeros(&mut km, states, actions).unwrap();
        (km, table)
    }

    fn plain(km: &KeyMaterial<BfvScheme>, table: &Table) -> Vec<Vec<u64>> {
        table
            .debug_decrypt(&km.scheme, ConfidentialityWaiver::acknowledge())
            .unwrap()
    }

    #[test]
    fn test_update_sets_single_slot() {
        let (mut km, mut table) = setup(3, 4);
        secure_update(&mut km, &mut table, 1, 2, 3250).unwrap();

        assert_eq!(
            plain(&km, &table),
            vec![vec![0, 0, 0, 0], vec![0, 0, 3250, 0], vec![0, 0, 0, 0]]
        );
    }

    #[test]
    fn test_update_overwrites_previous_value() {
        let (mut km, mut table) = setup(2, 2);
        secure_update(&mut km, &mut table, 0, 1, 500).unwrap();
        secure_update(&mut km, &mut table, 0, 0, 19_000).unwrap();
        secure_update(&mut km, &mut table, 0, 1, 42).unwrap();

        assert_eq!(plain(&km, &table), vec![vec![19_000, 42], vec![0, 0]]);
    }

    #[test]
    fn test_update_rejects_out_of_range_indices() {
        let (mut km, mut table) = setup(2, 2);
        assert!(matches!(
            secure_update(&mut km, &mut table, 2, 0, 1),
            Err(PprlError::InvalidSelection(_))
        ));
        assert!(matches!(
            secure_update(&mut km, &mut table, 0, 2, 1),
            Err(PprlError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_failed_update_leaves_table_untouched() {
        let (mut km, table) = setup(3, 2);
        let mut rows = table.entries().to_vec();

        // a three-part row cannot be multiplied, so the middle iteration fails
        let three_part = km.scheme.multiply(&rows[1], &rows[1]).unwrap();
        rows[1] = three_part;
        let mut broken = EncryptedQtable::from_entries(rows.clone(), 2).unwrap();

        let err = secure_update(&mut km, &mut broken, 0, 1, 77).unwrap_err();
        assert!(matches!(err, PprlError::Scheme(_)));
        assert_eq!(broken.entries(), rows.as_slice());
    }

    #[test]
    fn test_transport_failure_leaves_table_untouched() {
        let (mut km, mut table) = setup(3, 2);
        secure_update(&mut km, &mut table, 2, 0, 900).unwrap();
        let before = table.entries().to_vec();

        let keys = std::mem::replace(&mut km.transport, mismatched_test_keys());
        let err = secure_update(&mut km, &mut table, 1, 1, 77).unwrap_err();
        assert!(matches!(err, PprlError::Transport { .. }));
        assert_eq!(table.entries(), before.as_slice());

        km.transport = keys;
        assert_eq!(plain(&km, &table), vec![vec![0, 0], vec![0, 0], vec![900, 0]]);
    }
}
