//! Secure action selection
//!
//! `result = Σ_i broadcast(v[i]) ⊙ T[i]` equals the target row. Each
//! broadcast entry crosses the transport under `VtName_i` before the product,
//! and the result crosses under `ResultName`. The argmax over the decrypted
//! row runs in plaintext.

use std::time::Instant;

use tracing::debug;

use super::selection::SelectionVector;
use super::table::{EncryptedQtable, KeyMaterial};
use super::update::{state_channel_name, transit};
use crate::codec::IntegerCodec;
use crate::error::{PprlError, Result};
use crate::scheme::HomomorphicScheme;
use crate::transport::SealedChannel;

/// Channel name of the selected row
pub const RESULT_CHANNEL: &str = "ResultName";

/// Decrypted, unmapped and decoded Q-values of row `state`
pub fn secure_select<S: HomomorphicScheme>(
    km: &mut KeyMaterial<S>,
    table: &EncryptedQtable<S::Ciphertext>,
    codec: &IntegerCodec,
    state: usize,
) -> Result<Vec<f64>> {
    let width = table.actions();
    let v = SelectionVector::one_hot(table.states(), state)?;
    let start = Instant::now();

    let mut channel = SealedChannel::new();
    let mut result = km.scheme.encrypt(&vec![0u64; width])?;
    for (i, row) in table.entries().iter().enumerate() {
        let v_ct = km.scheme.encrypt(&v.broadcast(i, width))?;
        let v_ct = transit(km, &mut channel, &state_channel_name(i), &v_ct)?;
        let masked = km.scheme.multiply_relin(&v_ct, row)?;
        result = km.scheme.add(&result, &masked)?;
    }

    let result = transit(km, &mut channel, RESULT_CHANNEL, &result)?;

    let mut slots = km.scheme.decrypt(&result)?;
    slots.truncate(width);

    debug!(
        states = table.states(),
        width,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "secure select"
    );
    Ok(codec.decode_slots(&slots))
}

/// Index of the largest value; ties go to the lowest index.
///
/// NaN loses to any number. Returns `None` for an empty slice.
pub fn greedy_action(values: &[f64]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] || (values[best].is_nan() && !value.is_nan()) {
            best = idx;
        }
    }
    Some(best)
}

/// Secure select followed by the greedy choice
pub fn secure_select_action<S: HomomorphicScheme>(
    km: &mut KeyMaterial<S>,
    table: &EncryptedQtable<S::Ciphertext>,
    codec: &IntegerCodec,
    state: usize,
) -> Result<usize> {
    let values = secure_select(km, table, codec, state)?;
    greedy_action(&values)
        .ok_or_else(|| PprlError::InvalidParameters("table has no actions".to_string()))
}
