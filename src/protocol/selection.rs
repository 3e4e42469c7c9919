//! One-hot selection vectors

use crate::error::{selection_err, Result};

/// One-hot vector: exactly one entry is 1, the rest are 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionVector {
    slots: Vec<u64>,
    index: usize,
}

impl SelectionVector {
    /// The one-hot vector of length `len` selecting `index`
    pub fn one_hot(len: usize, index: usize) -> Result<Self> {
        if index >= len {
            return Err(selection_err!("index {} out of range for length {}", index, len));
        }
        let mut slots = vec![0; len];
        slots[index] = 1;
        Ok(Self { slots, index })
    }

    /// Validate an externally built vector
    pub fn from_slice(values: &[u64]) -> Result<Self> {
        if let Some(bad) = values.iter().find(|&&v| v > 1) {
            return Err(selection_err!("entry {} is neither 0 nor 1", bad));
        }
        let mut ones = values.iter().enumerate().filter(|(_, &v)| v == 1);
        match (ones.next(), ones.next()) {
            (Some((index, _)), None) => Ok(Self {
                slots: values.to_vec(),
                index,
            }),
            (None, _) => Err(selection_err!("no entry set")),
            (Some(_), Some(_)) => Err(selection_err!("more than one entry set")),
        }
    }

    /// Selected index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for a zero-length vector
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entries as plaintext slot values
    pub fn as_slots(&self) -> &[u64] {
        &self.slots
    }

    /// Entry `i` repeated across `width` slots: all ones iff `i` is selected
    pub fn broadcast(&self, i: usize, width: usize) -> Vec<u64> {
        vec![self.slots.get(i).copied().unwrap_or(0); width]
    }
}
