//! Addressed exchange of sealed ciphertexts
//!
//! Logical name → sealed chunk sequence. Each chunk is an opaque blob
//! addressed by `(name, sequence index)`. The channel lives in memory;
//! [`SealedChannel::persist`] and [`SealedChannel::load`] stage it through a
//! directory for auditing only.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::seal::SealedCiphertext;
use crate::error::{PprlError, Result};

/// In-memory channel of named sealed ciphertexts
#[derive(Debug, Clone, Default)]
pub struct SealedChannel {
    entries: BTreeMap<String, SealedCiphertext>,
}

impl SealedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a sealed ciphertext under `name`, replacing any previous one
    pub fn post(&mut self, name: impl Into<String>, sealed: SealedCiphertext) {
        let name = name.into();
        tracing::trace!(name = %name, chunks = sealed.len(), "posted");
        self.entries.insert(name, sealed);
    }

    /// Remove and return the entry under `name`
    pub fn take(&mut self, name: &str) -> Result<SealedCiphertext> {
        self.entries
            .remove(name)
            .ok_or_else(|| PprlError::transport(format!("nothing posted under {:?}", name)))
    }

    /// Borrow the entry under `name`
    pub fn get(&self, name: &str) -> Option<&SealedCiphertext> {
        self.entries.get(name)
    }

    /// Chunk `seq` of the entry under `name`
    pub fn chunk(&self, name: &str, seq: usize) -> Option<&[u8]> {
        self.entries
            .get(name)
            .and_then(|sealed| sealed.chunks.get(seq))
            .map(Vec::as_slice)
    }

    /// Posted names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write every chunk to `<dir>/<name>/<index>.bin`
    pub fn persist(&self, dir: &Path) -> Result<()> {
        for (name, sealed) in &self.entries {
            let entry_dir = dir.join(name);
            fs::create_dir_all(&entry_dir)?;
            for (idx, chunk) in sealed.chunks.iter().enumerate() {
                fs::write(entry_dir.join(format!("{}.bin", idx)), chunk)?;
            }
        }
        Ok(())
    }

    /// Rebuild a channel from a directory written by [`Self::persist`]
    pub fn load(dir: &Path) -> Result<Self> {
        let mut channel = Self::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();

            let mut indexed = Vec::new();
            for file in fs::read_dir(entry.path())? {
                let path = file?.path();
                let Some(idx) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<usize>().ok())
                else {
                    continue;
                };
                indexed.push((idx, fs::read(&path)?));
            }
            indexed.sort_by_key(|(idx, _)| *idx);

            // sequence indices must be contiguous from zero
            if let Some(gap) = indexed.iter().enumerate().position(|(pos, (idx, _))| pos != *idx) {
                return Err(PprlError::chunk(gap, format!("missing chunk in {:?}", name)));
            }

            let chunks = indexed.into_iter().map(|(_, bytes)| bytes).collect();
            channel.post(name, SealedCiphertext { chunks });
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sealed(chunks: &[&[u8]]) -> SealedCiphertext {
        SealedCiphertext {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
        }
    }

    #[test]
    fn test_post_take() {
        let mut channel = SealedChannel::new();
        channel.post("WtName", sealed(&[b"a", b"bc"]));
        assert_eq!(channel.chunk("WtName", 1), Some(&b"bc"[..]));
        assert_eq!(channel.chunk("WtName", 2), None);

        let taken = channel.take("WtName").unwrap();
        assert_eq!(taken.len(), 2);
        assert!(channel.is_empty());
        assert!(matches!(
            channel.take("WtName"),
            Err(PprlError::Transport { chunk: None, .. })
        ));
    }

    #[test]
    fn test_persist_load_roundtrip() {
        let dir = tempdir().unwrap();
        let mut channel = SealedChannel::new();
        let many: Vec<Vec<u8>> = (0..12u8).map(|i| vec![i; 3]).collect();
        channel.post(
            "VtName_3",
            SealedCiphertext {
                chunks: many.clone(),
            },
        );
        channel.post("QnewName", sealed(&[b"q"]));
        channel.persist(dir.path()).unwrap();

        let loaded = SealedChannel::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        // index 10 must sort after 9, not after 1
        assert_eq!(loaded.get("VtName_3").unwrap().chunks, many);
        assert_eq!(loaded.chunk("QnewName", 0), Some(&b"q"[..]));
    }

    #[test]
    fn test_load_rejects_gap() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("WtName");
        fs::create_dir_all(&entry).unwrap();
        fs::write(entry.join("0.bin"), b"x").unwrap();
        fs::write(entry.join("2.bin"), b"z").unwrap();

        assert!(matches!(
            SealedChannel::load(dir.path()),
            Err(PprlError::Transport { chunk: Some(1), .. })
        ));
    }
}
