//! XTEA key material and lookup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{CryptoError, Result};

/// A 128-bit XTEA key: exactly four 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XteaKey([u32; 4]);

impl XteaKey {
    pub const ZERO: Self = Self([0; 4]);

    pub const fn new(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// Build a key from a word slice, rejecting any length other than 4.
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let words: [u32; 4] = words
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(words.len()))?;
        Ok(Self(words))
    }

    /// Build a key from signed words, the form key dumps usually use.
    pub fn from_signed_words(words: &[i32]) -> Result<Self> {
        if words.len() != 4 {
            return Err(CryptoError::InvalidKeyLength(words.len()));
        }
        Ok(Self([
            words[0] as u32,
            words[1] as u32,
            words[2] as u32,
            words[3] as u32,
        ]))
    }

    /// An all-zero key marks an archive stored in the clear.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    pub fn words(&self) -> &[u32; 4] {
        &self.0
    }
}

/// One entry of a JSON key file.
#[derive(Debug, Deserialize)]
struct KeyEntry {
    index: u8,
    archive: u32,
    key: [i32; 4],
}

/// Lookup of per-archive decryption keys.
#[derive(Debug, Default)]
pub struct KeyService {
    keys: HashMap<(u8, u32), XteaKey>,
}

impl KeyService {
    /// Create a key service with no keys.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the key for an archive, if one is known.
    pub fn get_key(&self, index_id: u8, archive_id: u32) -> Option<&XteaKey> {
        self.keys.get(&(index_id, archive_id))
    }

    pub fn add_key(&mut self, index_id: u8, archive_id: u32, key: XteaKey) {
        self.keys.insert((index_id, archive_id), key);
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Load keys from a JSON array of `{index, archive, key: [i32; 4]}`.
    pub fn load_json(&mut self, content: &str) -> Result<usize> {
        let entries: Vec<KeyEntry> = serde_json::from_str(content)?;
        let mut loaded = 0;
        for entry in entries {
            let key = XteaKey::from_signed_words(&entry.key)?;
            if key.is_zero() {
                debug!(
                    "Skipping zero key for archive {}/{}",
                    entry.index, entry.archive
                );
                continue;
            }
            self.add_key(entry.index, entry.archive, key);
            loaded += 1;
        }
        info!("Loaded {} keys from JSON", loaded);
        Ok(loaded)
    }

    /// Load keys from whitespace text: `index archive w0 w1 w2 w3` per line.
    /// Lines starting with `#` and blank lines are skipped; malformed lines
    /// are logged and skipped.
    pub fn load_text(&mut self, content: &str) -> usize {
        let mut loaded = 0;
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_text_entry(line) {
                Ok((index, archive, key)) => {
                    self.add_key(index, archive, key);
                    loaded += 1;
                }
                Err(e) => {
                    warn!("Skipping invalid key line {}: {}", line_num + 1, e);
                }
            }
        }
        info!("Loaded {} keys from text", loaded);
        loaded
    }

    /// Load a key file, picking the format from the extension (`.json`, else
    /// whitespace text).
    pub fn load_key_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if ext == "json" {
            self.load_json(&content)
        } else {
            Ok(self.load_text(&content))
        }
    }
}

fn parse_text_entry(line: &str) -> std::result::Result<(u8, u32, XteaKey), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 6 {
        return Err(format!("expected 6 fields, got {}", parts.len()));
    }
    let index = parts[0].parse::<u8>().map_err(|e| e.to_string())?;
    let archive = parts[1].parse::<u32>().map_err(|e| e.to_string())?;
    let mut words = [0i32; 4];
    for (slot, part) in words.iter_mut().zip(&parts[2..]) {
        *slot = part.parse::<i32>().map_err(|e| e.to_string())?;
    }
    XteaKey::from_signed_words(&words).map(|key| (index, archive, key)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn key_length_is_validated() {
        assert!(XteaKey::from_words(&[1, 2, 3, 4]).is_ok());
        assert!(matches!(
            XteaKey::from_words(&[1, 2, 3]),
            Err(CryptoError::InvalidKeyLength(3))
        ));
        assert!(matches!(
            XteaKey::from_signed_words(&[1, 2, 3, 4, 5]),
            Err(CryptoError::InvalidKeyLength(5))
        ));
    }

    #[test]
    fn zero_key() {
        assert!(XteaKey::ZERO.is_zero());
        assert!(!XteaKey::new([0, 0, 0, 1]).is_zero());
    }

    #[test]
    fn add_and_get() {
        let mut service = KeyService::empty();
        let key = XteaKey::new([1, 2, 3, 4]);
        service.add_key(5, 123, key);
        assert_eq!(service.get_key(5, 123), Some(&key));
        assert_eq!(service.get_key(5, 124), None);
        assert_eq!(service.key_count(), 1);
    }

    #[test]
    fn load_json() {
        let mut service = KeyService::empty();
        let loaded = service
            .load_json(
                r#"[
                    {"index": 5, "archive": 123, "key": [1, -2, 3, -4]},
                    {"index": 5, "archive": 124, "key": [0, 0, 0, 0]}
                ]"#,
            )
            .unwrap();
        assert_eq!(loaded, 1);
        let key = service.get_key(5, 123).unwrap();
        assert_eq!(key.words(), &[1, (-2i32) as u32, 3, (-4i32) as u32]);
        assert!(service.get_key(5, 124).is_none());
    }

    #[test]
    fn load_text_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "# region keys")?;
        writeln!(file, "5 12850 11, 22 33 44")?;
        writeln!(file, "5 12850 11 22 33 44")?;
        writeln!(file, "5 12851 -1 -2 -3 -4")?;

        let mut service = KeyService::empty();
        let loaded = service.load_key_file(file.path())?;
        assert_eq!(loaded, 2);
        assert!(service.get_key(5, 12850).is_some());
        assert!(service.get_key(5, 12851).is_some());
        Ok(())
    }
}
