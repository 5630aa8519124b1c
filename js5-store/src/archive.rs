//! The in-memory archive model.
//!
//! An archive is built in two phases: the directory phase (identity,
//! metadata, file ids, the compressed blob) happens when its index is
//! parsed; the decode phase (decrypt, decompress, split into per-file byte
//! ranges) runs lazily on first access and is memoized, so the payload is
//! produced at most once and shared immutably afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use js5_codec::{decode_container, split_files};
use js5_crypto::XteaKey;
use parking_lot::Mutex;
use tracing::trace;

use crate::Result;
use crate::metadata::FileMetadata;

/// One archive of an index, with its compressed payload.
#[derive(Debug)]
pub struct CacheArchive {
    index_id: u8,
    archive_id: u32,
    name_hash: Option<i32>,
    crc: u32,
    revision: i32,
    key: Option<XteaKey>,
    directory: Vec<FileMetadata>,
    compressed: Bytes,
    decoded: Mutex<Option<Arc<ArchiveFiles>>>,
}

/// The decoded, immutable per-file payloads of an archive.
#[derive(Debug)]
pub struct ArchiveFiles {
    entries: BTreeMap<u32, Bytes>,
    names: BTreeMap<i32, u32>,
}

impl CacheArchive {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        index_id: u8,
        archive_id: u32,
        name_hash: Option<i32>,
        crc: u32,
        revision: i32,
        key: Option<XteaKey>,
        directory: Vec<FileMetadata>,
        compressed: Bytes,
    ) -> Self {
        Self {
            index_id,
            archive_id,
            name_hash,
            crc,
            revision,
            key,
            directory,
            compressed,
            decoded: Mutex::new(None),
        }
    }

    pub fn index_id(&self) -> u8 {
        self.index_id
    }

    pub fn archive_id(&self) -> u32 {
        self.archive_id
    }

    pub fn name_hash(&self) -> Option<i32> {
        self.name_hash
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }

    pub fn revision(&self) -> i32 {
        self.revision
    }

    /// Ids of the files this archive holds, in directory order.
    pub fn file_ids(&self) -> Vec<u32> {
        self.directory.iter().map(|f| f.id).collect()
    }

    /// The raw compressed container blob.
    pub fn compressed(&self) -> &Bytes {
        &self.compressed
    }

    /// Decrypt, decompress and split the payload. Runs at most once; every
    /// later call returns the same shared result.
    pub fn files(&self) -> Result<Arc<ArchiveFiles>> {
        let mut decoded = self.decoded.lock();
        if let Some(files) = &*decoded {
            return Ok(files.clone());
        }

        trace!(
            "Decoding archive {}/{} ({} compressed bytes, {} files)",
            self.index_id,
            self.archive_id,
            self.compressed.len(),
            self.directory.len()
        );
        let payload = Bytes::from(decode_container(&self.compressed, self.key.as_ref())?);
        let parts = split_files(&payload, self.directory.len())?;

        let mut entries = BTreeMap::new();
        let mut names = BTreeMap::new();
        for (metadata, part) in self.directory.iter().zip(parts) {
            if let Some(hash) = metadata.name_hash {
                names.insert(hash, metadata.id);
            }
            entries.insert(metadata.id, part);
        }
        let files = Arc::new(ArchiveFiles { entries, names });
        *decoded = Some(files.clone());
        Ok(files)
    }

    /// Decode (if needed) and fetch one file's bytes.
    pub fn file(&self, file_id: u32) -> Result<Option<Bytes>> {
        Ok(self.files()?.get(file_id).cloned())
    }
}

impl ArchiveFiles {
    /// A file's bytes, a view into the decompressed payload.
    pub fn get(&self, file_id: u32) -> Option<&Bytes> {
        self.entries.get(&file_id)
    }

    /// Resolve a file by its name hash.
    pub fn get_by_name_hash(&self, name_hash: i32) -> Option<&Bytes> {
        self.names.get(&name_hash).and_then(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate (file id, bytes) in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Bytes)> {
        self.entries.iter().map(|(&id, data)| (id, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_container(payload: &[u8]) -> Bytes {
        let mut data = vec![0u8];
        data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        data.extend_from_slice(payload);
        Bytes::from(data)
    }

    fn file(id: u32, name_hash: Option<i32>) -> FileMetadata {
        FileMetadata { id, name_hash }
    }

    #[test]
    fn single_file_archive() {
        let archive = CacheArchive::new(
            2,
            10,
            None,
            0,
            1,
            None,
            vec![file(0, None)],
            store_container(b"only file"),
        );
        let files = archive.files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files.get(0).unwrap(), &Bytes::from_static(b"only file"));
    }

    #[test]
    fn multi_file_archive_splits_by_directory() {
        // Two files, one chunk: "abc" + "de" + trailer.
        let mut payload = b"abcde".to_vec();
        payload.extend_from_slice(&3i32.to_be_bytes());
        payload.extend_from_slice(&2i32.to_be_bytes());
        payload.push(1);

        let archive = CacheArchive::new(
            2,
            10,
            None,
            0,
            1,
            None,
            vec![file(4, Some(1111)), file(9, None)],
            store_container(&payload),
        );
        let files = archive.files().unwrap();
        assert_eq!(files.get(4).unwrap(), &Bytes::from_static(b"abc"));
        assert_eq!(files.get(9).unwrap(), &Bytes::from_static(b"de"));
        assert_eq!(files.get_by_name_hash(1111).unwrap(), &Bytes::from_static(b"abc"));
        assert!(files.get(5).is_none());
        assert_eq!(archive.file(9).unwrap(), Some(Bytes::from_static(b"de")));
    }

    #[test]
    fn decode_is_memoized() {
        let archive = CacheArchive::new(
            2,
            10,
            None,
            0,
            1,
            None,
            vec![file(0, None)],
            store_container(b"payload"),
        );
        let first = archive.files().unwrap();
        let second = archive.files().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn corrupt_container_is_terminal() {
        let archive = CacheArchive::new(
            2,
            10,
            None,
            0,
            1,
            None,
            vec![file(0, None)],
            Bytes::from_static(&[9, 0, 0, 0, 1, 0]),
        );
        assert!(archive.files().is_err());
        assert!(archive.files().is_err());
    }
}
