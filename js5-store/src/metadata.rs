//! Index metadata: the per-index directory of archives and files.
//!
//! The disk format stores one metadata archive per index inside the
//! reference index (255). The layout is protocol-versioned: revisions only
//! exist from protocol 6, and counts/id-deltas widen from 16-bit values to
//! big-smart encodings at protocol 7.

use std::collections::BTreeMap;

use js5_parser::Reader;
use tracing::debug;

use crate::{Result, StoreError};

/// A file registered in an archive's directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub id: u32,
    pub name_hash: Option<i32>,
}

/// An archive registered in an index's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    pub id: u32,
    pub name_hash: Option<i32>,
    pub crc: u32,
    pub revision: i32,
    pub files: Vec<FileMetadata>,
}

/// The parsed directory of one index.
#[derive(Debug, Clone)]
pub struct IndexMetadata {
    pub id: u8,
    pub protocol: u8,
    pub revision: i32,
    pub compression: u8,
    pub crc: u32,
    pub named: bool,
    archives: BTreeMap<u32, ArchiveMetadata>,
    names: BTreeMap<i32, u32>,
}

impl IndexMetadata {
    /// Parse a decoded metadata archive.
    ///
    /// `compression` and `crc` describe the metadata container itself and
    /// come from the enclosing storage layer.
    pub fn parse(index_id: u8, compression: u8, crc: u32, data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        let protocol = reader.read_u8()?;
        if !(5..=7).contains(&protocol) {
            return Err(StoreError::UnsupportedProtocol(protocol));
        }
        let revision = if protocol >= 6 { reader.read_i32()? } else { -1 };
        let flags = reader.read_u8()?;
        let named = flags & 0x1 != 0;

        let archive_count = read_count(&mut reader, protocol)?;
        let mut ids = Vec::with_capacity(archive_count);
        let mut id = 0u32;
        for _ in 0..archive_count {
            id = id.wrapping_add(read_count(&mut reader, protocol)? as u32);
            ids.push(id);
        }

        let name_hashes: Vec<Option<i32>> = if named {
            (0..archive_count)
                .map(|_| reader.read_i32().map(Some))
                .collect::<std::result::Result<_, _>>()?
        } else {
            vec![None; archive_count]
        };
        let crcs: Vec<u32> = (0..archive_count)
            .map(|_| reader.read_u32())
            .collect::<std::result::Result<_, _>>()?;
        let revisions: Vec<i32> = (0..archive_count)
            .map(|_| reader.read_i32())
            .collect::<std::result::Result<_, _>>()?;

        let mut file_counts = Vec::with_capacity(archive_count);
        for _ in 0..archive_count {
            file_counts.push(read_count(&mut reader, protocol)?);
        }
        let mut file_ids: Vec<Vec<u32>> = Vec::with_capacity(archive_count);
        for &count in &file_counts {
            let mut ids = Vec::with_capacity(count);
            let mut id = 0u32;
            for _ in 0..count {
                id = id.wrapping_add(read_count(&mut reader, protocol)? as u32);
                ids.push(id);
            }
            file_ids.push(ids);
        }
        let mut file_names: Vec<Vec<Option<i32>>> = Vec::with_capacity(archive_count);
        if named {
            for &count in &file_counts {
                let names: Vec<Option<i32>> = (0..count)
                    .map(|_| reader.read_i32().map(Some))
                    .collect::<std::result::Result<_, _>>()?;
                file_names.push(names);
            }
        } else {
            for &count in &file_counts {
                file_names.push(vec![None; count]);
            }
        }

        let mut archives = BTreeMap::new();
        let mut names = BTreeMap::new();
        for (position, archive_id) in ids.into_iter().enumerate() {
            let files = file_ids[position]
                .iter()
                .zip(&file_names[position])
                .map(|(&id, &name_hash)| FileMetadata { id, name_hash })
                .collect();
            let metadata = ArchiveMetadata {
                id: archive_id,
                name_hash: name_hashes[position],
                crc: crcs[position],
                revision: revisions[position],
                files,
            };
            if let Some(hash) = metadata.name_hash {
                names.insert(hash, archive_id);
            }
            archives.insert(archive_id, metadata);
        }

        debug!(
            "Index {}: protocol {}, revision {}, {} archives",
            index_id,
            protocol,
            revision,
            archives.len()
        );

        Ok(Self {
            id: index_id,
            protocol,
            revision,
            compression,
            crc,
            named,
            archives,
            names,
        })
    }

    /// Assemble metadata directly (the flat format carries no binary
    /// directory to parse).
    pub(crate) fn from_parts(
        id: u8,
        revision: i32,
        compression: u8,
        crc: u32,
        named: bool,
        entries: Vec<ArchiveMetadata>,
    ) -> Self {
        let mut archives = BTreeMap::new();
        let mut names = BTreeMap::new();
        for metadata in entries {
            if let Some(hash) = metadata.name_hash {
                names.insert(hash, metadata.id);
            }
            archives.insert(metadata.id, metadata);
        }
        Self {
            id,
            protocol: 7,
            revision,
            compression,
            crc,
            named,
            archives,
            names,
        }
    }

    pub fn archive(&self, archive_id: u32) -> Option<&ArchiveMetadata> {
        self.archives.get(&archive_id)
    }

    /// Resolve an archive id from a name hash; only named indexes resolve.
    pub fn archive_by_name_hash(&self, name_hash: i32) -> Option<u32> {
        self.names.get(&name_hash).copied()
    }

    /// Archive ids in ascending order.
    pub fn archive_ids(&self) -> Vec<u32> {
        self.archives.keys().copied().collect()
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }
}

/// Counts and id-deltas are 16-bit before protocol 7, big-smart after.
fn read_count(reader: &mut Reader<'_>, protocol: u8) -> Result<usize> {
    if protocol >= 7 {
        let value = reader.read_big_smart()?;
        if value < 0 {
            return Err(StoreError::InvalidCount(value));
        }
        Ok(value as usize)
    } else {
        Ok(usize::from(reader.read_u16()?))
    }
}
