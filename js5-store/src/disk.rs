//! The sector-chained disk format.
//!
//! One monolithic data file (`main_file_cache.dat2`) holds every index's
//! payload as chains of 520-byte sectors; one pointer file per index
//! (`main_file_cache.idxN`) maps archive ids to chain heads. The reference
//! index (255) stores a metadata archive per index describing its archives
//! and files.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use js5_codec::{Compression, decode_container};
use js5_crypto::KeyService;
use js5_parser::{CacheVersion, Era};
use tracing::{debug, trace};

use crate::archive::CacheArchive;
use crate::metadata::IndexMetadata;
use crate::provider::{CacheProvider, FileProvider};
use crate::single_flight::SingleFlight;
use crate::types::{
    ArchivePointer, MAIN_DATA_FILE, POINTER_ENTRY_SIZE, REFERENCE_INDEX, SECTOR_EXTENDED_HEADER_SIZE,
    SECTOR_HEADER_SIZE, SECTOR_SIZE, index_file_name,
};
use crate::{Result, StoreError};

/// [`CacheProvider`] over the client's sector-chained disk format.
pub struct DiskCacheProvider<F: FileProvider> {
    files: F,
    era: Era,
    keys: Option<KeyService>,
    data: SingleFlight<(), Option<Bytes>>,
    pointers: SingleFlight<u8, Option<Bytes>>,
    metadata: SingleFlight<u8, Option<Arc<IndexMetadata>>>,
    archives: SingleFlight<(u8, u32), Option<Arc<CacheArchive>>>,
}

impl<F: FileProvider> DiskCacheProvider<F> {
    pub fn new(files: F, era: Era) -> Self {
        Self {
            files,
            era,
            keys: None,
            data: SingleFlight::new(),
            pointers: SingleFlight::new(),
            metadata: SingleFlight::new(),
            archives: SingleFlight::new(),
        }
    }

    /// Attach a key lookup for encrypted archives.
    pub fn with_keys(mut self, keys: KeyService) -> Self {
        self.keys = Some(keys);
        self
    }

    async fn data_file(&self) -> Result<Option<Bytes>> {
        self.data
            .get_or_try_init((), || self.files.get_file(MAIN_DATA_FILE))
            .await
    }

    async fn pointer_file(&self, index_id: u8) -> Result<Option<Bytes>> {
        self.pointers
            .get_or_try_init(index_id, || async move {
                let name = index_file_name(index_id);
                self.files.get_file(&name).await
            })
            .await
    }

    /// Read an archive's raw container blob from its sector chain.
    pub async fn raw_archive(&self, index_id: u8, archive_id: u32) -> Result<Option<Bytes>> {
        let Some(pointers) = self.pointer_file(index_id).await? else {
            return Ok(None);
        };
        let Some(pointer) = read_pointer(&pointers, archive_id) else {
            return Ok(None);
        };
        let Some(data) = self.data_file().await? else {
            return Ok(None);
        };
        read_sector_chain(&data, index_id, archive_id, pointer)
    }

    async fn index_metadata(&self, index_id: u8) -> Result<Option<Arc<IndexMetadata>>> {
        self.metadata
            .get_or_try_init(index_id, || async move {
                let Some(blob) = self.raw_archive(REFERENCE_INDEX, u32::from(index_id)).await?
                else {
                    return Ok(None);
                };
                let compression = blob
                    .first()
                    .and_then(|&tag| Compression::from_byte(tag))
                    .map_or(0, Compression::as_byte);
                let crc = crc32fast::hash(&blob);
                let decoded = decode_container(&blob, None)?;
                let metadata = IndexMetadata::parse(index_id, compression, crc, &decoded)?;
                Ok(Some(Arc::new(metadata)))
            })
            .await
    }

    async fn load_archive(&self, index_id: u8, archive_id: u32) -> Result<Option<Arc<CacheArchive>>> {
        let Some(index) = self.index_metadata(index_id).await? else {
            return Ok(None);
        };
        let Some(entry) = index.archive(archive_id).cloned() else {
            return Ok(None);
        };
        let Some(blob) = self.raw_archive(index_id, archive_id).await? else {
            return Ok(None);
        };

        let actual = crc32fast::hash(&blob);
        if actual != entry.crc {
            return Err(StoreError::ArchiveChecksumMismatch {
                index_id,
                archive_id,
                expected: entry.crc,
                actual,
            });
        }

        let key = self
            .keys
            .as_ref()
            .and_then(|keys| keys.get_key(index_id, archive_id))
            .copied();
        debug!(
            "Loaded archive {}/{}: {} bytes, {} files, encrypted: {}",
            index_id,
            archive_id,
            blob.len(),
            entry.files.len(),
            key.is_some()
        );
        Ok(Some(Arc::new(CacheArchive::new(
            index_id,
            archive_id,
            entry.name_hash,
            entry.crc,
            entry.revision,
            key,
            entry.files,
            blob,
        ))))
    }
}

#[async_trait]
impl<F: FileProvider> CacheProvider for DiskCacheProvider<F> {
    async fn index(&self, index_id: u8) -> Result<Option<Arc<IndexMetadata>>> {
        if index_id == REFERENCE_INDEX {
            // The reference index describes the others; it has no directory
            // of its own.
            return Ok(None);
        }
        self.index_metadata(index_id).await
    }

    async fn archive(&self, index_id: u8, archive_id: u32) -> Result<Option<Arc<CacheArchive>>> {
        self.archives
            .get_or_try_init((index_id, archive_id), || {
                self.load_archive(index_id, archive_id)
            })
            .await
    }

    async fn version(&self, index_id: u8) -> Result<CacheVersion> {
        let revision = self
            .index(index_id)
            .await?
            .map_or(0, |index| index.revision);
        Ok(CacheVersion::new(self.era, revision))
    }
}

/// Look up an archive's pointer entry. Entries that are missing, zero-length
/// or zero-sector mean the archive is absent.
fn read_pointer(pointers: &Bytes, archive_id: u32) -> Option<ArchivePointer> {
    let offset = archive_id as usize * POINTER_ENTRY_SIZE;
    let entry = pointers.get(offset..offset + POINTER_ENTRY_SIZE)?;
    let length = u32::from_be_bytes([0, entry[0], entry[1], entry[2]]);
    let sector = u32::from_be_bytes([0, entry[3], entry[4], entry[5]]);
    if length == 0 || sector == 0 {
        return None;
    }
    Some(ArchivePointer { length, sector })
}

/// Walk an archive's sector chain and reassemble its payload.
///
/// Every sector header names the archive, its part number and its owning
/// index; any disagreement with the requested identity is corruption. When
/// the whole payload fits in the first sector the returned buffer is a
/// zero-copy slice of the data file.
fn read_sector_chain(
    data: &Bytes,
    index_id: u8,
    archive_id: u32,
    pointer: ArchivePointer,
) -> Result<Option<Bytes>> {
    let extended = archive_id > 0xFFFF;
    let header_size = if extended {
        SECTOR_EXTENDED_HEADER_SIZE
    } else {
        SECTOR_HEADER_SIZE
    };
    let payload_size = SECTOR_SIZE - header_size;
    let sector_count = data.len() / SECTOR_SIZE;

    let length = pointer.length as usize;
    if pointer.sector as usize >= sector_count {
        // Pointer past the end of the data file: treat as absent.
        trace!(
            "Archive {}/{} points past the data file (sector {})",
            index_id, archive_id, pointer.sector
        );
        return Ok(None);
    }

    let mut sector = pointer.sector as usize;
    let mut part = 0u32;
    let mut remaining = length;
    let mut out: Vec<u8> = Vec::new();

    loop {
        let offset = sector * SECTOR_SIZE;
        let wanted = header_size + remaining.min(payload_size);
        if offset + wanted > data.len() {
            return Err(StoreError::TruncatedSector {
                index_id,
                archive_id,
                sector: sector as u32,
            });
        }

        let mut header = Cursor::new(&data[offset..offset + header_size]);
        let header_archive = if extended {
            header.read_u32::<BigEndian>()?
        } else {
            u32::from(header.read_u16::<BigEndian>()?)
        };
        let header_part = u32::from(header.read_u16::<BigEndian>()?);
        let next_sector = header.read_u24::<BigEndian>()?;
        let header_index = header.read_u8()?;

        if header_archive != archive_id {
            return Err(StoreError::SectorArchiveMismatch {
                index_id,
                archive_id,
                expected: archive_id,
                actual: header_archive,
            });
        }
        if header_part != part {
            return Err(StoreError::SectorPartMismatch {
                index_id,
                archive_id,
                expected: part,
                actual: header_part,
            });
        }
        if header_index != index_id {
            return Err(StoreError::SectorIndexMismatch {
                index_id,
                archive_id,
                expected: index_id,
                actual: header_index,
            });
        }

        let take = remaining.min(payload_size);
        if part == 0 && length <= payload_size {
            // Whole payload in the first sector: zero-copy.
            return Ok(Some(data.slice(offset + header_size..offset + header_size + take)));
        }
        out.extend_from_slice(&data[offset + header_size..offset + header_size + take]);
        remaining -= take;
        if remaining == 0 {
            return Ok(Some(Bytes::from(out)));
        }

        if next_sector == 0 || next_sector as usize >= sector_count {
            return Err(StoreError::SectorOutOfRange {
                index_id,
                archive_id,
                sector: next_sector,
            });
        }
        sector = next_sector as usize;
        part += 1;
    }
}
