//! The flat text encoding of the cache.
//!
//! One `N.flatcache` file per index: LF-delimited `key=value` records.
//! `id=N` opens an archive record; `named`, `revision`, `compression` and
//! `crc` lines before the first record set index-level metadata; inside a
//! record, `contents` carries the base64 container blob, `file` registers a
//! file, and `namehash`/`revision`/`crc` set archive metadata. Unknown keys
//! are ignored. The logical model is identical to the disk format, with no
//! sector chaining and no compressed index directory.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use js5_crypto::KeyService;
use js5_parser::{CacheVersion, Era};
use tracing::debug;

use crate::archive::CacheArchive;
use crate::metadata::{ArchiveMetadata, FileMetadata, IndexMetadata};
use crate::provider::{CacheProvider, FileProvider};
use crate::single_flight::SingleFlight;
use crate::types::flat_file_name;
use crate::{Result, StoreError};

/// [`CacheProvider`] over the flat text format.
pub struct FlatCacheProvider<F: FileProvider> {
    files: F,
    era: Era,
    keys: Option<KeyService>,
    indexes: SingleFlight<u8, Option<Arc<FlatIndex>>>,
}

struct FlatIndex {
    metadata: Arc<IndexMetadata>,
    archives: BTreeMap<u32, Arc<CacheArchive>>,
}

impl<F: FileProvider> FlatCacheProvider<F> {
    pub fn new(files: F, era: Era) -> Self {
        Self {
            files,
            era,
            keys: None,
            indexes: SingleFlight::new(),
        }
    }

    /// Attach a key lookup for encrypted archives.
    pub fn with_keys(mut self, keys: KeyService) -> Self {
        self.keys = Some(keys);
        self
    }

    async fn load_index(&self, index_id: u8) -> Result<Option<Arc<FlatIndex>>> {
        self.indexes
            .get_or_try_init(index_id, || async move {
                let name = flat_file_name(index_id);
                let Some(raw) = self.files.get_file(&name).await? else {
                    return Ok(None);
                };
                let text =
                    std::str::from_utf8(&raw).map_err(|e| StoreError::InvalidFlatLine {
                        index_id,
                        line: 0,
                        reason: format!("not UTF-8: {e}"),
                    })?;
                let index = parse_flat_index(index_id, text, self.keys.as_ref())?;
                Ok(Some(Arc::new(index)))
            })
            .await
    }
}

#[async_trait]
impl<F: FileProvider> CacheProvider for FlatCacheProvider<F> {
    async fn index(&self, index_id: u8) -> Result<Option<Arc<IndexMetadata>>> {
        Ok(self
            .load_index(index_id)
            .await?
            .map(|index| index.metadata.clone()))
    }

    async fn archive(&self, index_id: u8, archive_id: u32) -> Result<Option<Arc<CacheArchive>>> {
        Ok(self
            .load_index(index_id)
            .await?
            .and_then(|index| index.archives.get(&archive_id).cloned()))
    }

    async fn version(&self, index_id: u8) -> Result<CacheVersion> {
        let revision = self
            .index(index_id)
            .await?
            .map_or(0, |index| index.revision);
        Ok(CacheVersion::new(self.era, revision))
    }
}

/// Archive record being accumulated during a parse.
struct PendingArchive {
    id: u32,
    name_hash: Option<i32>,
    crc: u32,
    revision: i32,
    contents: Bytes,
    files: Vec<FileMetadata>,
}

impl PendingArchive {
    fn new(id: u32) -> Self {
        Self {
            id,
            name_hash: None,
            crc: 0,
            revision: 0,
            contents: Bytes::new(),
            files: Vec::new(),
        }
    }
}

fn parse_flat_index(
    index_id: u8,
    text: &str,
    keys: Option<&KeyService>,
) -> Result<FlatIndex> {
    let mut named = false;
    let mut revision = 0i32;
    let mut compression = 0u8;
    let mut crc = 0u32;
    let mut pending: Vec<PendingArchive> = Vec::new();

    let invalid = |line: usize, reason: String| StoreError::InvalidFlatLine {
        index_id,
        line,
        reason,
    };

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        if key == "id" {
            let id = value
                .parse::<u32>()
                .map_err(|e| invalid(line_no, format!("bad archive id: {e}")))?;
            pending.push(PendingArchive::new(id));
            continue;
        }

        match pending.last_mut() {
            None => match key {
                "named" => named = value == "true" || value == "1",
                "revision" => {
                    revision = value
                        .parse::<i32>()
                        .map_err(|e| invalid(line_no, format!("bad revision: {e}")))?;
                }
                "compression" => {
                    compression = value
                        .parse::<u8>()
                        .map_err(|e| invalid(line_no, format!("bad compression: {e}")))?;
                }
                "crc" => {
                    crc = parse_u32(value)
                        .ok_or_else(|| invalid(line_no, "bad crc".to_string()))?;
                }
                _ => {}
            },
            Some(archive) => match key {
                "contents" => {
                    let blob = BASE64
                        .decode(value)
                        .map_err(|e| invalid(line_no, format!("bad base64: {e}")))?;
                    archive.contents = Bytes::from(blob);
                }
                "file" => {
                    let (id, name_hash) = value
                        .split_once('=')
                        .ok_or_else(|| invalid(line_no, "bad file entry".to_string()))?;
                    let id = id
                        .parse::<u32>()
                        .map_err(|e| invalid(line_no, format!("bad file id: {e}")))?;
                    let name_hash = name_hash
                        .parse::<i32>()
                        .map_err(|e| invalid(line_no, format!("bad file name hash: {e}")))?;
                    archive.files.push(FileMetadata {
                        id,
                        name_hash: Some(name_hash).filter(|&h| h != 0),
                    });
                }
                "namehash" => {
                    archive.name_hash = Some(
                        value
                            .parse::<i32>()
                            .map_err(|e| invalid(line_no, format!("bad name hash: {e}")))?,
                    );
                }
                "revision" => {
                    archive.revision = value
                        .parse::<i32>()
                        .map_err(|e| invalid(line_no, format!("bad revision: {e}")))?;
                }
                "crc" => {
                    archive.crc = parse_u32(value)
                        .ok_or_else(|| invalid(line_no, "bad crc".to_string()))?;
                }
                _ => {}
            },
        }
    }

    let mut entries = Vec::with_capacity(pending.len());
    let mut archives = BTreeMap::new();
    for mut archive in pending {
        if archive.files.is_empty() {
            // No file lines: a plain single-file archive.
            archive.files.push(FileMetadata {
                id: 0,
                name_hash: None,
            });
        }
        entries.push(ArchiveMetadata {
            id: archive.id,
            name_hash: archive.name_hash,
            crc: archive.crc,
            revision: archive.revision,
            files: archive.files.clone(),
        });
        let key = keys.and_then(|keys| keys.get_key(index_id, archive.id)).copied();
        archives.insert(
            archive.id,
            Arc::new(CacheArchive::new(
                index_id,
                archive.id,
                archive.name_hash,
                archive.crc,
                archive.revision,
                key,
                archive.files,
                archive.contents,
            )),
        );
    }

    debug!(
        "Flat index {}: revision {}, {} archives",
        index_id,
        revision,
        archives.len()
    );
    let metadata = Arc::new(IndexMetadata::from_parts(
        index_id,
        revision,
        compression,
        crc,
        named,
        entries,
    ));
    Ok(FlatIndex { metadata, archives })
}

/// Accept decimal or negative (two's-complement) CRC renderings.
fn parse_u32(value: &str) -> Option<u32> {
    value
        .parse::<u32>()
        .ok()
        .or_else(|| value.parse::<i32>().ok().map(|v| v as u32))
}
