//! The capability traits at the storage boundary.
//!
//! [`FileProvider`] is the raw-bytes side: an async fetch by logical file
//! name with no assumption about transport. [`CacheProvider`] is what every
//! downstream consumer sees: index directories, archives by id or name, and
//! the cache version gate. Both on-disk formats satisfy it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use js5_parser::{CacheVersion, hash::name_hash};
use tracing::trace;

use crate::archive::CacheArchive;
use crate::metadata::IndexMetadata;
use crate::{Result, StoreError};

/// Async byte fetch by logical file name. Absence is `None`, not an error.
#[async_trait]
pub trait FileProvider: Send + Sync {
    async fn get_file(&self, name: &str) -> Result<Option<Bytes>>;
}

/// [`FileProvider`] over a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileProvider for DirectoryProvider {
    async fn get_file(&self, name: &str) -> Result<Option<Bytes>> {
        let path = self.root.join(name);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                trace!("Read {} bytes from {:?}", data.len(), path);
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

/// Read access to a parsed cache. Missing indexes and archives are `None`.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// The directory of an index, parsed once and shared.
    async fn index(&self, index_id: u8) -> Result<Option<Arc<IndexMetadata>>>;

    /// An archive by id.
    async fn archive(&self, index_id: u8, archive_id: u32) -> Result<Option<Arc<CacheArchive>>>;

    /// An archive by name, resolved through the index's name-hash
    /// directory. A numeric name is taken as the hash value verbatim.
    async fn archive_by_name(
        &self,
        index_id: u8,
        name: &str,
    ) -> Result<Option<Arc<CacheArchive>>> {
        let Some(index) = self.index(index_id).await? else {
            return Ok(None);
        };
        let Some(archive_id) = index.archive_by_name_hash(name_hash(name)) else {
            return Ok(None);
        };
        self.archive(index_id, archive_id).await
    }

    /// Every archive id an index holds, ascending.
    async fn archive_ids(&self, index_id: u8) -> Result<Option<Vec<u32>>> {
        Ok(self.index(index_id).await?.map(|index| index.archive_ids()))
    }

    /// The version gate for an index; revision 0 when the index is absent.
    async fn version(&self, index_id: u8) -> Result<CacheVersion>;
}
