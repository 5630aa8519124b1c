//! Load operations over a [`CacheProvider`].

use std::collections::BTreeMap;

use futures::future::try_join_all;
use js5_store::CacheProvider;
use tracing::debug;

use crate::decode::decode_record;
use crate::instr::Schema;
use crate::record::Record;
use crate::{ConfigError, Result};

/// Loads records of one schema from one index.
pub struct ConfigLoader {
    index_id: u8,
    schema: Schema,
}

impl ConfigLoader {
    pub fn new(index_id: u8, schema: Schema) -> Self {
        Self { index_id, schema }
    }

    pub fn index_id(&self) -> u8 {
        self.index_id
    }

    /// Decode every file of an archive, keyed by file id. `None` when the
    /// archive is absent. A single bad record fails the whole batch, with
    /// the record's id attached to the error.
    pub async fn load_group(
        &self,
        provider: &dyn CacheProvider,
        archive_id: u32,
    ) -> Result<Option<BTreeMap<u32, Record>>> {
        let Some(archive) = provider.archive(self.index_id, archive_id).await? else {
            return Ok(None);
        };
        let files = archive.files().map_err(ConfigError::Store)?;

        let mut records = BTreeMap::new();
        for (file_id, data) in files.iter() {
            let record = decode_record(&self.schema, data).map_err(|e| ConfigError::Record {
                id: file_id,
                source: Box::new(e),
            })?;
            records.insert(file_id, record);
        }
        debug!(
            "Loaded {} records from archive {}/{}",
            records.len(),
            self.index_id,
            archive_id
        );
        Ok(Some(records))
    }

    /// [`load_group`](Self::load_group) addressed by archive name.
    pub async fn load_group_by_name(
        &self,
        provider: &dyn CacheProvider,
        name: &str,
    ) -> Result<Option<BTreeMap<u32, Record>>> {
        let Some(archive) = provider.archive_by_name(self.index_id, name).await? else {
            return Ok(None);
        };
        self.load_group(provider, archive.archive_id()).await
    }

    /// Decode a single record. `None` when the archive or file is absent.
    pub async fn load_record(
        &self,
        provider: &dyn CacheProvider,
        archive_id: u32,
        file_id: u32,
    ) -> Result<Option<Record>> {
        let Some(archive) = provider.archive(self.index_id, archive_id).await? else {
            return Ok(None);
        };
        let files = archive.files().map_err(ConfigError::Store)?;
        let Some(data) = files.get(file_id) else {
            return Ok(None);
        };
        decode_record(&self.schema, data)
            .map_err(|e| ConfigError::Record {
                id: file_id,
                source: Box::new(e),
            })
            .map(Some)
    }

    /// Load several archives' record groups concurrently; absent archives
    /// are skipped.
    pub async fn load_groups(
        &self,
        provider: &dyn CacheProvider,
        archive_ids: &[u32],
    ) -> Result<BTreeMap<u32, BTreeMap<u32, Record>>> {
        let groups = try_join_all(archive_ids.iter().map(|&archive_id| async move {
            Ok::<_, ConfigError>((archive_id, self.load_group(provider, archive_id).await?))
        }))
        .await?;
        Ok(groups
            .into_iter()
            .filter_map(|(id, group)| group.map(|g| (id, g)))
            .collect())
    }
}
