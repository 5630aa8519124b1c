//! Storage access for the JS5 cache.
//!
//! Two on-disk encodings exist for the same logical model: the client's
//! sector-chained binary format (`main_file_cache.dat2` plus one pointer
//! file per index) and a line-oriented flat text format used for
//! distribution and testing. [`DiskCacheProvider`] and [`FlatCacheProvider`]
//! parse either into the shared archive model and satisfy the same
//! [`CacheProvider`] contract, which is all downstream loaders consume.

pub mod archive;
mod disk;
mod error;
mod flat;
mod metadata;
pub mod provider;
mod single_flight;
mod types;

pub use archive::{ArchiveFiles, CacheArchive};
pub use disk::DiskCacheProvider;
pub use error::{Result, StoreError};
pub use flat::FlatCacheProvider;
pub use metadata::{ArchiveMetadata, FileMetadata, IndexMetadata};
pub use provider::{CacheProvider, DirectoryProvider, FileProvider};
pub use types::{
    ArchivePointer, MAIN_DATA_FILE, REFERENCE_INDEX, flat_file_name, index_file_name,
};
