//! Error types for cache storage access.
//!
//! Absence (a missing file, index, or archive) is `Ok(None)` throughout, not
//! an error; these variants are reserved for IO failures and corruption.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container error: {0}")]
    Codec(#[from] js5_codec::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] js5_crypto::CryptoError),

    #[error("buffer error: {0}")]
    Parser(#[from] js5_parser::Error),

    #[error(
        "sector for archive {index_id}/{archive_id} belongs to archive {actual}, expected {expected}"
    )]
    SectorArchiveMismatch {
        index_id: u8,
        archive_id: u32,
        expected: u32,
        actual: u32,
    },

    #[error("sector for archive {index_id}/{archive_id} is part {actual}, expected part {expected}")]
    SectorPartMismatch {
        index_id: u8,
        archive_id: u32,
        expected: u32,
        actual: u32,
    },

    #[error("sector for archive {index_id}/{archive_id} belongs to index {actual}, expected {expected}")]
    SectorIndexMismatch {
        index_id: u8,
        archive_id: u32,
        expected: u8,
        actual: u8,
    },

    #[error("sector chain for archive {index_id}/{archive_id} points to invalid sector {sector}")]
    SectorOutOfRange {
        index_id: u8,
        archive_id: u32,
        sector: u32,
    },

    #[error("data file ends inside sector {sector} of archive {index_id}/{archive_id}")]
    TruncatedSector {
        index_id: u8,
        archive_id: u32,
        sector: u32,
    },

    #[error(
        "archive {index_id}/{archive_id} checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
    )]
    ArchiveChecksumMismatch {
        index_id: u8,
        archive_id: u32,
        expected: u32,
        actual: u32,
    },

    #[error("unsupported index metadata protocol: {0}")]
    UnsupportedProtocol(u8),

    #[error("negative count in index metadata: {0}")]
    InvalidCount(i32),

    #[error("invalid flat cache line {line} of index {index_id}: {reason}")]
    InvalidFlatLine {
        index_id: u8,
        line: usize,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
