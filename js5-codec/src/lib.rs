//! Container decoding for the JS5 cache.
//!
//! An archive's on-disk payload is a "container": a compression tag, a
//! big-endian length, an optionally XTEA-encrypted span, and the compressed
//! body. This crate decodes containers ([`decode_container`]), carries the
//! self-contained bzip2 block decoder the format needs (cache containers
//! store bzip2 blocks without the stream header), and splits a decompressed
//! multi-file payload into its per-file byte ranges ([`split_files`]).

pub mod bzip2;
mod container;
mod error;
mod files;

pub use container::{BZIP2_BLOCK_LEVEL, Compression, decode_container};
pub use error::Error;
pub use files::split_files;

pub type Result<T> = std::result::Result<T, Error>;
