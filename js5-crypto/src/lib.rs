//! XTEA decryption and key management for JS5 cache archives.
//!
//! Archives in a handful of indexes (map regions, most notably) are
//! encrypted with per-archive XTEA keys distributed out of band. This crate
//! provides the block cipher and a [`KeyService`] that resolves an archive's
//! key; an absent or all-zero key means the archive is stored in the clear.

mod error;
mod keys;
pub mod xtea;

pub use error::CryptoError;
pub use keys::{KeyService, XteaKey};

pub type Result<T> = std::result::Result<T, CryptoError>;
