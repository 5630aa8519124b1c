//! Binary buffer parsing for the JS5 cache formats.
//!
//! The game client reads its cache through a positional cursor with a set of
//! non-standard variable-length integer and string encodings. This crate
//! provides that cursor ([`Reader`]), the client's cp1252-like character
//! table, the 31-multiplier name hash used to address archives by name, and
//! the [`CacheVersion`] feature gate used by record decoders.

mod charset;
mod error;
pub mod hash;
mod reader;
mod version;

pub use error::Error;
pub use reader::{ParamValue, Reader};
pub use version::{CacheVersion, Era};

pub type Result<T> = std::result::Result<T, Error>;
