//! Opcode-driven record decoding.
//!
//! Every typed record in the cache (items, NPCs, objects, enums, params,
//! and the rest) shares one wire shape: a stream of 1-byte opcodes, each
//! selecting a fixed list of field reads, terminated by a zero byte. This
//! crate makes that protocol data-driven: a [`Schema`] maps opcodes to
//! coder instructions, one generic interpreter ([`decode_record`]) executes
//! them, and [`ConfigLoader`] provides the bulk and by-name load operations
//! over any [`js5_store::CacheProvider`]. Concrete record types are plain
//! schema instances; see [`defs`].

pub mod defs;
mod decode;
mod error;
mod instr;
mod loader;
mod record;

pub use decode::decode_record;
pub use error::ConfigError;
pub use instr::{FieldCodec, Instr, Schema, Slot, Value};
pub use loader::ConfigLoader;
pub use record::Record;

pub type Result<T> = std::result::Result<T, ConfigError>;
