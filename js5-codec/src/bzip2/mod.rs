//! Minimal bzip2 block decoder.
//!
//! Cache containers store bzip2 blocks without the 4-byte `BZh` stream
//! header: the caller supplies the block-size multiplier and the expected
//! output length. This is a decoder for exactly that shape of stream, not a
//! general-purpose codec; randomized blocks (deprecated since bzip2 0.9.5)
//! are rejected.

mod bits;
mod crc;
mod decode;
mod huffman;

pub use bits::BitReader;
pub use decode::{MoveToFront, decompress};
