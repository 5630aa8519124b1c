//! Error types for container decoding.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown compression tag byte
    #[error("unknown compression tag: {0:#04x}")]
    UnknownCompression(u8),

    /// Truncated data
    #[error("truncated container: expected {expected} bytes, got {actual}")]
    TruncatedData { expected: usize, actual: usize },

    /// Decompression failed
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Decompressed output has the wrong length
    #[error("decompressed length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Block-size multiplier outside 1..=9
    #[error("invalid bzip2 block-size multiplier: {0}")]
    InvalidBlockLevel(u8),

    /// 48-bit marker was neither a block start nor the stream end
    #[error("invalid bzip2 block magic: {0:#014x}")]
    InvalidBlockMagic(u64),

    /// Randomized blocks are deprecated and unsupported
    #[error("randomized bzip2 blocks are not supported")]
    RandomizedBlock,

    /// Symbol-presence bitmap selected no symbols
    #[error("bzip2 block has an empty symbol alphabet")]
    EmptyAlphabet,

    /// Huffman tree count outside 2..=6
    #[error("invalid bzip2 tree count: {0}")]
    InvalidTreeCount(u32),

    /// Selector references a tree that does not exist
    #[error("bzip2 selector {0} out of range")]
    InvalidSelector(usize),

    /// Delta-coded symbol length left the 1..=20 range
    #[error("invalid bzip2 code length: {0}")]
    InvalidCodeLength(i32),

    /// Code lengths do not form a decodable canonical tree
    #[error("invalid bzip2 Huffman table")]
    InvalidHuffmanTable,

    /// Bit reader ran past the end of the buffer
    #[error("bit stream exhausted at bit {0}")]
    BitStreamExhausted(usize),

    /// Block decoded past its level-bounded size
    #[error("bzip2 block output exceeds its limit")]
    BlockOverrun,

    /// BWT origin pointer outside the block
    #[error("BWT origin pointer {pointer} out of range for block of {length} bytes")]
    InvalidBwtPointer { pointer: usize, length: usize },

    /// Block CRC mismatch
    #[error("bzip2 block checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    BlockChecksumMismatch { expected: u32, actual: u32 },

    /// Whole-stream CRC mismatch
    #[error("bzip2 stream checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    StreamChecksumMismatch { expected: u32, actual: u32 },

    /// Multi-file trailer declared a negative chunk size
    #[error("negative chunk size in file trailer: {0}")]
    NegativeChunkSize(i32),

    /// Multi-file trailer declared zero chunks
    #[error("invalid chunk count in file trailer: {0}")]
    InvalidChunkCount(u8),
}
