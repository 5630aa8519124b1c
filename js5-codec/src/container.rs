//! Container decode: compression tag dispatch and the XTEA step.
//!
//! A container is `tag (1) | compressed length (4, BE) | body`. For
//! compressed containers the body starts with a 4-byte big-endian
//! decompressed length. When a key is present, the span from offset 5
//! through the end of the compressed body (including that length prefix) is
//! XTEA-encrypted; only whole 8-byte blocks are transformed.

use std::io::Read;

use flate2::read::GzDecoder;
use js5_crypto::{XteaKey, xtea};
use tracing::trace;

use crate::{Error, Result, bzip2};

/// Block-size multiplier of the cache's headerless bzip2 streams.
pub const BZIP2_BLOCK_LEVEL: u8 = 1;

/// Compression applied to a container body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Bzip2,
    Gzip,
}

impl Compression {
    pub fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Bzip2),
            2 => Some(Self::Gzip),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Bzip2 => 1,
            Self::Gzip => 2,
        }
    }
}

/// Decrypt (if keyed) and decompress a container, returning the payload.
pub fn decode_container(data: &[u8], key: Option<&XteaKey>) -> Result<Vec<u8>> {
    if data.len() < 5 {
        return Err(Error::TruncatedData {
            expected: 5,
            actual: data.len(),
        });
    }
    let tag = data[0];
    let compression = Compression::from_byte(tag).ok_or(Error::UnknownCompression(tag))?;
    let compressed_len = u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize;

    // The ciphertext span covers the compressed body, plus the 4-byte
    // decompressed-length prefix when the container is compressed.
    let span_len = match compression {
        Compression::None => compressed_len,
        _ => compressed_len + 4,
    };
    if data.len() < 5 + span_len {
        return Err(Error::TruncatedData {
            expected: 5 + span_len,
            actual: data.len(),
        });
    }
    let mut span = data[5..5 + span_len].to_vec();
    if let Some(key) = key
        && !key.is_zero()
    {
        xtea::decipher(&mut span, key);
    }

    trace!(
        "Container: {:?}, {} compressed bytes",
        compression, compressed_len
    );

    match compression {
        Compression::None => Ok(span),
        Compression::Bzip2 => {
            let decompressed_len =
                u32::from_be_bytes([span[0], span[1], span[2], span[3]]) as usize;
            bzip2::decompress(&span[4..], decompressed_len, BZIP2_BLOCK_LEVEL)
        }
        Compression::Gzip => {
            let decompressed_len =
                u32::from_be_bytes([span[0], span[1], span[2], span[3]]) as usize;
            // Cap the pre-allocation; the declared length is untrusted.
            let mut out = Vec::with_capacity(decompressed_len.min(1 << 20));
            GzDecoder::new(&span[4..])
                .read_to_end(&mut out)
                .map_err(|e| Error::DecompressionFailed(format!("gzip: {e}")))?;
            if out.len() != decompressed_len {
                return Err(Error::LengthMismatch {
                    expected: decompressed_len,
                    actual: out.len(),
                });
            }
            Ok(out)
        }
    }
}
