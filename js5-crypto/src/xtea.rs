//! XTEA block cipher over big-endian word pairs.
//!
//! The cache encrypts the ciphertext span of a container as consecutive
//! 8-byte blocks, each a pair of big-endian 32-bit words. A trailing partial
//! block is stored in the clear and must be left untouched.

use crate::keys::XteaKey;

const GOLDEN_RATIO: u32 = 0x9E37_79B9;
const ROUNDS: u32 = 32;

/// Decrypt every whole 8-byte block of `data` in place.
pub fn decipher(data: &mut [u8], key: &XteaKey) {
    let k = key.words();
    for block in data.chunks_exact_mut(8) {
        let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let mut sum = GOLDEN_RATIO.wrapping_mul(ROUNDS);
        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ (sum.wrapping_add(k[((sum >> 11) & 3) as usize])),
            );
            sum = sum.wrapping_sub(GOLDEN_RATIO);
            v0 = v0.wrapping_sub(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ (sum.wrapping_add(k[(sum & 3) as usize])),
            );
        }
        block[..4].copy_from_slice(&v0.to_be_bytes());
        block[4..].copy_from_slice(&v1.to_be_bytes());
    }
}

/// Encrypt every whole 8-byte block of `data` in place.
///
/// The cache itself is read-only; this exists so tests can construct
/// encrypted fixtures.
pub fn encipher(data: &mut [u8], key: &XteaKey) {
    let k = key.words();
    for block in data.chunks_exact_mut(8) {
        let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let mut sum = 0u32;
        for _ in 0..ROUNDS {
            v0 = v0.wrapping_add(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ (sum.wrapping_add(k[(sum & 3) as usize])),
            );
            sum = sum.wrapping_add(GOLDEN_RATIO);
            v1 = v1.wrapping_add(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ (sum.wrapping_add(k[((sum >> 11) & 3) as usize])),
            );
        }
        block[..4].copy_from_slice(&v0.to_be_bytes());
        block[4..].copy_from_slice(&v1.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> XteaKey {
        XteaKey::new([0x0123_4567, 0x89AB_CDEF, 0xFEDC_BA98, 0x7654_3210])
    }

    #[test]
    fn round_trip() {
        let plaintext = *b"sixteen byte msg";
        let mut buf = plaintext;
        encipher(&mut buf, &key());
        assert_ne!(buf, plaintext);
        decipher(&mut buf, &key());
        assert_eq!(buf, plaintext);
    }

    #[test]
    fn trailing_partial_block_untouched() {
        let mut buf = *b"eight by tail";
        encipher(&mut buf, &key());
        assert_eq!(&buf[8..], b" tail");
        decipher(&mut buf, &key());
        assert_eq!(&buf, b"eight by tail");
    }

    #[test]
    fn sub_block_buffer_is_noop() {
        let mut buf = *b"seven b";
        let copy = buf;
        decipher(&mut buf, &key());
        assert_eq!(buf, copy);
    }

    #[test]
    fn distinct_keys_distinct_ciphertext() {
        let mut a = *b"same plaintext!!";
        let mut b = *b"same plaintext!!";
        encipher(&mut a, &key());
        encipher(&mut b, &XteaKey::new([1, 2, 3, 4]));
        assert_ne!(a, b);
    }
}
