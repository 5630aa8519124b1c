//! Archive name hashing.
//!
//! Archives in a named index are addressed by a 32-bit rolling hash of their
//! name: `h = 31 * h + byte` over the UTF-8 bytes, wrapping. An input that is
//! already a number is used verbatim so callers can pass ids through the same
//! lookup path.

/// Hash an archive name to its 32-bit identity.
pub fn name_hash(name: &str) -> i32 {
    if let Ok(id) = name.parse::<i32>() {
        return id;
    }
    name.bytes()
        .fold(0i32, |h, b| h.wrapping_mul(31).wrapping_add(i32::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hashes_to_zero() {
        assert_eq!(name_hash(""), 0);
    }

    #[test]
    fn numeric_passthrough() {
        assert_eq!(name_hash("0"), 0);
        assert_eq!(name_hash("1234"), 1234);
        assert_eq!(name_hash("-17"), -17);
    }

    #[test]
    fn deterministic() {
        assert_eq!(name_hash("m50_50"), name_hash("m50_50"));
        assert_ne!(name_hash("m50_50"), name_hash("m50_51"));
    }

    #[test]
    fn known_values() {
        // h("a") = 97, h("ab") = 31*97 + 98 = 3105.
        assert_eq!(name_hash("a"), 97);
        assert_eq!(name_hash("ab"), 3105);
        // Wrapping behaviour on long names, not a panic.
        let long = "x".repeat(64);
        let _ = name_hash(&long);
    }
}
