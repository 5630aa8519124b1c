//! Cache revision feature gating.
//!
//! Field layouts in record decoders differ before and after certain cache
//! revisions. A [`CacheVersion`] pairs a client era with a revision number;
//! revisions order within an era, and versions from different eras never
//! compare (every ordering query across eras answers `false`).

use std::cmp::Ordering;

/// Client generation a cache was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era {
    Rs2,
    Osrs,
    Rs3,
}

/// An (era, revision) pair used to gate decoder behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheVersion {
    pub era: Era,
    pub revision: i32,
}

impl CacheVersion {
    pub const fn new(era: Era, revision: i32) -> Self {
        Self { era, revision }
    }

    /// `true` when `self` is the same era as `other` and at least as new.
    pub fn is_at_least(&self, other: &Self) -> bool {
        self.era == other.era && self.revision >= other.revision
    }

    /// `true` when `self` is the same era as `other` and strictly newer.
    pub fn is_after(&self, other: &Self) -> bool {
        self.era == other.era && self.revision > other.revision
    }
}

impl PartialOrd for CacheVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.era == other.era {
            Some(self.revision.cmp(&other.revision))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_within_era() {
        let old = CacheVersion::new(Era::Osrs, 180);
        let new = CacheVersion::new(Era::Osrs, 220);
        assert!(new.is_after(&old));
        assert!(new.is_at_least(&old));
        assert!(new.is_at_least(&new));
        assert!(!old.is_after(&new));
        assert_eq!(old.partial_cmp(&new), Some(Ordering::Less));
    }

    #[test]
    fn cross_era_is_incomparable() {
        let osrs = CacheVersion::new(Era::Osrs, 220);
        let rs3 = CacheVersion::new(Era::Rs3, 900);
        assert!(!osrs.is_after(&rs3));
        assert!(!rs3.is_after(&osrs));
        assert!(!osrs.is_at_least(&rs3));
        assert_eq!(osrs.partial_cmp(&rs3), None);
    }
}
