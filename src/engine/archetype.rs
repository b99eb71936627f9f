//! Archetype set algebra.
//!
//! An [`Archetype`] is the set of component kinds an entity currently
//! carries, represented as a single machine-word bitset: bit *i* set means
//! component *i* is part of the set. The same bitset doubles as the index
//! arithmetic for bucket storage — the column position of a tag inside a
//! bucket is the popcount of the non-void bits below it.
//!
//! ## Design
//! - All operations are pure, allocation-free, and constant-time in the
//!   component capacity.
//! - Void components (markers with no per-entity data) participate in set
//!   membership but are excluded from column counting and indexing; the
//!   caller supplies the schema's void mask where it matters.
//! - Iteration yields tags in ascending order by count-trailing-zeros,
//!   consuming a copy of the bits.

use crate::engine::types::{ComponentId, COMPONENT_CAP};

/// Bitset describing a set of component kinds.
///
/// ## Invariants
/// - Only bits below [`COMPONENT_CAP`] may be set.
/// - The empty archetype (no bits set) is the shape of an entity carrying
///   no components; it is a valid bucket key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Archetype {
    bits: u64,
}

impl Archetype {
    /// The empty component set.
    pub const EMPTY: Archetype = Archetype { bits: 0 };

    /// Builds an archetype from a raw bit pattern.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Returns the raw bit pattern.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    /// Builds an archetype containing the given tags.
    pub fn of(tags: &[ComponentId]) -> Self {
        let mut archetype = Self::EMPTY;
        for &tag in tags {
            archetype = archetype.with(tag);
        }
        archetype
    }

    /// Returns a copy with the bit for `tag` set.
    #[inline]
    pub fn with(self, tag: ComponentId) -> Self {
        debug_assert!((tag as usize) < COMPONENT_CAP);
        Self { bits: self.bits | (1u64 << tag) }
    }

    /// Returns a copy with the bit for `tag` cleared.
    #[inline]
    pub fn without(self, tag: ComponentId) -> Self {
        debug_assert!((tag as usize) < COMPONENT_CAP);
        Self { bits: self.bits & !(1u64 << tag) }
    }

    /// Set union.
    #[inline]
    pub fn merge(self, other: Archetype) -> Self {
        Self { bits: self.bits | other.bits }
    }

    /// Set intersection.
    #[inline]
    pub fn intersection(self, other: Archetype) -> Self {
        Self { bits: self.bits & other.bits }
    }

    /// Set difference (`self` minus `other`).
    #[inline]
    pub fn difference(self, other: Archetype) -> Self {
        Self { bits: self.bits & !other.bits }
    }

    /// Returns `true` if `tag` is present in this set.
    #[inline]
    pub fn has(self, tag: ComponentId) -> bool {
        debug_assert!((tag as usize) < COMPONENT_CAP);
        (self.bits >> tag) & 1 == 1
    }

    /// Returns `true` if every component in `other` is present in `self`
    /// (i.e. `self` is a supertype of `other`).
    #[inline]
    pub fn contains(self, other: Archetype) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of data-carrying components in this set.
    ///
    /// Void components (those in `void`) are excluded: they own no column,
    /// so this is exactly the column count of the bucket for this shape.
    #[inline]
    pub fn count(self, void: Archetype) -> u32 {
        (self.bits & !void.bits).count_ones()
    }

    /// Column position of `tag` within the bucket for this shape.
    ///
    /// This is the popcount of the non-void bits strictly below `tag`.
    /// Buckets keep their columns in ascending tag order, so the result
    /// addresses the column directly.
    ///
    /// ## Preconditions
    /// `tag` must be present in this set and must not be void. Violations
    /// are debug assertions; use [`Archetype::index_of`] when uncertain.
    #[inline]
    pub fn index(self, tag: ComponentId, void: Archetype) -> usize {
        debug_assert!(self.has(tag), "tag {tag} is not in this archetype");
        debug_assert!(!void.has(tag), "tag {tag} is void and owns no column");
        let below = (1u64 << tag) - 1;
        (self.bits & !void.bits & below).count_ones() as usize
    }

    /// Column position of `tag`, or `None` if `tag` is absent or void.
    #[inline]
    pub fn index_of(self, tag: ComponentId, void: Archetype) -> Option<usize> {
        if !self.has(tag) || void.has(tag) {
            return None;
        }
        Some(self.index(tag, void))
    }

    /// Iterates over the tags in this set in ascending order.
    #[inline]
    pub fn iter(self) -> TagIter {
        TagIter { bits: self.bits }
    }
}

/// Iterator over the tags of an [`Archetype`], low bit to high.
///
/// Consumes a copy of the bits by repeatedly clearing the lowest set bit.
#[derive(Clone, Copy, Debug)]
pub struct TagIter {
    bits: u64,
}

impl Iterator for TagIter {
    type Item = ComponentId;

    #[inline]
    fn next(&mut self) -> Option<ComponentId> {
        if self.bits == 0 {
            return None;
        }
        let tag = self.bits.trailing_zeros() as ComponentId;
        self.bits &= self.bits - 1;
        Some(tag)
    }
}
