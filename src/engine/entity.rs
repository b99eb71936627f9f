//! # Entity Management
//!
//! This module defines entity identifier allocation and the location
//! records that map an identifier to its row in archetype storage.
//!
//! ## Purpose
//! Entities are lightweight, opaque identifiers that reference rows in
//! bucket storage. This module is responsible for:
//!
//! - Issuing and recycling 32-bit entity identifiers
//! - Locating a registration of an identifier inside a bucket
//! - Disambiguating multiple registrations of one identifier through
//!   `(component, role)` keys
//!
//! ## Allocation model
//! The allocator keeps a counter for fresh identifiers and a freelist of
//! recycled ones. Before a fresh identifier is issued, freelist capacity is
//! reserved for every identifier issued so far — so returning an identifier
//! never allocates and therefore never fails. That makes
//! [`EntityAllocator::release`] safe to call from error-unwind paths and
//! pushes the single fallible point to allocation.
//!
//! ## Invariants
//! - At most one live identifier equals any given value at a time.
//! - Identifiers are recycled only after release.
//! - The reserved all-ones identifier is never issued.

use crate::engine::archetype::Archetype;
use crate::engine::error::{CapacityError, StoreError, StoreResult};
use crate::engine::types::{ComponentId, Entity, Role, RowId};

/// Issues and recycles 32-bit entity identifiers.
///
/// ## Design
/// - Fresh identifiers count up from the starting index.
/// - Released identifiers are pushed onto a freelist and handed out first.
/// - Freelist capacity is reserved during allocation (see module docs), so
///   [`EntityAllocator::release`] is infallible.
#[derive(Default)]
pub struct EntityAllocator {
    next: u32,
    base: u32,
    dead: Vec<Entity>,
}

impl EntityAllocator {
    /// Creates an allocator with no identifiers issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that resumes issuing fresh identifiers from
    /// `next`, as when restoring a world from a snapshot.
    ///
    /// Identifiers below `next` are assumed to be tracked elsewhere; the
    /// freelist reservation covers only identifiers this instance issues.
    pub fn starting_at(next: u32) -> Self {
        Self { next, base: next, dead: Vec::new() }
    }

    /// Number of identifiers issued by this instance and not yet recycled
    /// through the freelist.
    pub fn live(&self) -> u64 {
        (self.next - self.base) as u64 - self.dead.len() as u64
    }

    /// Issues an identifier.
    ///
    /// ## Behavior
    /// - Pops the freelist if an identifier is available there.
    /// - Otherwise reserves freelist capacity for every identifier issued
    ///   so far plus one, then issues the next fresh identifier.
    ///
    /// ## Errors
    /// - `Exhausted` when all issuable identifiers are live.
    /// - `Alloc` when the freelist reservation fails.
    pub fn allocate(&mut self) -> StoreResult<Entity> {
        if let Some(id) = self.dead.pop() {
            return Ok(id);
        }

        if self.next == u32::MAX {
            return Err(StoreError::Exhausted(CapacityError {
                needed: u32::MAX as u64 + 1,
                capacity: u32::MAX as u64,
            }));
        }

        // Reserve room for every issued identifier so release never grows
        // the freelist.
        let wanted = (self.next - self.base) as usize + 1;
        if self.dead.capacity() < wanted {
            self.dead
                .try_reserve(wanted - self.dead.len())
                .map_err(StoreError::Alloc)?;
        }

        let id = Entity(self.next);
        self.next += 1;
        Ok(id)
    }

    /// Returns `id` to the freelist for reuse.
    ///
    /// Infallible: capacity was reserved when `id` was issued.
    pub fn release(&mut self, id: Entity) {
        debug_assert!(id.0 < self.next, "released identifier was never issued");
        self.dead.push(id);
    }
}

/// Locates one registration of an entity inside bucket storage.
///
/// ## Purpose
/// The world keeps a list of `EntityLocation`s per entity id. Each record
/// names the bucket (by archetype), the row within it, and the
/// `(component, role)` pair distinguishing this registration from others of
/// the same id.
///
/// ## Invariants
/// - Must always reflect the true row of the registration; updated in the
///   same operation as any row move.
/// - `row == EntityLocation::UNPLACED` only for a registration created but
///   not yet placed by an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityLocation {
    /// Row within the bucket for `archetype`.
    pub row: RowId,

    /// Archetype of the bucket holding this registration.
    pub archetype: Archetype,

    /// Component tag distinguishing this registration, if any.
    pub component: Option<ComponentId>,

    /// Role distinguishing this registration.
    pub role: Role,
}

impl EntityLocation {
    /// Sentinel row of a registration that has not been placed yet.
    pub const UNPLACED: RowId = RowId::MAX;

    /// Returns `true` once the registration occupies a bucket row.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.row != Self::UNPLACED
    }
}

/// Addresses one registration of an entity.
///
/// A key never matches on the entity id itself — the world's location lists
/// are already keyed by id — only on the `(component, role)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// The registered entity.
    pub entity: Entity,

    /// Component tag distinguishing the registration, if any.
    pub component: Option<ComponentId>,

    /// Role distinguishing the registration.
    pub role: Role,
}

impl EntityKey {
    /// Key for the default single registration of `entity`.
    #[inline]
    pub fn of(entity: Entity) -> Self {
        Self { entity, component: None, role: Role::NONE }
    }

    /// Key for a registration distinguished by `component` and `role`.
    #[inline]
    pub fn tagged(entity: Entity, component: Option<ComponentId>, role: Role) -> Self {
        Self { entity, component, role }
    }

    /// Position of the matching registration within `locations`, if any.
    #[inline]
    pub fn position_in(&self, locations: &[EntityLocation]) -> Option<usize> {
        locations
            .iter()
            .position(|location| location.component == self.component && location.role == self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_counts_up_and_recycles() {
        let mut allocator = EntityAllocator::new();
        let a = allocator.allocate().unwrap();
        let b = allocator.allocate().unwrap();
        assert_eq!((a, b), (Entity(0), Entity(1)));

        allocator.release(a);
        assert_eq!(allocator.allocate().unwrap(), a);
        assert_eq!(allocator.allocate().unwrap(), Entity(2));
    }

    #[test]
    fn exhausted_allocator_reports_out_of_memory() {
        let mut allocator = EntityAllocator::starting_at(u32::MAX);
        assert!(matches!(
            allocator.allocate(),
            Err(StoreError::Exhausted(_))
        ));

        // Returning any identifier makes allocation succeed again and hand
        // back exactly that identifier.
        allocator.release(Entity(7));
        assert_eq!(allocator.allocate().unwrap(), Entity(7));
        assert!(matches!(allocator.allocate(), Err(StoreError::Exhausted(_))));
    }

    #[test]
    fn key_matches_on_component_and_role_only() {
        let locations = [
            EntityLocation {
                row: 0,
                archetype: Archetype::EMPTY,
                component: None,
                role: Role::NONE,
            },
            EntityLocation {
                row: 3,
                archetype: Archetype::EMPTY,
                component: Some(2),
                role: Role(9),
            },
        ];

        let key = EntityKey::tagged(Entity(0), Some(2), Role(9));
        assert_eq!(key.position_in(&locations), Some(1));
        assert_eq!(EntityKey::of(Entity(0)).position_in(&locations), Some(0));
        assert_eq!(
            EntityKey::tagged(Entity(0), Some(2), Role(8)).position_in(&locations),
            None
        );
    }
}
