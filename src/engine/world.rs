//! # World — entity, location, and bucket bookkeeping
//!
//! The [`World`] is the database of the store. It owns:
//!
//! * the [`Schema`] declaring the component kinds,
//! * the [`EntityAllocator`] issuing identifiers,
//! * a map from entity id to its list of [`EntityLocation`] registrations,
//! * the bucket table: a vector of [`Bucket`]s plus an archetype-keyed
//!   index into it.
//!
//! An entity's location is recorded twice — in its registration list and
//! implicitly by its row in a bucket's entity column — and every operation
//! here keeps the two in lockstep. Removal is swap-remove, so each removal
//! may displace the last row of a bucket; the displaced entity's
//! registration is identified by the pair (bucket archetype, vacated row
//! index), which is unique, and patched in the same operation.
//!
//! ## Migration
//!
//! When an update or removal changes an entity's shape, its row moves to
//! the bucket of the new archetype:
//!
//! 1. locate or create the target bucket,
//! 2. reserve a fresh row there (the only fallible step; on failure the
//!    reservation is rolled back and a bucket created by this call is
//!    removed again),
//! 3. move the values of shared tags across, dropping source-only values,
//! 4. patch the registration displaced out of the source bucket,
//! 5. write the provided values into the new row.
//!
//! A failed operation leaves the world exactly as it was before the call.

use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::engine::archetype::Archetype;
use crate::engine::bucket::Bucket;
use crate::engine::entity::{EntityAllocator, EntityKey, EntityLocation};
use crate::engine::error::{StoreError, StoreResult};
use crate::engine::query::{BucketRef, Query, QueryMut};
use crate::engine::schema::{Bundle, Schema};
use crate::engine::types::{ComponentId, Entity, Role, RowId};

/// Archetype-bucketed entity-component store.
///
/// A `World` is a plain value: independent instances may coexist, and
/// nothing global is involved. All operations are synchronous and
/// single-threaded; concurrent use requires external mutual exclusion.
pub struct World {
    schema: Rc<Schema>,
    allocator: EntityAllocator,
    entities: HashMap<Entity, Vec<EntityLocation>>,
    buckets: Vec<Bucket>,
    bucket_index: HashMap<Archetype, usize>,
}

impl World {
    /// Creates an empty world over `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Rc::new(schema),
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            buckets: Vec::new(),
            bucket_index: HashMap::new(),
        }
    }

    /// The component schema this world was built over.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A shared handle to the schema, for contexts that outlive a borrow
    /// of the world (the system runner).
    pub(crate) fn schema_handle(&self) -> Rc<Schema> {
        Rc::clone(&self.schema)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of buckets materialized so far, empty ones included.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if `id` is live.
    pub fn contains(&self, id: Entity) -> bool {
        self.entities.contains_key(&id)
    }

    /// The registration list of `id`, if live.
    pub fn locations(&self, id: Entity) -> Option<&[EntityLocation]> {
        self.entities.get(&id).map(Vec::as_slice)
    }

    /// The archetype of the registration addressed by `key`, if any.
    pub fn archetype_of(&self, key: &EntityKey) -> Option<Archetype> {
        let locations = self.entities.get(&key.entity)?;
        Some(locations[key.position_in(locations)?].archetype)
    }

    // ───────────────────────────────────────────────────────────────────
    // Lifecycle
    // ───────────────────────────────────────────────────────────────────

    /// Allocates a fresh entity with no registrations.
    ///
    /// Register it with [`World::extend`], or use [`World::insert`] to
    /// allocate and place in one step.
    pub fn spawn(&mut self) -> StoreResult<Entity> {
        let id = self.allocator.allocate()?;
        self.entities.insert(id, Vec::new());
        Ok(id)
    }

    /// Allocates an entity and places it under the default key.
    ///
    /// ## Errors
    /// Out-of-memory; the allocated identifier is returned to the
    /// allocator and the world is unchanged.
    pub fn insert(&mut self, bundle: Bundle) -> StoreResult<EntityKey> {
        self.insert_keyed(None, Role::NONE, bundle)
    }

    /// Allocates an entity and places it under a `(component, role)` key.
    pub fn insert_keyed(
        &mut self,
        component: Option<ComponentId>,
        role: Role,
        bundle: Bundle,
    ) -> StoreResult<EntityKey> {
        let id = self.allocator.allocate()?;
        let key = EntityKey::tagged(id, component, role);

        self.entities.entry(id).or_default().push(EntityLocation {
            row: EntityLocation::UNPLACED,
            archetype: Archetype::EMPTY,
            component,
            role,
        });

        if let Err(error) = self.update(&key, bundle) {
            self.entities.remove(&id);
            self.allocator.release(id);
            return Err(error);
        }
        Ok(key)
    }

    /// Registers an existing entity under an additional `(component, role)`
    /// key and places the registration.
    ///
    /// ## Preconditions
    /// `key.entity` must be live and must not already carry a registration
    /// with the same `(component, role)`; violations are debug assertions.
    pub fn extend(&mut self, key: &EntityKey, bundle: Bundle) -> StoreResult<()> {
        let Some(locations) = self.entities.get_mut(&key.entity) else {
            debug_assert!(false, "extend on an unknown entity");
            return Ok(());
        };
        debug_assert!(
            key.position_in(locations).is_none(),
            "(component, role) already registered for this entity"
        );

        locations.push(EntityLocation {
            row: EntityLocation::UNPLACED,
            archetype: Archetype::EMPTY,
            component: key.component,
            role: key.role,
        });

        if let Err(error) = self.update(key, bundle) {
            if let Some(locations) = self.entities.get_mut(&key.entity) {
                locations.pop();
            }
            return Err(error);
        }
        Ok(())
    }

    /// Writes component values onto the registration addressed by `key`,
    /// migrating it to a wider archetype when the bundle introduces tags
    /// the registration does not yet carry.
    ///
    /// ## Behavior
    /// - Shape unchanged: values are replaced in place.
    /// - Shape changed (or registration not yet placed): the row migrates
    ///   to the bucket of the merged archetype. Values of tags common to
    ///   both shapes are carried across, then any provided values are
    ///   written over them.
    ///
    /// ## Errors
    /// Out-of-memory during row reservation; the world is restored to its
    /// pre-call state.
    pub fn update(&mut self, key: &EntityKey, bundle: Bundle) -> StoreResult<()> {
        debug_assert!(
            bundle.verify(&self.schema),
            "bundle was built against a different schema"
        );

        let Some(locations) = self.entities.get(&key.entity) else {
            debug_assert!(false, "update on an unknown entity");
            return Ok(());
        };
        let Some(position) = key.position_in(locations) else {
            debug_assert!(false, "update on an unregistered (component, role) key");
            return Ok(());
        };
        let current = locations[position];

        let target = current.archetype.merge(bundle.signature());
        if target == current.archetype && current.is_placed() {
            let index = self.bucket_position(current.archetype);
            let bucket = &mut self.buckets[index];
            for (tag, value) in bundle.into_values() {
                bucket
                    .replace_value(tag, current.row, value)
                    .expect("bundle verified against this world's schema");
            }
            return Ok(());
        }

        self.place(key, position, current, target, bundle)
    }

    /// Strips `tags` from the registration addressed by `key`.
    ///
    /// Values of the stripped data tags are dropped; the row migrates to
    /// the bucket of the narrowed archetype (possibly the empty one). A
    /// removal that changes nothing is a no-op.
    pub fn remove(&mut self, key: &EntityKey, tags: Archetype) -> StoreResult<()> {
        let Some(locations) = self.entities.get(&key.entity) else {
            debug_assert!(false, "remove on an unknown entity");
            return Ok(());
        };
        let Some(position) = key.position_in(locations) else {
            debug_assert!(false, "remove on an unregistered (component, role) key");
            return Ok(());
        };
        let current = locations[position];

        let target = current.archetype.difference(tags);
        if target == current.archetype {
            return Ok(());
        }

        self.place(key, position, current, target, Bundle::new())
    }

    /// Drops the single registration addressed by `key`, leaving the
    /// entity itself live.
    ///
    /// Returns `false` if the entity or registration does not exist.
    pub fn delete_key(&mut self, key: &EntityKey) -> bool {
        let removed = {
            let Some(locations) = self.entities.get_mut(&key.entity) else {
                return false;
            };
            let Some(position) = key.position_in(locations) else {
                debug_assert!(false, "delete_key on an unregistered (component, role) key");
                return false;
            };
            locations.swap_remove(position)
        };

        if removed.is_placed() {
            let index = self.bucket_position(removed.archetype);
            let bucket = &mut self.buckets[index];
            let displaced = bucket.remove(removed.row);
            let vacated = bucket.len() as RowId;
            if let Some(moved) = displaced {
                Self::patch_displaced(
                    &mut self.entities,
                    moved,
                    removed.archetype,
                    vacated,
                    removed.row,
                );
            }
        }
        true
    }

    /// Destroys `id`: every registration is removed from its bucket and
    /// the identifier returns to the allocator for reuse.
    ///
    /// Returns `false` if `id` is not live.
    pub fn despawn(&mut self, id: Entity) -> bool {
        let Some(mut locations) = self.entities.remove(&id) else {
            return false;
        };

        for index in 0..locations.len() {
            let location = locations[index];
            // Neutralize the consumed entry so displaced-row patching
            // below cannot match a stale record of the same id.
            locations[index].row = EntityLocation::UNPLACED;
            if !location.is_placed() {
                continue;
            }

            let bucket_position = self.bucket_position(location.archetype);
            let bucket = &mut self.buckets[bucket_position];
            let displaced = bucket.remove(location.row);
            let vacated = bucket.len() as RowId;

            match displaced {
                Some(moved) if moved == id => {
                    // Another registration of the despawned id was swapped
                    // into the vacated slot; patch the detached list so
                    // later removals see the corrected row.
                    let patched = locations.iter_mut().find(|entry| {
                        entry.archetype == location.archetype && entry.row == vacated
                    });
                    debug_assert!(patched.is_some(), "displaced registration not found");
                    if let Some(entry) = patched {
                        entry.row = location.row;
                    }
                }
                Some(moved) => {
                    Self::patch_displaced(
                        &mut self.entities,
                        moved,
                        location.archetype,
                        vacated,
                        location.row,
                    );
                }
                None => {}
            }
        }

        trace!("despawned entity {:?}", id);
        self.allocator.release(id);
        true
    }

    // ───────────────────────────────────────────────────────────────────
    // Point access
    // ───────────────────────────────────────────────────────────────────

    /// Reads one component of the registration addressed by `key`.
    ///
    /// `None` when the registration does not exist, is not placed, or its
    /// archetype does not carry `T` as a data component.
    pub fn get<T: 'static>(&self, key: &EntityKey) -> Option<&T> {
        let tag = self.schema.id_of::<T>()?;
        let locations = self.entities.get(&key.entity)?;
        let location = locations[key.position_in(locations)?];
        if !location.is_placed() || !location.archetype.has(tag) {
            return None;
        }
        let bucket = &self.buckets[*self.bucket_index.get(&location.archetype)?];
        bucket.slice::<T>(tag)?.get(location.row as usize)
    }

    /// Mutable counterpart of [`World::get`].
    pub fn get_mut<T: 'static>(&mut self, key: &EntityKey) -> Option<&mut T> {
        let tag = self.schema.id_of::<T>()?;
        let locations = self.entities.get(&key.entity)?;
        let location = locations[key.position_in(locations)?];
        if !location.is_placed() || !location.archetype.has(tag) {
            return None;
        }
        let index = *self.bucket_index.get(&location.archetype)?;
        self.buckets[index]
            .slice_mut::<T>(tag)?
            .get_mut(location.row as usize)
    }

    // ───────────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────────

    /// Iterates the non-empty buckets whose archetype contains `shape`.
    pub fn query(&self, shape: Archetype) -> Query<'_> {
        Query::new(&self.buckets, shape)
    }

    /// Mutable counterpart of [`World::query`].
    pub fn query_mut(&mut self, shape: Archetype) -> QueryMut<'_> {
        QueryMut::new(&mut self.buckets, shape)
    }

    /// Iterates every materialized bucket, empty ones included.
    ///
    /// Queries skip empty buckets; this iterator exists for diagnostics
    /// and invariant checking.
    pub fn buckets(&self) -> impl Iterator<Item = BucketRef<'_>> {
        self.buckets.iter().map(BucketRef::new)
    }

    // ───────────────────────────────────────────────────────────────────
    // Internals
    // ───────────────────────────────────────────────────────────────────

    fn bucket_position(&self, archetype: Archetype) -> usize {
        *self
            .bucket_index
            .get(&archetype)
            .expect("a placed registration names a materialized bucket")
    }

    /// Locates the bucket for `archetype`, materializing it if needed.
    /// The flag reports whether this call created it.
    fn bucket_entry(&mut self, archetype: Archetype) -> StoreResult<(usize, bool)> {
        if let Some(&index) = self.bucket_index.get(&archetype) {
            return Ok((index, false));
        }
        self.buckets.try_reserve(1).map_err(StoreError::Alloc)?;
        let index = self.buckets.len();
        self.buckets.push(Bucket::new(archetype, &self.schema));
        self.bucket_index.insert(archetype, index);
        Ok((index, true))
    }

    fn discard_bucket(&mut self, index: usize, archetype: Archetype) {
        debug_assert!(index + 1 == self.buckets.len());
        debug_assert!(self.buckets[index].is_empty());
        self.bucket_index.remove(&archetype);
        self.buckets.pop();
    }

    /// Moves the registration at `position` of `key.entity` into the
    /// bucket for `target` and writes the bundle's values into the new
    /// row. The migration protocol of the module docs.
    fn place(
        &mut self,
        key: &EntityKey,
        position: usize,
        current: EntityLocation,
        target: Archetype,
        bundle: Bundle,
    ) -> StoreResult<()> {
        let (target_index, created) = self.bucket_entry(target)?;

        let new_row = match self.buckets[target_index].reserve(key.entity) {
            Ok(row) => row,
            Err(error) => {
                if created {
                    self.discard_bucket(target_index, target);
                }
                return Err(error);
            }
        };

        let carried = if current.is_placed() {
            trace!(
                "migrating {:?} from archetype {:#06x} to {:#06x}",
                key.entity,
                current.archetype.bits(),
                target.bits()
            );
            let source_index = self.bucket_position(current.archetype);
            let (source, destination) =
                bucket_pair_mut(&mut self.buckets, source_index, target_index);
            let displaced = source.migrate_row(destination, current.row, new_row);
            let vacated = source.len() as RowId;
            if let Some(moved) = displaced {
                Self::patch_displaced(
                    &mut self.entities,
                    moved,
                    current.archetype,
                    vacated,
                    current.row,
                );
            }
            current.archetype.intersection(target)
        } else {
            Archetype::EMPTY
        };

        let locations = self
            .entities
            .get_mut(&key.entity)
            .expect("registration list checked by the caller");
        locations[position] = EntityLocation {
            row: new_row,
            archetype: target,
            component: key.component,
            role: key.role,
        };

        let bucket = &mut self.buckets[target_index];
        for (tag, value) in bundle.into_values() {
            // Tags carried over from the source already hold a value that
            // must be dropped on overwrite; fresh tags hold none.
            let written = if carried.has(tag) {
                bucket.replace_value(tag, new_row, value)
            } else {
                bucket.write_value(tag, new_row, value)
            };
            written.expect("bundle verified against this world's schema");
        }
        Ok(())
    }

    /// Points the registration displaced out of (`archetype`, `vacated`)
    /// at its new row. The pair uniquely identifies the registration.
    fn patch_displaced(
        entities: &mut HashMap<Entity, Vec<EntityLocation>>,
        moved: Entity,
        archetype: Archetype,
        vacated: RowId,
        new_row: RowId,
    ) {
        let Some(locations) = entities.get_mut(&moved) else {
            debug_assert!(false, "displaced entity has no registrations");
            return;
        };
        let Some(location) = locations
            .iter_mut()
            .find(|entry| entry.archetype == archetype && entry.row == vacated)
        else {
            debug_assert!(false, "displaced registration not found");
            return;
        };
        location.row = new_row;
    }
}

/// Mutably borrows two distinct buckets at once.
#[inline]
fn bucket_pair_mut(buckets: &mut [Bucket], a: usize, b: usize) -> (&mut Bucket, &mut Bucket) {
    assert!(a != b, "source and destination bucket must differ");
    let (low, high) = if a < b { (a, b) } else { (b, a) };

    let (head, tail) = buckets.split_at_mut(high);
    let low_reference = &mut head[low];
    let high_reference = &mut tail[0];
    if a < b {
        (low_reference, high_reference)
    } else {
        (high_reference, low_reference)
    }
}
