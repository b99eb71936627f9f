//! Per-archetype columnar storage.
//!
//! A [`Bucket`] stores every entity of one archetype: a parallel entity-id
//! column plus one type-erased data column per non-void tag, kept in
//! ascending tag order so [`Archetype::index`] addresses columns directly.
//!
//! ## Invariants
//! - Every column has exactly `entities.len()` rows.
//! - `columns.len()` equals the archetype's non-void component count.
//! - Rows are densely packed; removal swap-fills from the last row.
//! - For every row there is exactly one registration in the world's entity
//!   map recording this bucket's archetype and that row index.
//!
//! Removal returns the entity id displaced from the former last row so the
//! caller can patch that entity's registration — the single pointer update
//! that pays for O(1) packed removal.

use std::any::Any;

use log::debug;

use crate::engine::archetype::Archetype;
use crate::engine::column::{column_slice, column_slice_mut, ErasedColumn};
use crate::engine::error::{StoreError, TypeMismatchError};
use crate::engine::schema::Schema;
use crate::engine::types::{ComponentId, Entity, RowId};

/// Columnar storage for all entities sharing one archetype.
pub struct Bucket {
    archetype: Archetype,
    void: Archetype,
    entities: Vec<Entity>,
    columns: Vec<Box<dyn ErasedColumn>>,
}

impl Bucket {
    /// Creates an empty bucket for `archetype`, building one column per
    /// non-void tag in ascending tag order.
    pub(crate) fn new(archetype: Archetype, schema: &Schema) -> Self {
        let void = schema.void_mask();
        let columns = archetype
            .difference(void)
            .iter()
            .map(|tag| schema.make_column(tag))
            .collect::<Vec<_>>();

        debug!(
            "created bucket for archetype {:#06x} ({} columns)",
            archetype.bits(),
            columns.len()
        );

        Self { archetype, void, entities: Vec::new(), columns }
    }

    /// The archetype stored by this bucket.
    #[inline]
    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    /// Number of entities stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the bucket holds no entities.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The packed entity-id column.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Appends a row for `id` across the entity column and every data
    /// column, returning the new row index.
    ///
    /// ## Behavior
    /// The entity id is appended first, then each column grows by one
    /// uninitialized row. If any growth fails, every previously grown
    /// column is shrunk back and the appended id is popped, so the bucket
    /// is exactly as it was before the call.
    ///
    /// The new row's column slots are uninitialized; the caller must write
    /// or migrate values into them before returning to its own caller.
    pub(crate) fn reserve(&mut self, id: Entity) -> Result<RowId, StoreError> {
        self.entities.try_reserve(1).map_err(StoreError::Alloc)?;
        self.entities.push(id);

        let previous_length = self.entities.len() - 1;
        for index in 0..self.columns.len() {
            if let Err(error) = self.columns[index].grow_one() {
                for column in &mut self.columns[..index] {
                    column.shrink(previous_length);
                }
                self.entities.pop();
                return Err(StoreError::Alloc(error));
            }
        }

        Ok(previous_length as RowId)
    }

    /// Swap-removes the row at `row` from every column, dropping its
    /// values.
    ///
    /// Returns the entity id that was moved from the former last row into
    /// `row`, or `None` if `row` was already last. The caller must patch
    /// the returned entity's registration to point at `row`.
    pub(crate) fn remove(&mut self, row: RowId) -> Option<Entity> {
        let row = row as usize;
        debug_assert!(row < self.entities.len());

        for column in &mut self.columns {
            column.swap_remove(row);
        }

        let last = self.entities.len() - 1;
        let displaced = if row != last { Some(self.entities[last]) } else { None };
        self.entities.swap_remove(row);
        displaced
    }

    /// Moves the row at `source_row` into `destination` at
    /// `destination_row`, value by value.
    ///
    /// ## Behavior
    /// - Tags present in both archetypes have their value moved into the
    ///   destination column (whose row must already be reserved).
    /// - Tags present only in this bucket have their value dropped.
    /// - The source row is swap-filled from the last row, exactly as
    ///   [`Bucket::remove`] does, and the displaced entity id is returned.
    ///
    /// ## Invariants
    /// `destination` must be a different bucket; an entity migrates only
    /// when its shape actually changes.
    pub(crate) fn migrate_row(
        &mut self,
        destination: &mut Bucket,
        source_row: RowId,
        destination_row: RowId,
    ) -> Option<Entity> {
        debug_assert!(self.archetype != destination.archetype);
        debug_assert!((source_row as usize) < self.entities.len());
        debug_assert!((destination_row as usize) < destination.entities.len());

        for (index, tag) in self.archetype.difference(self.void).iter().enumerate() {
            if destination.archetype.has(tag) {
                let destination_index = destination.archetype.index(tag, destination.void);
                self.columns[index].transfer_row(
                    &mut *destination.columns[destination_index],
                    source_row as usize,
                    destination_row as usize,
                );
            } else {
                self.columns[index].swap_remove(source_row as usize);
            }
        }

        let row = source_row as usize;
        let last = self.entities.len() - 1;
        let displaced = if row != last { Some(self.entities[last]) } else { None };
        self.entities.swap_remove(row);
        displaced
    }

    /// Writes `value` into the freshly reserved slot at (`tag`, `row`).
    pub(crate) fn write_value(
        &mut self,
        tag: ComponentId,
        row: RowId,
        value: Box<dyn Any>,
    ) -> Result<(), TypeMismatchError> {
        let index = self
            .archetype
            .index_of(tag, self.void)
            .expect("tag is a data component of this bucket");
        self.columns[index].write_dyn(row as usize, value)
    }

    /// Replaces the initialized value at (`tag`, `row`), dropping the old
    /// one.
    pub(crate) fn replace_value(
        &mut self,
        tag: ComponentId,
        row: RowId,
        value: Box<dyn Any>,
    ) -> Result<(), TypeMismatchError> {
        let index = self
            .archetype
            .index_of(tag, self.void)
            .expect("tag is a data component of this bucket");
        self.columns[index].replace_dyn(row as usize, value)
    }

    /// Returns the packed values of `tag` as a typed slice.
    ///
    /// `None` when `tag` is absent from this archetype or void. A type
    /// parameter that does not match the declared component type is a
    /// debug assertion.
    pub fn slice<T: 'static>(&self, tag: ComponentId) -> Option<&[T]> {
        let index = self.archetype.index_of(tag, self.void)?;
        column_slice(self.columns[index].as_ref())
    }

    /// Mutable counterpart of [`Bucket::slice`].
    pub fn slice_mut<T: 'static>(&mut self, tag: ComponentId) -> Option<&mut [T]> {
        let index = self.archetype.index_of(tag, self.void)?;
        column_slice_mut(self.columns[index].as_mut())
    }

    /// Returns the columns for two distinct tags as typed slices, the
    /// second mutably. Used by systems that read one component while
    /// writing another within the same bucket.
    pub fn slice_pair_mut<A: 'static, B: 'static>(
        &mut self,
        read: ComponentId,
        write: ComponentId,
    ) -> Option<(&[A], &mut [B])> {
        let read_index = self.archetype.index_of(read, self.void)?;
        let write_index = self.archetype.index_of(write, self.void)?;
        debug_assert!(read_index != write_index, "tags must be distinct");
        if read_index == write_index {
            return None;
        }

        let (read_column, write_column) = if read_index < write_index {
            let (head, tail) = self.columns.split_at_mut(write_index);
            (&*head[read_index], tail[0].as_mut())
        } else {
            let (head, tail) = self.columns.split_at_mut(read_index);
            (&*tail[0], head[write_index].as_mut())
        };

        Some((column_slice(read_column)?, column_slice_mut(write_column)?))
    }
}
