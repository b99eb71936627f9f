//! # Component Schema
//!
//! This module assigns stable [`ComponentId`] values to Rust component types
//! and exposes type-erased storage factories for bucket column allocation.
//!
//! ## Purpose
//! The schema decouples component type information (`TypeId`, name, size,
//! alignment) from runtime storage, enabling buckets to store heterogeneous
//! component columns behind [`ErasedColumn`].
//!
//! ## Design
//! - Components are registered once through a [`SchemaBuilder`] and assigned
//!   compact ascending ids in `[0, COMPONENT_CAP)`.
//! - Data components record a factory function constructing empty column
//!   storage; zero-sized types are rejected.
//! - Void markers (zero-sized tag types) participate in archetypes but own
//!   no column; the schema tracks them in a void mask.
//! - `build()` freezes the declaration into an immutable [`Schema`] owned by
//!   the world. The schema is a value — independent worlds may carry
//!   independent schemas, and nothing global is involved.
//!
//! ## Invariants
//! - `ComponentId` values are unique and dense within one schema.
//! - Every data component has a storage factory; no marker does.
//! - A schema declares at least one component kind.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::mem::{align_of, size_of};

use crate::engine::archetype::Archetype;
use crate::engine::column::{new_column, ErasedColumn};
use crate::engine::error::SchemaError;
use crate::engine::types::{ComponentId, COMPONENT_CAP};

/// Factory function constructing an empty type-erased column.
type FactoryFn = fn() -> Box<dyn ErasedColumn>;

/// Describes one registered component kind.
///
/// ## Notes
/// `ComponentInfo` is returned by [`Schema::info`] for diagnostics and
/// validation; the stored factory is internal to the store.
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    /// Identifier assigned to this component kind.
    pub id: ComponentId,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component type.
    pub type_id: TypeId,

    /// Size of the component type in bytes; zero for markers.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    /// `true` if this kind carries no per-entity data.
    pub void: bool,

    factory: Option<FactoryFn>,
}

impl std::fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("void", &self.void)
            .finish()
    }
}

/// Builder declaring the component kinds of a world.
///
/// Registration order determines component ids: the first registration gets
/// id 0, the next id 1, and so on. Ids index directly into archetype bits.
#[derive(Default)]
pub struct SchemaBuilder {
    infos: Vec<ComponentInfo>,
    by_type: HashMap<TypeId, ComponentId>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> Result<ComponentId, SchemaError> {
        if self.infos.len() >= COMPONENT_CAP {
            return Err(SchemaError::CapacityExceeded { capacity: COMPONENT_CAP });
        }
        Ok(self.infos.len() as ComponentId)
    }

    fn check_duplicate<T: 'static>(&self) -> Result<(), SchemaError> {
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return Err(SchemaError::Duplicate { name: type_name::<T>() });
        }
        Ok(())
    }

    /// Registers a data-carrying component type and returns its id.
    ///
    /// ## Errors
    /// - `ZeroSized` if `T` has size zero (declare it as a marker instead).
    /// - `Duplicate` if `T` is already registered.
    /// - `CapacityExceeded` past [`COMPONENT_CAP`] kinds.
    pub fn component<T: 'static>(&mut self) -> Result<ComponentId, SchemaError> {
        if size_of::<T>() == 0 {
            return Err(SchemaError::ZeroSized { name: type_name::<T>() });
        }
        self.check_duplicate::<T>()?;
        let id = self.next_id()?;
        self.by_type.insert(TypeId::of::<T>(), id);
        self.infos.push(ComponentInfo {
            id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            void: false,
            factory: Some(new_column::<T>),
        });
        Ok(id)
    }

    /// Registers a void marker type and returns its id.
    ///
    /// Markers participate in archetypes as pure tags and own no column.
    ///
    /// ## Errors
    /// - `MarkerCarriesData` if `T` is not zero-sized.
    /// - `Duplicate` if `T` is already registered.
    /// - `CapacityExceeded` past [`COMPONENT_CAP`] kinds.
    pub fn marker<T: 'static>(&mut self) -> Result<ComponentId, SchemaError> {
        if size_of::<T>() != 0 {
            return Err(SchemaError::MarkerCarriesData { name: type_name::<T>() });
        }
        self.check_duplicate::<T>()?;
        let id = self.next_id()?;
        self.by_type.insert(TypeId::of::<T>(), id);
        self.infos.push(ComponentInfo {
            id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: 0,
            align: align_of::<T>(),
            void: true,
            factory: None,
        });
        Ok(id)
    }

    /// Freezes the declaration into an immutable [`Schema`].
    ///
    /// ## Errors
    /// `Empty` if no component kind was registered; a store over zero
    /// component kinds has no meaningful archetype.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.infos.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut void_mask = Archetype::EMPTY;
        for info in &self.infos {
            if info.void {
                void_mask = void_mask.with(info.id);
            }
        }
        Ok(Schema {
            infos: self.infos,
            by_type: self.by_type,
            void_mask,
        })
    }
}

/// Immutable mapping between Rust component types and component ids.
///
/// Owned by the world; queried on every insert and update to resolve and
/// validate component identities.
pub struct Schema {
    infos: Vec<ComponentInfo>,
    by_type: HashMap<TypeId, ComponentId>,
    void_mask: Archetype,
}

impl Schema {
    /// Number of registered component kinds.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no component kinds are registered.
    ///
    /// Always `false` for a built schema; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// The archetype consisting of exactly the void marker kinds.
    pub fn void_mask(&self) -> Archetype {
        self.void_mask
    }

    /// Returns the id assigned to type `T`, if registered.
    pub fn id_of<T: 'static>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id assigned to type `T`.
    ///
    /// ## Panics
    /// Panics if `T` was not registered in this schema.
    pub fn require<T: 'static>(&self) -> ComponentId {
        match self.id_of::<T>() {
            Some(id) => id,
            None => panic!("{} is not registered in this schema", type_name::<T>()),
        }
    }

    /// Returns the descriptor for `id`.
    ///
    /// ## Panics
    /// Panics if `id` was not assigned by this schema.
    pub fn info(&self, id: ComponentId) -> &ComponentInfo {
        &self.infos[id as usize]
    }

    /// Returns `true` if `id` names a void marker.
    pub fn is_void(&self, id: ComponentId) -> bool {
        self.void_mask.has(id)
    }

    /// Constructs an empty column for the data component `id`.
    ///
    /// ## Panics
    /// Panics if `id` names a void marker (markers own no column).
    pub(crate) fn make_column(&self, id: ComponentId) -> Box<dyn ErasedColumn> {
        let factory = self.infos[id as usize]
            .factory
            .expect("void markers own no column");
        factory()
    }

    /// Returns `true` if `value`'s dynamic type matches the declared type
    /// of component `id`.
    pub(crate) fn value_matches(&self, id: ComponentId, value: &dyn Any) -> bool {
        (id as usize) < self.infos.len() && self.infos[id as usize].type_id == value.type_id()
    }
}

/// Type-erased collection of component values for insert and update.
///
/// A bundle pairs a signature bitset (which kinds are present, markers
/// included) with boxed values for the data-carrying kinds. Values are
/// resolved against a schema at insertion time, so a bundle applied to the
/// world whose schema built it cannot mismatch types.
#[derive(Default)]
pub struct Bundle {
    signature: Archetype,
    values: Vec<(ComponentId, Box<dyn Any>)>,
}

impl Bundle {
    /// Creates an empty bundle.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a data component value.
    ///
    /// ## Panics
    /// Panics if `T` is not registered in `schema` or is a void marker.
    /// Inserting the same kind twice is a debug assertion.
    #[inline]
    pub fn insert<T: 'static>(&mut self, schema: &Schema, value: T) {
        let id = schema.require::<T>();
        debug_assert!(!schema.is_void(id), "{} is a marker; use insert_marker", type_name::<T>());
        debug_assert!(!self.signature.has(id), "duplicate component {} in bundle", type_name::<T>());
        self.signature = self.signature.with(id);
        self.values.push((id, Box::new(value)));
    }

    /// Inserts a void marker.
    ///
    /// ## Panics
    /// Panics if `T` is not registered in `schema` or carries data.
    #[inline]
    pub fn insert_marker<T: 'static>(&mut self, schema: &Schema) {
        let id = schema.require::<T>();
        debug_assert!(schema.is_void(id), "{} carries data; use insert", type_name::<T>());
        debug_assert!(!self.signature.has(id), "duplicate marker {} in bundle", type_name::<T>());
        self.signature = self.signature.with(id);
    }

    /// Chaining form of [`Bundle::insert`].
    #[inline]
    pub fn with<T: 'static>(mut self, schema: &Schema, value: T) -> Self {
        self.insert(schema, value);
        self
    }

    /// Chaining form of [`Bundle::insert_marker`].
    #[inline]
    pub fn with_marker<T: 'static>(mut self, schema: &Schema) -> Self {
        self.insert_marker::<T>(schema);
        self
    }

    /// The set of component kinds present in this bundle, markers included.
    #[inline]
    pub fn signature(&self) -> Archetype {
        self.signature
    }

    /// Returns `true` if the bundle holds no kinds at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.signature.is_empty()
    }

    /// Returns `true` if every held value matches its declared type in
    /// `schema`. Used to assert bundles against the world's own schema.
    pub(crate) fn verify(&self, schema: &Schema) -> bool {
        self.values
            .iter()
            .all(|(id, value)| schema.value_matches(*id, value.as_ref()))
    }

    pub(crate) fn into_values(self) -> Vec<(ComponentId, Box<dyn Any>)> {
        self.values
    }
}
