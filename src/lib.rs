//! # hive-ecs
//!
//! Archetype-based entity-component store intended as the simulation
//! substrate of a small game engine.
//!
//! ## Design Goals
//! - Archetype-bucketed columnar storage for cache-friendly iteration
//! - Packed columns maintained by swap-remove, so removal is O(1)
//! - Explicit, rollback-protected growth on every fallible path
//! - A value-typed store: no global state, multiple independent worlds
//!
//! Entity data is partitioned by the exact component set an entity carries
//! (its [`Archetype`]). All entities sharing a shape live in one bucket as
//! parallel packed columns, so iterating a query is a contiguous walk.
//! Adding or removing components migrates the entity's row between buckets.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core store types

pub use engine::world::World;

pub use engine::entity::{
    EntityAllocator,
    EntityKey,
    EntityLocation,
};

pub use engine::archetype::Archetype;

pub use engine::schema::{
    Bundle,
    ComponentInfo,
    Schema,
    SchemaBuilder,
};

pub use engine::query::{BucketRef, BucketRefMut, ColumnView, Query, QueryMut};

pub use engine::systems::{FnSystem, System, SystemContext};
pub use engine::scheduler::Scheduler;

pub use engine::commands::{Command, CommandBuffer};

pub use engine::error::{
    CapacityError,
    SchemaError,
    StoreError,
    StoreResult,
    TypeMismatchError,
};

pub use engine::types::{
    ComponentId,
    Entity,
    Role,
    RowId,
    COMPONENT_CAP,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used store types.
///
/// Import with:
/// ```rust
/// use hive_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Archetype,
        Bundle,
        Entity,
        EntityKey,
        FnSystem,
        Role,
        Scheduler,
        Schema,
        SchemaBuilder,
        StoreResult,
        System,
        World,
    };
}
