//! System Abstractions
//!
//! This module defines the execution contract between the store and its
//! callers.
//!
//! A **system** is a unit of logic that operates over bucket storage.
//! Systems:
//! - declare the component set they require as an [`Archetype`],
//! - receive each matching non-empty bucket once per run, as packed
//!   columnar slices,
//! - defer structural mutations through the context's command buffer
//!   rather than touching the world mid-iteration.
//!
//! ## Execution model
//!
//! The runner resolves a system's `inputs` shape against the world's
//! buckets and invokes [`System::update`] once per non-empty matching
//! bucket, bracketed by the optional [`System::begin`] and [`System::end`]
//! hooks. Structural mutations recorded during the run are applied when
//! the system finishes.
//!
//! ## Function-backed Systems
//!
//! [`FnSystem`] defines a system from a closure, avoiding a named type for
//! simple per-bucket logic.

use crate::engine::archetype::Archetype;
use crate::engine::commands::CommandBuffer;
use crate::engine::query::BucketRefMut;
use crate::engine::schema::Schema;

/// Per-run context handed to system hooks.
pub struct SystemContext<'a> {
    /// The world's component schema, for resolving tags and building
    /// bundles mid-walk.
    pub schema: &'a Schema,

    /// Buffer for structural mutations; applied after the system runs.
    pub commands: &'a mut CommandBuffer,
}

/// A unit of executable logic operating on bucket storage.
pub trait System {
    /// Human-readable name, for diagnostics.
    fn name(&self) -> &'static str;

    /// The component set a bucket must contain for this system to visit it.
    fn inputs(&self) -> Archetype;

    /// Called once before the bucket walk.
    fn begin(&mut self, _context: &mut SystemContext<'_>) {}

    /// Called once per non-empty bucket whose archetype contains
    /// [`System::inputs`].
    fn update(&mut self, bucket: &mut BucketRefMut<'_>, context: &mut SystemContext<'_>);

    /// Called once after the bucket walk.
    fn end(&mut self, _context: &mut SystemContext<'_>) {}
}

/// A [`System`] backed by a closure.
pub struct FnSystem<F>
where
    F: FnMut(&mut BucketRefMut<'_>, &mut SystemContext<'_>),
{
    name: &'static str,
    inputs: Archetype,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut BucketRefMut<'_>, &mut SystemContext<'_>),
{
    /// Creates a closure-backed system.
    ///
    /// # Parameters
    /// - `name`: Human-readable name, useful for debugging.
    /// - `inputs`: Required component set used for bucket matching.
    /// - `f`: The closure executed once per matching bucket.
    pub fn new(name: &'static str, inputs: Archetype, f: F) -> Self {
        Self { name, inputs, f }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut BucketRefMut<'_>, &mut SystemContext<'_>),
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn inputs(&self) -> Archetype {
        self.inputs
    }

    fn update(&mut self, bucket: &mut BucketRefMut<'_>, context: &mut SystemContext<'_>) {
        (self.f)(bucket, context)
    }
}
