//! Error types for entity allocation, schema construction, and storage.
//!
//! This module declares focused, composable error types used across the
//! store. Each error carries enough context to make failures actionable
//! while remaining small and cheap to pass around or convert into the
//! aggregate [`StoreError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g.
//!   identifier exhaustion, allocation failure, schema misuse).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into aggregates.
//! * **A narrow public surface:** The only failures that cross the public
//!   API of the store are out-of-memory conditions — identifier exhaustion
//!   and allocation failure — both carried by [`StoreError`]. Everything
//!   else (wrong downcasts, absent tags, shape mismatches) is a programmer
//!   error and is handled by debug assertions, not by error values.
//!
//! ## Typical flow
//! Low-level column and allocator operations return small, dedicated error
//! types. Higher-level store code uses `?` to bubble failures into
//! [`StoreError`], restoring every invariant before returning.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::any::TypeId;
use std::collections::TryReserveError;
use std::fmt;

/// Returned when the store cannot issue another entity identifier because
/// the 32-bit identifier space has been exhausted.
///
/// ### Fields
/// * `needed` — Total number of identifiers the operation attempted to have
///   issued.
/// * `capacity` — The number of issuable identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    /// Total identifiers the operation attempted to have issued.
    pub needed: u64,

    /// Number of issuable identifiers.
    pub capacity: u64,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entity identifier limit reached ({} needed; capacity {})",
            self.needed, self.capacity
        )
    }
}

impl std::error::Error for CapacityError {}

/// Returned when a type-erased column write receives a value whose dynamic
/// type does not match the column's element type.
///
/// This is a logic error surfaced by storage when a bundle was built against
/// a different schema than the world it is applied to (e.g. writing a
/// `Velocity` into a `Position` column). Bundles built against the world's
/// own schema cannot produce it.
///
/// ### Fields
/// * `expected` — The [`TypeId`] the column declares.
/// * `actual` — The [`TypeId`] of the value provided by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    /// Column's declared element type.
    pub expected: TypeId,

    /// Provided value's dynamic type.
    pub actual: TypeId,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type mismatch: expected {:?}, actual {:?}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for TypeMismatchError {}

/// Errors raised while declaring a component schema.
///
/// All schema errors are build-time (world-construction-time) failures;
/// once a [`Schema`](crate::Schema) exists it is immutable and infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// A data component type has size zero; zero-sized types must be
    /// declared as markers instead.
    ZeroSized {
        /// Rust type name of the offending component.
        name: &'static str,
    },

    /// A marker type carries data; markers must be zero-sized.
    MarkerCarriesData {
        /// Rust type name of the offending marker.
        name: &'static str,
    },

    /// The type was already registered in this schema.
    Duplicate {
        /// Rust type name of the duplicate registration.
        name: &'static str,
    },

    /// The schema declares more component kinds than the archetype width
    /// can represent.
    CapacityExceeded {
        /// Maximum number of component kinds.
        capacity: usize,
    },

    /// The schema declares no component kinds at all.
    Empty,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::ZeroSized { name } => {
                write!(f, "component {} is zero-sized; declare it as a marker", name)
            }
            SchemaError::MarkerCarriesData { name } => {
                write!(f, "marker {} carries data; declare it as a component", name)
            }
            SchemaError::Duplicate { name } => {
                write!(f, "{} is already registered in this schema", name)
            }
            SchemaError::CapacityExceeded { capacity } => {
                write!(f, "schema exceeds the component capacity of {}", capacity)
            }
            SchemaError::Empty => f.write_str("schema declares no component kinds"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Aggregate error for fallible store operations.
///
/// Both variants are out-of-memory conditions. Every operation that can
/// return a `StoreError` restores the pre-call state of the store before
/// returning: appended rows are popped, grown columns are shrunk, and a
/// bucket created by the failing call is removed again.
///
/// ### Variants
/// * `Exhausted(CapacityError)` — The 32-bit entity identifier space has
///   been fully issued and nothing has been returned to the freelist.
/// * `Alloc(TryReserveError)` — A growable structure could not reserve
///   memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Entity identifier space is exhausted.
    Exhausted(CapacityError),

    /// A growable structure failed to allocate.
    Alloc(TryReserveError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Exhausted(e) => write!(f, "{e}"),
            StoreError::Alloc(e) => write!(f, "allocation failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<CapacityError> for StoreError {
    fn from(e: CapacityError) -> Self {
        StoreError::Exhausted(e)
    }
}

impl From<TryReserveError> for StoreError {
    fn from(e: TryReserveError) -> Self {
        StoreError::Alloc(e)
    }
}

/// Convenience alias for results of fallible store operations.
pub type StoreResult<T> = Result<T, StoreError>;
