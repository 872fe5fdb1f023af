// ============================================================================
// reactive-model - A Schema-Driven Reactive Object Runtime
// ============================================================================
//
// A model object declares its properties up front: stored ones hold
// independently assignable values, computed ones derive their value from an
// explicit dependency list. Writes to stored properties cascade through the
// dependency graph, recomputing each affected computed property exactly once
// per change, push final values into registered bindings, and land in an
// undo/redo log. Freeze/thaw batches writes; a storage collaborator can
// persist stored state as JSON.
//
// Single-threaded by design: every cascade completes synchronously before
// the write that caused it returns.
// ============================================================================

pub mod core;
pub mod model;
pub mod persist;
pub mod reactivity;

// Re-export the public surface at crate root for ergonomic access
pub use crate::core::error::{Error, Result};
pub use crate::core::schema::{ComputeFn, PropertySpec, PropertyView, Schema, SchemaBuilder};
pub use crate::core::value::Value;
pub use crate::model::bindings::{BindingId, BindingTarget, TransformFn};
pub use crate::model::history::{Action, HistoryLog};
pub use crate::model::object::{ReactiveObject, TwoWayBinding};
pub use crate::model::store::{PropertyStore, WriteOutcome};
pub use crate::persist::{JsonFileStore, MemoryStore, Storage};
pub use crate::reactivity::graph::DepGraph;

// =============================================================================
// TESTS
// =============================================================================
