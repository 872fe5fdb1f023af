// ============================================================================
// reactive-model - Model Module
// Instance state: property store, bindings, history, and the reactive object
// ============================================================================

pub mod bindings;
pub mod history;
pub mod object;
pub mod store;

pub use bindings::{BindingId, BindingTarget, TransformFn};
pub use history::{Action, HistoryLog};
pub use object::{ReactiveObject, TwoWayBinding};
pub use store::{PropertyStore, WriteOutcome};
