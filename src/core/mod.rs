// ============================================================================
// reactive-model - Core Module
// Values, errors, and the schema contract
// ============================================================================

pub mod error;
pub mod schema;
pub mod value;

// Re-export commonly used items
pub use error::{Error, Result};
pub use schema::{ComputeFn, PropertySpec, PropertyView, Schema, SchemaBuilder};
pub use value::Value;
