// ============================================================================
// reactive-model - Errors
// The crate-wide error taxonomy
// ============================================================================

/// Errors surfaced by the reactive runtime.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Read or write of a property name the schema does not declare.
    #[error("unknown property `{0}`")]
    InvalidProperty(String),

    /// Direct write attempt to a computed property.
    #[error("property `{0}` is computed and read-only")]
    ComputedPropertyReadOnly(String),

    /// Mutating operation on a disposed object.
    #[error("object has been disposed")]
    Disposed,

    /// A computed property's dependency chain revisited itself during
    /// propagation. Named after the property where the walk re-entered.
    #[error("cyclic dependency through computed property `{0}`")]
    CyclicDependency(String),

    /// A compute function failed. Dependents settled earlier in the same
    /// pass keep their new values; there is no rollback.
    #[error("compute for `{property}` failed: {reason}")]
    ComputeFailed { property: String, reason: String },

    /// The storage collaborator failed or returned malformed data.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
