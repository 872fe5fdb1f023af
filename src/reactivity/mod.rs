// ============================================================================
// reactive-model - Reactivity Module
// Dependency graph and change-propagation planning
// ============================================================================

pub mod graph;
pub mod propagation;

pub use graph::DepGraph;
pub use propagation::plan;
