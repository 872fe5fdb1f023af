// ============================================================================
// reactive-model - Dependency Graph
// Maps a property name to the computed properties that depend on it
// ============================================================================
//
// Edges are derived once from each computed property's declared deps list
// when a schema is built, and are immutable for the lifetime of the type.
// Sources can be stored or computed; dependents are always computed.
// ============================================================================

use std::collections::HashMap;

/// Forward dependency edges: `source -> [dependent computed properties]`.
///
/// Registration performs no cycle checking; a cycle surfaces as
/// [`crate::Error::CyclicDependency`] when a propagation pass walks it.
#[derive(Default)]
pub struct DepGraph {
    forward: HashMap<String, Vec<String>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register that `dependent` must be recomputed when `source` changes.
    /// Idempotent: adding the same edge twice has no extra effect.
    pub fn add_edge(&mut self, source: &str, dependent: &str) {
        let dependents = self.forward.entry(source.to_owned()).or_default();
        if !dependents.iter().any(|d| d == dependent) {
            dependents.push(dependent.to_owned());
        }
    }

    /// Directly dependent computed properties of `source`, in edge insertion
    /// order. Empty slice (never an error) if none are registered.
    pub fn dependents_of(&self, source: &str) -> &[String] {
        self.forward
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any dependents are registered for `source`.
    pub fn has_dependents(&self, source: &str) -> bool {
        !self.dependents_of(source).is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_accumulate_per_source() {
        let mut graph = DepGraph::new();
        graph.add_edge("todos", "totalCount");
        graph.add_edge("todos", "completedCount");

        assert_eq!(graph.dependents_of("todos"), ["totalCount", "completedCount"]);
        assert!(graph.has_dependents("todos"));
    }

    #[test]
    fn add_edge_is_idempotent() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");

        assert_eq!(graph.dependents_of("a"), ["b"]);
    }

    #[test]
    fn unknown_source_has_empty_dependents() {
        let graph = DepGraph::new();
        assert!(graph.dependents_of("nothing").is_empty());
        assert!(!graph.has_dependents("nothing"));
    }

    #[test]
    fn insertion_order_is_stable() {
        let mut graph = DepGraph::new();
        graph.add_edge("a", "z");
        graph.add_edge("a", "m");
        graph.add_edge("a", "b");

        assert_eq!(graph.dependents_of("a"), ["z", "m", "b"]);
    }
}
