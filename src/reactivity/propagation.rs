// ============================================================================
// reactive-model - Propagation Planning
// Decides what to recompute, and in what order, for a change pass
// ============================================================================
//
// A pass starts from one or more changed stored properties (several when a
// thaw flushes a batch). The plan is the set of computed properties
// reachable through the dependency graph, in topological order (reverse
// DFS post-order), each appearing exactly once. Executing the plan in order
// gives the diamond guarantee: a computed property depending on two branches
// of the same change recomputes once, after both branches have settled, so
// bindings never observe an intermediate value.
//
// The DFS keeps an on-stack set: re-entering a property that is still being
// walked means the declared dependencies form a cycle, and the pass fails
// fast with CyclicDependency instead of recursing forever.
// ============================================================================

use std::collections::HashSet;

use crate::core::error::{Error, Result};
use crate::reactivity::graph::DepGraph;

/// Compute the ordered recompute plan for a change to `seeds`.
///
/// Returns the reachable computed properties, dependencies before
/// dependents, each exactly once. Seeds themselves are not part of the
/// plan (they are stored properties whose values already changed).
pub fn plan(graph: &DepGraph, seeds: &[String]) -> Result<Vec<String>> {
    let mut post_order: Vec<String> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut on_stack: HashSet<String> = HashSet::new();

    for seed in seeds {
        for dependent in graph.dependents_of(seed) {
            visit(graph, dependent, &mut visited, &mut on_stack, &mut post_order)?;
        }
    }

    post_order.reverse();
    tracing::trace!(seeds = ?seeds, plan = ?post_order, "propagation plan");
    Ok(post_order)
}

fn visit(
    graph: &DepGraph,
    name: &str,
    visited: &mut HashSet<String>,
    on_stack: &mut HashSet<String>,
    post_order: &mut Vec<String>,
) -> Result<()> {
    if on_stack.contains(name) {
        return Err(Error::CyclicDependency(name.to_owned()));
    }
    if visited.contains(name) {
        return Ok(());
    }

    visited.insert(name.to_owned());
    on_stack.insert(name.to_owned());

    for dependent in graph.dependents_of(name) {
        visit(graph, dependent, visited, on_stack, post_order)?;
    }

    on_stack.remove(name);
    post_order.push(name.to_owned());
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
