// ============================================================================
// reactive-model - Binding Registry
// One-way and guarded links from a source property to an external slot
// ============================================================================
//
// A binding mirrors a source property's value into a target slot, optionally
// through a transform. Targets are held weakly - the core writes into them
// but never manages their lifetime; a target that has been dropped is
// silently skipped and pruned.
//
// Bidirectional pairs are built from two guarded sinks sharing one
// re-entrancy flag: while one direction is applying its write, the opposite
// direction is suppressed, which is what keeps A<->B from recursing forever.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::value::Value;

// =============================================================================
// TARGET CONTRACT
// =============================================================================

/// Anything exposing named, externally writable slots.
///
/// UI adapters implement this to turn slot writes into attribute sets;
/// they are also responsible for feeding native events back into the
/// model's write path. Both directions stay outside the core.
pub trait BindingTarget {
    fn write_slot(&self, slot: &str, value: Value);
}

/// Optional value transform applied before the target sees the value.
pub type TransformFn = Rc<dyn Fn(&Value) -> Value>;

/// Unbind token returned from `bind`. Stable for the binding's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

// =============================================================================
// SINKS
// =============================================================================

pub(crate) enum Sink {
    /// Write into a weakly held external target's named slot.
    Slot {
        target: Weak<dyn BindingTarget>,
        slot: String,
    },
    /// Apply a write through a shared re-entrancy guard. Used for the two
    /// halves of a bidirectional pair; `apply` writes into the far object
    /// and is skipped while the opposite direction holds the guard.
    Guarded {
        apply: Rc<dyn Fn(&Value)>,
        guard: Rc<Cell<bool>>,
    },
}

struct BindingEntry {
    id: BindingId,
    source: String,
    sink: Sink,
    transform: Option<TransformFn>,
}

impl BindingEntry {
    fn is_dead(&self) -> bool {
        match &self.sink {
            Sink::Slot { target, .. } => target.strong_count() == 0,
            Sink::Guarded { .. } => false,
        }
    }
}

fn push_value(sink: &Sink, transform: Option<&TransformFn>, value: &Value) {
    let transformed;
    let outgoing = match transform {
        Some(f) => {
            transformed = f(value);
            &transformed
        }
        None => value,
    };

    match sink {
        Sink::Slot { target, slot } => {
            if let Some(target) = target.upgrade() {
                target.write_slot(slot, outgoing.clone());
            }
        }
        Sink::Guarded { apply, guard } => {
            if guard.get() {
                return;
            }
            guard.set(true);
            let _reset = GuardReset(guard.clone());
            apply(outgoing);
        }
    }
}

/// Clears the re-entrancy flag even if the far side panics.
struct GuardReset(Rc<Cell<bool>>);

impl Drop for GuardReset {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Per-object table of bindings, keyed by source property.
#[derive(Default)]
pub(crate) struct BindingRegistry {
    entries: RefCell<Vec<BindingEntry>>,
    next_id: Cell<u64>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, source: &str, sink: Sink, transform: Option<TransformFn>) -> BindingId {
        let id = BindingId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(BindingEntry {
            id,
            source: source.to_owned(),
            sink,
            transform,
        });
        id
    }

    /// Remove one binding. Idempotent: removing an unknown or already
    /// removed id is a no-op returning false.
    pub fn remove(&self, id: BindingId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Push `value` into every binding whose source is `source`, then prune
    /// targets that have been dropped.
    pub fn notify(&self, source: &str, value: &Value) {
        // Collect first, push after: the far side of a guarded sink may
        // re-enter and mutate the table under us.
        let matching: Vec<(Sink, Option<TransformFn>)> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.source == source)
            .map(|entry| (clone_sink(&entry.sink), entry.transform.clone()))
            .collect();

        for (sink, transform) in &matching {
            push_value(sink, transform.as_ref(), value);
        }

        self.entries.borrow_mut().retain(|entry| !entry.is_dead());
    }

    /// Initial sync of one freshly added binding.
    pub fn sync_one(&self, id: BindingId, value: &Value) {
        let entry = {
            let entries = self.entries.borrow();
            entries
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| (clone_sink(&entry.sink), entry.transform.clone()))
        };
        if let Some((sink, transform)) = entry {
            push_value(&sink, transform.as_ref(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

fn clone_sink(sink: &Sink) -> Sink {
    match sink {
        Sink::Slot { target, slot } => Sink::Slot {
            target: target.clone(),
            slot: slot.clone(),
        },
        Sink::Guarded { apply, guard } => Sink::Guarded {
            apply: apply.clone(),
            guard: guard.clone(),
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================
