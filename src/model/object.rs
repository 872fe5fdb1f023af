// ============================================================================
// reactive-model - Reactive Object
// The composition root: store + graph + bindings + history + lifecycle
// ============================================================================
//
// A ReactiveObject is a cheap Clone handle over shared instance state, like
// a signal handle. Lifecycle: Constructing (store initialized, computed
// properties settled) -> Live (reads/writes, binds, freeze/thaw, undo/redo)
// -> Disposed (terminal: bindings cleared, mutation rejected, reads still
// answered from the last settled values).
//
// Everything is synchronous and single-threaded: a write returns only after
// its whole cascade - recomputes, binding notifications, persistence save -
// has completed, so observers always see fully settled state.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::core::error::{Error, Result};
use crate::core::schema::Schema;
use crate::core::value::Value;
use crate::model::bindings::{BindingId, BindingRegistry, BindingTarget, Sink, TransformFn};
use crate::model::history::{Action, HistoryLog};
use crate::model::store::{PropertyStore, WriteOutcome};
use crate::persist::{decode_snapshot, encode_snapshot, Storage};
use crate::reactivity::propagation;

// =============================================================================
// SHARED INSTANCE STATE
// =============================================================================

struct Persistence {
    key: String,
    storage: Rc<dyn Storage>,
}

pub(crate) struct ObjectInner {
    store: PropertyStore,
    bindings: BindingRegistry,
    history: HistoryLog,
    frozen_depth: Cell<u32>,
    /// Stored names changed while frozen, insertion-ordered, deduped.
    pending: RefCell<Vec<String>>,
    disposed: Cell<bool>,
    persistence: RefCell<Option<Persistence>>,
}

impl ObjectInner {
    /// The full stored-property write path: change detection, history,
    /// propagation (or deferral while frozen), persistence.
    fn write_value(&self, name: &str, value: Value) -> Result<bool> {
        if self.disposed.get() {
            return Err(Error::Disposed);
        }

        let outcome = self.store.write(name, value)?;
        let old = match outcome {
            WriteOutcome::Unchanged => return Ok(false),
            WriteOutcome::Changed { old } => old,
        };

        tracing::debug!(property = name, "stored property changed");
        let new_value = self.store.read(name)?;
        self.history.record(Action {
            property: name.to_owned(),
            old_value: old,
            new_value,
        });

        if self.frozen_depth.get() > 0 {
            self.mark_pending(name);
        } else {
            self.propagate_from(&[name.to_owned()])?;
            self.save_if_persistent();
        }
        Ok(true)
    }

    fn mark_pending(&self, name: &str) {
        let mut pending = self.pending.borrow_mut();
        if !pending.iter().any(|p| p == name) {
            pending.push(name.to_owned());
        }
    }

    /// One settled propagation pass from the given seed stored properties.
    ///
    /// Computed dependents recompute at most once each, dependencies before
    /// dependents, and a binding only ever sees a final value. After the
    /// cascade, each seed's own bindings are notified. A failing compute
    /// aborts the pass; dependents settled earlier keep their new values.
    fn propagate_from(&self, seeds: &[String]) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }

        let plan = propagation::plan(self.store.schema().graph(), seeds)?;
        let mut changed: HashSet<String> = seeds.iter().cloned().collect();

        for prop in &plan {
            let deps = self.store.schema().deps_of(prop);
            if !deps.iter().any(|d| changed.contains(d)) {
                // No changed input reached this branch; leave it settled
                continue;
            }
            if let Some(new_value) = self.store.recompute(prop)? {
                changed.insert(prop.clone());
                self.bindings.notify(prop, &new_value);
            }
        }

        for seed in seeds {
            let value = self.store.read(seed)?;
            self.bindings.notify(seed, &value);
        }
        Ok(())
    }

    /// Save a snapshot if persistence is configured. Failures are reported,
    /// never propagated - the in-memory write already succeeded.
    fn save_if_persistent(&self) {
        if let Err(e) = self.try_save() {
            tracing::warn!(error = %e, "failed to persist state");
        }
    }

    fn try_save(&self) -> Result<()> {
        let persistence = self.persistence.borrow();
        let Some(p) = persistence.as_ref() else {
            return Ok(());
        };
        if self.frozen_depth.get() > 0 || self.disposed.get() {
            return Ok(());
        }
        p.storage.set(&p.key, &encode_snapshot(&self.store))
    }
}

// =============================================================================
// REACTIVE OBJECT
// =============================================================================

/// A schema-driven reactive instance.
///
/// # Example
///
/// ```
/// use reactive_model::{ReactiveObject, Schema, Value};
///
/// let schema = Schema::builder()
///     .stored("firstName", "Ada")
///     .stored("lastName", "Lovelace")
///     .computed("fullName", &["firstName", "lastName"], |v| {
///         Value::from(format!("{} {}", v.str("firstName"), v.str("lastName")))
///     })
///     .build()
///     .unwrap();
///
/// let user = ReactiveObject::new(schema).unwrap();
/// assert_eq!(user.get("fullName").unwrap().as_str(), Some("Ada Lovelace"));
///
/// user.set("firstName", "Grace").unwrap();
/// assert_eq!(user.get("fullName").unwrap().as_str(), Some("Grace Lovelace"));
/// ```
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Rc<ObjectInner>,
}

impl std::fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveObject").finish_non_exhaustive()
    }
}

impl ReactiveObject {
    /// Construct a live instance: stored defaults applied, computed
    /// properties settled once in dependency order.
    pub fn new(schema: Rc<Schema>) -> Result<Self> {
        Ok(Self {
            inner: Rc::new(ObjectInner {
                store: PropertyStore::new(schema)?,
                bindings: BindingRegistry::new(),
                history: HistoryLog::new(),
                frozen_depth: Cell::new(0),
                pending: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
                persistence: RefCell::new(None),
            }),
        })
    }

    /// Construct an instance backed by a storage collaborator.
    ///
    /// Any snapshot stored under `key` is applied inside a freeze/thaw
    /// batch through the history-free restore path, so load produces one
    /// settled propagation and no undo entries. A missing key means fresh
    /// defaults; a malformed snapshot is a `PersistenceFailure`. Every
    /// settled propagation afterwards writes a new snapshot.
    pub fn with_persistence(
        schema: Rc<Schema>,
        key: &str,
        storage: Rc<dyn Storage>,
    ) -> Result<Self> {
        let object = Self::new(schema)?;

        let loaded = match storage.get(key)? {
            Some(raw) => decode_snapshot(&raw)?,
            None => Vec::new(),
        };

        object.freeze();
        for (name, value) in loaded {
            // Snapshots may predate the current schema; unknown or
            // no-longer-stored names are skipped
            let schema = object.inner.store.schema();
            if !schema.is_declared(&name) || schema.is_computed(&name) {
                tracing::debug!(property = %name, "skipping stale persisted property");
                continue;
            }
            object.inner.store.restore(&name, value)?;
            object.inner.mark_pending(&name);
        }

        *object.inner.persistence.borrow_mut() = Some(Persistence {
            key: key.to_owned(),
            storage,
        });
        object.thaw()?;
        Ok(object)
    }

    pub fn schema(&self) -> Rc<Schema> {
        self.inner.store.schema().clone()
    }

    // =========================================================================
    // READS / WRITES
    // =========================================================================

    /// Current value of a declared property. Never computes; allowed even
    /// after dispose (inspection stays cheap and safe).
    pub fn get(&self, name: &str) -> Result<Value> {
        self.inner.store.read(name)
    }

    /// Write a stored property.
    ///
    /// `Ok(false)` means the value was identity-equal to the current one:
    /// no history entry, no propagation, no binding fires. `Ok(true)` means
    /// the value changed and - unless frozen - the whole cascade has
    /// settled by the time this returns.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<bool> {
        self.inner.write_value(name, value.into())
    }

    // =========================================================================
    // FREEZE / THAW
    // =========================================================================

    /// Enter batched mode. Nested: propagation resumes only when every
    /// freeze has been matched by a thaw.
    pub fn freeze(&self) {
        self.inner.frozen_depth.set(self.inner.frozen_depth.get() + 1);
    }

    /// Leave batched mode. The outermost thaw runs one combined propagation
    /// pass over every property changed while frozen (deduped, insertion
    /// order), then saves once. Unbalanced thaws are a no-op.
    pub fn thaw(&self) -> Result<()> {
        let depth = self.inner.frozen_depth.get();
        if depth == 0 {
            return Ok(());
        }
        self.inner.frozen_depth.set(depth - 1);
        if depth > 1 {
            return Ok(());
        }

        let seeds: Vec<String> = std::mem::take(&mut *self.inner.pending.borrow_mut());
        if seeds.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = seeds.len(), "thaw flush");
        self.inner.propagate_from(&seeds)?;
        self.inner.save_if_persistent();
        Ok(())
    }

    /// Run `f` between a freeze and a thaw. If `f` panics the depth counter
    /// still unwinds; pending changes flush on the next outermost thaw.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        self.freeze();

        struct DepthGuard<'a>(&'a ReactiveObject, bool);
        impl Drop for DepthGuard<'_> {
            fn drop(&mut self) {
                if self.1 {
                    let depth = self.0.inner.frozen_depth.get();
                    self.0.inner.frozen_depth.set(depth.saturating_sub(1));
                }
            }
        }

        let mut guard = DepthGuard(self, true);
        let out = f();
        guard.1 = false;
        self.thaw()?;
        Ok(out)
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen_depth.get() > 0
    }

    // =========================================================================
    // BINDINGS
    // =========================================================================

    /// Bind `source` to `slot` on an external target, with an immediate
    /// synchronous initial sync. The target is held weakly.
    pub fn bind<T: BindingTarget + 'static>(
        &self,
        source: &str,
        target: &Rc<T>,
        slot: &str,
    ) -> Result<BindingId> {
        self.bind_sink(source, slot_sink(target, slot), None)
    }

    /// Like [`bind`](Self::bind), with a transform applied before the
    /// target sees the value.
    pub fn bind_map<T: BindingTarget + 'static>(
        &self,
        source: &str,
        target: &Rc<T>,
        slot: &str,
        transform: impl Fn(&Value) -> Value + 'static,
    ) -> Result<BindingId> {
        self.bind_sink(source, slot_sink(target, slot), Some(Rc::new(transform)))
    }

    fn bind_sink(
        &self,
        source: &str,
        sink: Sink,
        transform: Option<TransformFn>,
    ) -> Result<BindingId> {
        if self.inner.disposed.get() {
            return Err(Error::Disposed);
        }
        let initial = self.inner.store.read(source)?;
        let id = self.inner.bindings.add(source, sink, transform);
        self.inner.bindings.sync_one(id, &initial);
        Ok(id)
    }

    /// Remove one binding. Idempotent.
    pub fn unbind(&self, id: BindingId) -> bool {
        self.inner.bindings.remove(id)
    }

    /// Link `prop_a` on this object with `prop_b` on `other` in both
    /// directions. Both properties must be stored. A shared re-entrancy
    /// guard keeps a forward write from re-triggering the backward path and
    /// vice versa. The initial sync runs forward only: at link time, this
    /// object is the source of truth.
    pub fn bind_bidirectional(
        &self,
        prop_a: &str,
        other: &ReactiveObject,
        prop_b: &str,
    ) -> Result<TwoWayBinding> {
        self.bind_bidirectional_map(prop_a, other, prop_b, |v| v.clone(), |v| v.clone())
    }

    /// [`bind_bidirectional`](Self::bind_bidirectional) with transforms for
    /// each direction.
    pub fn bind_bidirectional_map(
        &self,
        prop_a: &str,
        other: &ReactiveObject,
        prop_b: &str,
        forward: impl Fn(&Value) -> Value + 'static,
        backward: impl Fn(&Value) -> Value + 'static,
    ) -> Result<TwoWayBinding> {
        if self.inner.disposed.get() || other.inner.disposed.get() {
            return Err(Error::Disposed);
        }
        require_stored(self.inner.store.schema(), prop_a)?;
        require_stored(other.inner.store.schema(), prop_b)?;

        let guard = Rc::new(Cell::new(false));

        let backward_id = other.inner.bindings.add(
            prop_b,
            object_sink(Rc::downgrade(&self.inner), prop_a, guard.clone()),
            Some(Rc::new(backward)),
        );
        let forward_id = self.inner.bindings.add(
            prop_a,
            object_sink(Rc::downgrade(&other.inner), prop_b, guard.clone()),
            Some(Rc::new(forward)),
        );

        // Forward-only initial sync, under the guard like any other write
        let initial = self.inner.store.read(prop_a)?;
        self.inner.bindings.sync_one(forward_id, &initial);

        Ok(TwoWayBinding {
            forward: (Rc::downgrade(&self.inner), forward_id),
            backward: (Rc::downgrade(&other.inner), backward_id),
        })
    }

    /// Remove both directions of a two-way pair. Idempotent.
    pub fn unbind_bidirectional(&self, token: &TwoWayBinding) -> bool {
        let mut removed = false;
        if let Some(inner) = token.forward.0.upgrade() {
            removed |= inner.bindings.remove(token.forward.1);
        }
        if let Some(inner) = token.backward.0.upgrade() {
            removed |= inner.bindings.remove(token.backward.1);
        }
        removed
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    /// Revert the most recent stored-property write. `Ok(false)` when the
    /// history is empty. The restore does not log a new action; the entry
    /// moves to the redo stack and the change propagates normally.
    pub fn undo(&self) -> Result<bool> {
        if self.inner.disposed.get() {
            return Err(Error::Disposed);
        }
        let Some(action) = self.inner.history.pop_for_undo() else {
            return Ok(false);
        };
        tracing::debug!(property = %action.property, "undo");
        self.apply_history(&action.property, action.old_value)?;
        Ok(true)
    }

    /// Replay the most recently undone write. Mirror of [`undo`](Self::undo).
    pub fn redo(&self) -> Result<bool> {
        if self.inner.disposed.get() {
            return Err(Error::Disposed);
        }
        let Some(action) = self.inner.history.pop_for_redo() else {
            return Ok(false);
        };
        tracing::debug!(property = %action.property, "redo");
        self.apply_history(&action.property, action.new_value)?;
        Ok(true)
    }

    fn apply_history(&self, property: &str, value: Value) -> Result<()> {
        self.inner.store.restore(property, value)?;
        if self.inner.frozen_depth.get() > 0 {
            self.inner.mark_pending(property);
        } else {
            self.inner.propagate_from(&[property.to_owned()])?;
            self.inner.save_if_persistent();
        }
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.inner.history.len()
    }

    /// Drop all undo/redo state.
    pub fn clear_history(&self) {
        self.inner.history.clear();
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Write a snapshot now, surfacing any storage failure. The automatic
    /// after-propagation saves only log failures.
    pub fn persist(&self) -> Result<()> {
        self.inner.try_save()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Terminal transition: clears all bindings and rejects further
    /// mutation. Reads stay available. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        tracing::debug!("dispose");
        self.inner.bindings.clear();
        self.inner.pending.borrow_mut().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

/// Unbind token for a bidirectional pair; holds both directions so they are
/// removed together.
pub struct TwoWayBinding {
    forward: (Weak<ObjectInner>, BindingId),
    backward: (Weak<ObjectInner>, BindingId),
}

// =============================================================================
// SINK CONSTRUCTORS
// =============================================================================

fn slot_sink<T: BindingTarget + 'static>(target: &Rc<T>, slot: &str) -> Sink {
    let weak = Rc::downgrade(target);
    let weak: Weak<dyn BindingTarget> = weak;
    Sink::Slot {
        target: weak,
        slot: slot.to_owned(),
    }
}

/// A sink that writes into another reactive object's stored property
/// through the full write path, guarded against mutual recursion. A dead
/// or rejecting far object is logged and skipped, never an error here.
fn object_sink(object: Weak<ObjectInner>, property: &str, guard: Rc<Cell<bool>>) -> Sink {
    let property = property.to_owned();
    Sink::Guarded {
        apply: Rc::new(move |value: &Value| {
            let Some(inner) = object.upgrade() else {
                return;
            };
            if let Err(e) = inner.write_value(&property, value.clone()) {
                tracing::warn!(property = %property, error = %e, "two-way binding write rejected");
            }
        }),
        guard,
    }
}

fn require_stored(schema: &Rc<Schema>, name: &str) -> Result<()> {
    if !schema.is_declared(name) {
        return Err(Error::InvalidProperty(name.to_owned()));
    }
    if schema.is_computed(name) {
        return Err(Error::ComputedPropertyReadOnly(name.to_owned()));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
