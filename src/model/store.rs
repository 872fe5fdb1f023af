// ============================================================================
// reactive-model - Property Store
// Current values for every declared property, plus the write/restore paths
// ============================================================================
//
// The store owns the value map and enforces the schema-level rules: unknown
// names are rejected, computed properties are read-only from outside, and a
// write that does not change the value (under identity equality) is a no-op
// that produces neither history nor propagation. Reads never trigger
// computation - computed values are cached by propagation, not pulled lazily.
// ============================================================================

use std::collections::HashMap;
use std::rc::Rc;

use std::cell::RefCell;

use crate::core::error::{Error, Result};
use crate::core::schema::{PropertySpec, PropertyView, Schema};
use crate::core::value::Value;

/// Outcome of a stored-property write, consumed by the reactive object to
/// drive history and propagation.
#[derive(Debug)]
pub enum WriteOutcome {
    /// New value was identity-equal to the current one; nothing happened.
    Unchanged,
    /// Value was replaced; `old` feeds the history log.
    Changed { old: Value },
}

impl WriteOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, WriteOutcome::Changed { .. })
    }
}

/// Holds current values for stored and computed properties of one instance.
pub struct PropertyStore {
    schema: Rc<Schema>,
    values: RefCell<HashMap<String, Value>>,
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("schema", &self.schema)
            .field("values", &self.values)
            .finish()
    }
}

impl PropertyStore {
    /// Initialize from a schema: every stored property gets its default,
    /// every computed property is settled once in dependency order so each
    /// compute observes fully initialized values.
    pub fn new(schema: Rc<Schema>) -> Result<Self> {
        let mut values: HashMap<String, Value> = HashMap::new();
        for name in schema.names() {
            match schema.spec(name) {
                Some(PropertySpec::Stored { default, .. }) => {
                    values.insert(name.to_owned(), default.clone());
                }
                Some(PropertySpec::Computed { .. }) => {
                    // Placeholder until the initial settle below
                    values.insert(name.to_owned(), Value::Null);
                }
                None => unreachable!("schema names() only yields declared properties"),
            }
        }

        let store = Self {
            schema: schema.clone(),
            values: RefCell::new(values),
        };

        for name in schema.settle_order()? {
            store.recompute(&name)?;
        }
        Ok(store)
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    /// Current value of a declared property. Never computes.
    pub fn read(&self, name: &str) -> Result<Value> {
        self.values
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidProperty(name.to_owned()))
    }

    /// Write a stored property. Equal values (identity rule) are a no-op.
    pub fn write(&self, name: &str, value: Value) -> Result<WriteOutcome> {
        match self.schema.spec(name) {
            None => return Err(Error::InvalidProperty(name.to_owned())),
            Some(PropertySpec::Computed { .. }) => {
                return Err(Error::ComputedPropertyReadOnly(name.to_owned()));
            }
            Some(PropertySpec::Stored { .. }) => {}
        }

        let mut values = self.values.borrow_mut();
        let current = values
            .get(name)
            .expect("declared property present after initialization");
        if current.identity_eq(&value) {
            return Ok(WriteOutcome::Unchanged);
        }

        let old = values
            .insert(name.to_owned(), value)
            .expect("declared property present after initialization");
        Ok(WriteOutcome::Changed { old })
    }

    /// Put a value back without the change-signal path. Used by undo/redo
    /// and persistence load, which manage history and propagation themselves.
    pub fn restore(&self, name: &str, value: Value) -> Result<()> {
        match self.schema.spec(name) {
            None => Err(Error::InvalidProperty(name.to_owned())),
            Some(PropertySpec::Computed { .. }) => {
                Err(Error::ComputedPropertyReadOnly(name.to_owned()))
            }
            Some(PropertySpec::Stored { .. }) => {
                self.values.borrow_mut().insert(name.to_owned(), value);
                Ok(())
            }
        }
    }

    /// Re-evaluate a computed property against current values.
    ///
    /// Returns the new value if it differs from the cached one under
    /// identity equality, `None` if it settled unchanged.
    pub fn recompute(&self, name: &str) -> Result<Option<Value>> {
        let compute = match self.schema.spec(name) {
            Some(PropertySpec::Computed { compute, .. }) => compute.clone(),
            Some(PropertySpec::Stored { .. }) => {
                return Err(Error::ComputedPropertyReadOnly(name.to_owned()));
            }
            None => return Err(Error::InvalidProperty(name.to_owned())),
        };

        let next = {
            let values = self.values.borrow();
            let view = PropertyView::new(&values);
            compute(&view).map_err(|reason| Error::ComputeFailed {
                property: name.to_owned(),
                reason,
            })?
        };

        let mut values = self.values.borrow_mut();
        let current = values
            .get(name)
            .expect("declared property present after initialization");
        if current.identity_eq(&next) {
            return Ok(None);
        }
        values.insert(name.to_owned(), next.clone());
        Ok(Some(next))
    }

    /// Run a closure against the read-only property view.
    pub fn with_view<R>(&self, f: impl FnOnce(&PropertyView<'_>) -> R) -> R {
        let values = self.values.borrow();
        f(&PropertyView::new(&values))
    }

    /// Stored, persistence-eligible properties and their current values,
    /// in declaration order. The persistence snapshot is built from this.
    pub fn persisted_values(&self) -> Vec<(String, Value)> {
        let values = self.values.borrow();
        self.schema
            .names()
            .filter(|name| {
                matches!(
                    self.schema.spec(name),
                    Some(PropertySpec::Stored { persist: true, .. })
                )
            })
            .map(|name| {
                (
                    name.to_owned(),
                    values.get(name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
