// ============================================================================
// reactive-model - Schema
// Property descriptors, the schema builder, and the compute-function contract
// ============================================================================
//
// A schema is the static definition of a reactive type: which properties
// exist, which are stored (with defaults) and which are computed (with an
// explicit dependency list and a pure compute function). Schemas are
// immutable and shared across instances via Rc - type identity is decoupled
// from any one object.
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::reactivity::graph::DepGraph;

// =============================================================================
// COMPUTE CONTRACT
// =============================================================================

/// Read-only view of an instance's current values, handed to compute
/// functions. A compute observes fully settled state and cannot write.
pub struct PropertyView<'a> {
    values: &'a HashMap<String, Value>,
}

impl<'a> PropertyView<'a> {
    pub(crate) fn new(values: &'a HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// Get a property's current value, if declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a property's current value, cloning. `Null` if undeclared.
    pub fn value(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Null)
    }

    /// String content of a property; empty if absent or not a string.
    pub fn str(&self, name: &str) -> &str {
        self.values
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Integer content of a property; 0 if absent or not an integer.
    pub fn int(&self, name: &str) -> i64 {
        self.values.get(name).and_then(Value::as_int).unwrap_or(0)
    }

    /// Float content of a property; 0.0 if absent or not numeric.
    pub fn float(&self, name: &str) -> f64 {
        self.values
            .get(name)
            .and_then(Value::as_float)
            .unwrap_or(0.0)
    }

    /// Boolean content of a property; false if absent or not a bool.
    pub fn bool(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// List content of a property; empty slice if absent or not a list.
    pub fn list(&self, name: &str) -> &[Value] {
        self.values
            .get(name)
            .and_then(Value::as_list)
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }
}

/// A computed property's pure function: current values in, new value out.
/// The `Err` string becomes [`Error::ComputeFailed`] at the call site.
pub type ComputeFn = Rc<dyn Fn(&PropertyView<'_>) -> std::result::Result<Value, String>>;

// =============================================================================
// PROPERTY SPEC
// =============================================================================

/// Static definition of a single property.
#[derive(Clone)]
pub enum PropertySpec {
    /// Independently assignable value with a default. `persist: false`
    /// opts the property out of persistence snapshots.
    Stored { default: Value, persist: bool },

    /// Derived value: recomputed from `deps` whenever any of them changes.
    Computed { deps: Vec<String>, compute: ComputeFn },
}

impl PropertySpec {
    pub fn is_computed(&self) -> bool {
        matches!(self, PropertySpec::Computed { .. })
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// The immutable property table for a reactive type, plus the dependency
/// graph derived once from the declared `deps` lists.
pub struct Schema {
    props: HashMap<String, PropertySpec>,
    /// Declaration order - drives deterministic initialization.
    order: Vec<String>,
    graph: DepGraph,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// Start declaring a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up a property's spec.
    pub fn spec(&self, name: &str) -> Option<&PropertySpec> {
        self.props.get(name)
    }

    /// Whether `name` is declared at all.
    pub fn is_declared(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Whether `name` is declared as computed.
    pub fn is_computed(&self, name: &str) -> bool {
        matches!(self.props.get(name), Some(PropertySpec::Computed { .. }))
    }

    /// Declared dependency list of a computed property; empty for stored.
    pub fn deps_of(&self, name: &str) -> &[String] {
        match self.props.get(name) {
            Some(PropertySpec::Computed { deps, .. }) => deps,
            _ => &[],
        }
    }

    /// All property names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// The `source -> dependent computed` graph.
    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    /// Topological order over all computed properties, dependencies first.
    ///
    /// Used for the initial settle at construction so every compute observes
    /// fully initialized dependency values. Fails with `CyclicDependency` if
    /// the computed properties form a cycle - declaring the edges never
    /// checks, the error surfaces here or during a propagation pass.
    pub fn settle_order(&self) -> Result<Vec<String>> {
        let mut order = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut visiting: HashSet<&str> = HashSet::new();

        for name in &self.order {
            if self.is_computed(name) {
                self.settle_visit(name, &mut done, &mut visiting, &mut order)?;
            }
        }
        Ok(order)
    }

    fn settle_visit<'a>(
        &'a self,
        name: &'a str,
        done: &mut HashSet<&'a str>,
        visiting: &mut HashSet<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if !visiting.insert(name) {
            return Err(Error::CyclicDependency(name.to_owned()));
        }
        for dep in self.deps_of(name) {
            if self.is_computed(dep) {
                self.settle_visit(dep, done, visiting, order)?;
            }
        }
        visiting.remove(name);
        done.insert(name);
        order.push(name.to_owned());
        Ok(())
    }
}

// =============================================================================
// SCHEMA BUILDER
// =============================================================================

/// Declares properties and produces an immutable, shareable [`Schema`].
///
/// # Example
///
/// ```
/// use reactive_model::{Schema, Value};
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
/// assert!(schema.is_computed("fullName"));
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    props: Vec<(String, PropertySpec)>,
}

impl SchemaBuilder {
    /// Declare a stored property with a default value.
    pub fn stored(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.props.push((
            name.to_owned(),
            PropertySpec::Stored {
                default: default.into(),
                persist: true,
            },
        ));
        self
    }

    /// Declare a stored property that is excluded from persistence snapshots.
    pub fn stored_transient(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.props.push((
            name.to_owned(),
            PropertySpec::Stored {
                default: default.into(),
                persist: false,
            },
        ));
        self
    }

    /// Declare a computed property with an infallible compute function.
    pub fn computed(
        self,
        name: &str,
        deps: &[&str],
        compute: impl Fn(&PropertyView<'_>) -> Value + 'static,
    ) -> Self {
        self.try_computed(name, deps, move |view| Ok(compute(view)))
    }

    /// Declare a computed property whose compute function can fail.
    /// The error string surfaces as [`Error::ComputeFailed`].
    pub fn try_computed(
        mut self,
        name: &str,
        deps: &[&str],
        compute: impl Fn(&PropertyView<'_>) -> std::result::Result<Value, String> + 'static,
    ) -> Self {
        self.props.push((
            name.to_owned(),
            PropertySpec::Computed {
                deps: deps.iter().map(|d| (*d).to_owned()).collect(),
                compute: Rc::new(compute),
            },
        ));
        self
    }

    /// Validate the declarations and derive the dependency graph.
    ///
    /// Every `deps` entry must name a declared property (stored or
    /// computed); an unknown name is an [`Error::InvalidProperty`].
    /// Redeclaring a name replaces the earlier declaration, matching
    /// object-literal semantics in the schema tables this design comes from.
    pub fn build(self) -> Result<Rc<Schema>> {
        let mut props: HashMap<String, PropertySpec> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for (name, spec) in self.props {
            if props.insert(name.clone(), spec).is_none() {
                order.push(name);
            }
        }

        let mut graph = DepGraph::new();
        for name in &order {
            if let Some(PropertySpec::Computed { deps, .. }) = props.get(name) {
                for dep in deps {
                    if !props.contains_key(dep) {
                        return Err(Error::InvalidProperty(dep.clone()));
                    }
                    graph.add_edge(dep, name);
                }
            }
        }

        Ok(Rc::new(Schema { props, order, graph }))
    }
}

// =============================================================================
// TESTS
// =============================================================================
