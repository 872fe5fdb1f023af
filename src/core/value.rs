// ============================================================================
// reactive-model - Value
// Dynamic property values and the change-detection equality rule
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// VALUE
// =============================================================================

/// A dynamically typed property value.
///
/// Every declared property on a [`crate::ReactiveObject`] holds one of these.
/// Containers (`List`, `Record`) are reference-counted and compared by
/// *identity*, not contents - replacing the whole container is what triggers
/// reactivity, mutating it in place does not (and is not possible through
/// the public API, since containers are shared immutably).
///
/// # Example
///
/// ```
/// use reactive_model::Value;
///
/// let a = Value::from("hello");
/// let b = Value::from(42);
/// assert_eq!(a.as_str(), Some("hello"));
/// assert_eq!(b.as_int(), Some(42));
/// ```
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<Vec<Value>>),
    Record(Rc<BTreeMap<String, Value>>),
}

impl Value {
    /// Build a list value from an iterator of values.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(items.into_iter().collect()))
    }

    /// Build a record value from `(key, value)` pairs.
    pub fn record(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Record(Rc::new(fields.into_iter().collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<Vec<Value>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Rc<BTreeMap<String, Value>>> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// The change-detection equality rule.
    ///
    /// Primitives compare by value (floats treat NaN == NaN so repeated NaN
    /// writes don't retrigger propagation), strings by contents, and
    /// containers by pointer identity. Two distinct `List` allocations with
    /// equal contents are **not** equal - that is the "replace the whole
    /// container to trigger reactivity" policy.
    pub fn identity_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                if a.is_nan() {
                    b.is_nan()
                } else {
                    a == b
                }
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    // =========================================================================
    // JSON CONVERSION (persistence snapshots)
    // =========================================================================

    /// Convert to a `serde_json::Value` for the persistence snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => {
                // JSON has no NaN/inf; persist them as null
                serde_json::Number::from_f64(*f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Rebuild a value from a persisted `serde_json::Value`.
    ///
    /// Containers come back as fresh allocations, so a loaded value is never
    /// identity-equal to the default it replaces - which is exactly right,
    /// since load goes through the normal change-detection path.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::list(items.iter().map(Value::from_json)),
            serde_json::Value::Object(fields) => Value::record(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v))),
            ),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Record(fields) => f.debug_map().entries(fields.iter()).finish(),
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_value() {
        assert!(Value::from(42).identity_eq(&Value::from(42)));
        assert!(!Value::from(42).identity_eq(&Value::from(43)));
        assert!(Value::from("a").identity_eq(&Value::from("a")));
        assert!(!Value::from("a").identity_eq(&Value::from("b")));
        assert!(Value::Null.identity_eq(&Value::Null));
        assert!(!Value::Null.identity_eq(&Value::from(0)));
    }

    #[test]
    fn nan_equals_nan() {
        let nan = Value::from(f64::NAN);
        assert!(nan.identity_eq(&Value::from(f64::NAN)));
        assert!(!nan.identity_eq(&Value::from(1.0)));
        assert!(!Value::from(1.0).identity_eq(&nan));
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = Value::list([Value::from(1), Value::from(2)]);
        let b = Value::list([Value::from(1), Value::from(2)]);

        // Equal contents, different allocations: NOT equal
        assert!(!a.identity_eq(&b));

        // Same allocation: equal
        let a2 = a.clone();
        assert!(a.identity_eq(&a2));
    }

    #[test]
    fn records_compare_by_identity() {
        let a = Value::record([("done".to_owned(), Value::from(false))]);
        let b = Value::record([("done".to_owned(), Value::from(false))]);
        assert!(!a.identity_eq(&b));
        assert!(a.identity_eq(&a.clone()));
    }

    #[test]
    fn cross_type_never_equal() {
        assert!(!Value::from(1).identity_eq(&Value::from(1.0)));
        assert!(!Value::from(true).identity_eq(&Value::from(1)));
    }

    #[test]
    fn json_round_trip() {
        let v = Value::list([
            Value::record([
                ("text".to_owned(), Value::from("learn")),
                ("done".to_owned(), Value::from(false)),
            ]),
            Value::from(3),
        ]);

        let json = v.to_json();
        let back = Value::from_json(&json);

        // Identity is lost through JSON (fresh allocations)...
        assert!(!v.identity_eq(&back));

        // ...but structure survives
        let items = back.as_list().unwrap();
        assert_eq!(items.len(), 2);
        let first = items[0].as_record().unwrap();
        assert_eq!(first.get("text").and_then(Value::as_str), Some("learn"));
        assert_eq!(items[1].as_int(), Some(3));
    }

    #[test]
    fn non_finite_floats_persist_as_null() {
        assert_eq!(Value::from(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(
            Value::from(f64::INFINITY).to_json(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7).as_float(), Some(7.0));
        assert_eq!(Value::from(2.5).as_float(), Some(2.5));
        assert!(Value::from(1).as_str().is_none());
        assert!(Value::Null.is_null());
    }
}
