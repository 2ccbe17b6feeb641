#![forbid(unsafe_code)]

//! The closed set of values an entry can hold.
//!
//! Equality between values is *strict*: primitives compare by value with
//! IEEE semantics (`NaN` differs from itself, `0.0` equals `-0.0`, integers
//! and floats compare numerically), containers compare by identity. This is
//! the comparison an accessor uses to decide whether a write changes
//! anything.

use crate::container::{Container, ContainerKind};

/// A non-container value.
#[derive(Debug, Clone, Default)]
pub enum Primitive {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Primitive {
    /// Name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    #[must_use]
    pub fn strict_eq(&self, other: &Primitive) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => {
                int_eq_float(*i, *f)
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Exact numeric equality: `f` must be integral, inside the `i64` range,
/// and equal to `i` without rounding either side.
#[allow(clippy::cast_possible_truncation)]
fn int_eq_float(i: i64, f: f64) -> bool {
    // -2^63 and 2^63, both exact in f64.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (LOWER..UPPER).contains(&f) && f as i64 == i
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

/// Value held by an entry: a primitive or a shared container handle.
///
/// Cloning a `Value::Container` clones the handle; both clones refer to the
/// same container.
#[derive(Debug, Clone)]
pub enum Value {
    Primitive(Primitive),
    Container(Container),
}

impl Value {
    #[must_use]
    pub fn null() -> Self {
        Self::Primitive(Primitive::Null)
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    #[must_use]
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(container) => Some(container),
            Self::Primitive(_) => None,
        }
    }

    #[must_use]
    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(primitive) => Some(primitive),
            Self::Container(_) => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Primitive(Primitive::Int(i)) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Primitive(Primitive::Float(f)) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Primitive(Primitive::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Primitive(Primitive::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Primitive(Primitive::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// `"list"`, `"map"` or the primitive's type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Primitive(primitive) => primitive.type_name(),
            Self::Container(container) => match container.kind() {
                ContainerKind::List => "list",
                ContainerKind::Map => "map",
            },
        }
    }

    #[must_use]
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a.strict_eq(b),
            (Self::Container(a), Self::Container(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Build an unobserved tree from JSON.
    ///
    /// Arrays become lists, objects become maps in document order, integers
    /// that fit `i64` become [`Primitive::Int`] and every other number a
    /// [`Primitive::Float`].
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::null(),
            serde_json::Value::Bool(b) => Self::from(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::from(i),
                None => n
                    .as_f64()
                    .map_or_else(Self::null, |f| Self::Primitive(Primitive::Float(f))),
            },
            serde_json::Value::String(s) => Self::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Self::Container(Container::list(items.iter().map(Self::from_json)))
            }
            serde_json::Value::Object(fields) => Self::Container(Container::map(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), Self::from_json(value))),
            )),
        }
    }

    /// Render the current tree as JSON without emitting any access events.
    ///
    /// A container that is its own ancestor renders as the string
    /// `"[Circular]"`; non-finite floats render as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Primitive(primitive) => primitive.to_json(),
            Self::Container(container) => container.snapshot(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Primitive> for Value {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

impl From<Container> for Value {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::null()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Primitive(Primitive::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Primitive(Primitive::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Primitive(Primitive::Int(i64::from(i)))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Primitive(Primitive::Int(i64::from(i)))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Primitive(Primitive::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Primitive(Primitive::Text(s.to_owned()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Primitive(Primitive::Text(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use serde_json::json;

    #[test]
    fn nan_is_never_strictly_equal() {
        let nan = Value::from(f64::NAN);
        assert!(!nan.strict_eq(&nan.clone()));
    }

    #[test]
    fn signed_zeros_are_equal() {
        assert!(Value::from(0.0).strict_eq(&Value::from(-0.0)));
    }

    #[test]
    fn int_float_equality_does_not_round() {
        let above = (1i64 << 53) + 1;
        let rounded = (1u64 << 53) as f64;
        assert!(!Value::from(above).strict_eq(&Value::from(rounded)));
        assert!(!Value::from(rounded).strict_eq(&Value::from(above)));
        assert!(Value::from(1i64 << 53).strict_eq(&Value::from(rounded)));

        assert!(!Value::from(i64::MAX).strict_eq(&Value::from(i64::MAX as f64)));
        assert!(Value::from(i64::MIN).strict_eq(&Value::from(i64::MIN as f64)));
        assert!(!Value::from(3).strict_eq(&Value::from(3.5)));
        assert!(!Value::from(0).strict_eq(&Value::from(f64::NAN)));
        assert!(!Value::from(0).strict_eq(&Value::from(f64::INFINITY)));
        assert!(Value::from(0).strict_eq(&Value::from(-0.0)));
    }

    #[test]
    fn int_and_float_compare_numerically() {
        assert!(Value::from(1).strict_eq(&Value::from(1.0)));
        assert!(!Value::from(1).strict_eq(&Value::from(1.5)));
    }

    #[test]
    fn different_types_never_equal() {
        assert!(!Value::from(1).strict_eq(&Value::from("1")));
        assert!(!Value::from(true).strict_eq(&Value::from(1)));
        assert!(!Value::null().strict_eq(&Value::from(0)));
        assert!(Value::null().strict_eq(&Value::from(())));
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = Container::list([1, 2]);
        let b = Container::list([1, 2]);
        assert!(Value::from(a.clone()).strict_eq(&Value::from(a.clone())));
        assert!(!Value::from(a).strict_eq(&Value::from(b)));
    }

    #[test]
    fn from_json_builds_nested_tree() {
        let value = Value::from_json(&json!({ "z": [1, 2.5, null], "a": { "b": "x" } }));
        let root = value.as_container().unwrap();
        assert_eq!(root.kind(), ContainerKind::Map);
        assert_eq!(root.keys(), vec![Key::from("z"), Key::from("a")]);

        let z = root.peek("z").unwrap();
        let z = z.as_container().unwrap();
        assert_eq!(z.kind(), ContainerKind::List);
        assert_eq!(z.peek(0usize).unwrap().as_int(), Some(1));
        assert_eq!(z.peek(1usize).unwrap().as_float(), Some(2.5));
        assert_eq!(z.peek(2usize).unwrap().type_name(), "null");
    }

    #[test]
    fn large_unsigned_becomes_float() {
        let value = Value::from_json(&json!(u64::MAX));
        assert_eq!(value.type_name(), "float");
    }

    #[test]
    fn to_json_round_trips_plain_tree() {
        let doc = json!({ "name": "n", "tags": ["a", "b"], "count": 3, "ok": false });
        assert_eq!(Value::from_json(&doc).to_json(), doc);
    }

    #[test]
    fn non_finite_float_renders_null() {
        assert_eq!(Value::from(f64::INFINITY).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn accessors_by_type() {
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7).as_float(), Some(7.0));
        assert!(Value::from(7).as_container().is_none());
        assert_eq!(Value::from(Container::empty_map()).type_name(), "map");
    }
}
