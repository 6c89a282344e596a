//! # Raw Schema Definitions
//!
//! [`RawSchema`] is the declarative tree a user writes: literals, types,
//! predicates, mappings, sequences, object shapes, markers and override
//! messages. It is never matched against data directly; [`crate::Schema`]
//! compiles it once into an immutable node tree.
//!
//! ## Equality
//!
//! Raw schemas compare structurally. Mapping entries and set alternatives
//! compare without regard to order, predicates compare by identity (two
//! closures are equal only if they are the same `Predicate`), and a marker
//! compares equal to the key it wraps.

use std::fmt;
use std::sync::Arc;

use conform_core::{ErrorKind, Invalid, MultipleInvalid, Value, ValueType};
use thiserror::Error;

use crate::marker::{Marker, Msg};
use crate::schema::Schema;

/// Failure reported by a [`Predicate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// The value could not be converted. Reported as "not a valid value".
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// The predicate rejected the value with its own failures, which are
    /// propagated unchanged.
    #[error(transparent)]
    Invalid(#[from] MultipleInvalid),
}

impl PredicateError {
    /// A conversion failure with the given reason.
    pub fn conversion(reason: impl Into<String>) -> Self {
        PredicateError::Conversion(reason.into())
    }

    /// A rejection carrying one failure of `kind`.
    pub fn invalid(kind: ErrorKind, message: impl Into<String>) -> Self {
        PredicateError::Invalid(Invalid::new(kind, message).into())
    }
}

impl From<Invalid> for PredicateError {
    fn from(error: Invalid) -> Self {
        PredicateError::Invalid(error.into())
    }
}

type PredicateFn = dyn Fn(&Value) -> Result<Value, PredicateError> + Send + Sync;

/// A named validation/coercion function.
///
/// `Ok(v)` accepts the input and replaces it with `v` in the output. A panic
/// inside the function is a bug in the caller's program and is not caught.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    func: Arc<PredicateFn>,
    catch_all: bool,
}

impl Predicate {
    /// Wrap `func` under `name` (used when rendering the schema).
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, PredicateError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            func: Arc::new(func),
            catch_all: false,
        }
    }

    /// Accepts every value unchanged. As a mapping key it admits any key not
    /// claimed by a more specific entry.
    pub fn extra() -> Self {
        Self {
            catch_all: true,
            ..Self::new("Extra", |value| Ok(value.clone()))
        }
    }

    /// True for [`Predicate::extra`]. As a mapping key it ranks after every
    /// other key pattern.
    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    /// Converts scalars to `target` (`int`, `float`, `str` or `bool`).
    /// Anything else fails with "expected <target>".
    pub fn coerce(target: ValueType) -> Self {
        let name = format!("Coerce({target})");
        Self::new(name, move |value| coerce_value(&target, value))
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the function.
    pub fn call(&self, value: &Value) -> Result<Value, PredicateError> {
        (self.func)(value)
    }
}

/// Finite and inside `[i64::MIN, i64::MAX]` once truncated.
fn in_i64_range(x: f64) -> bool {
    x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64
}

fn coerce_value(target: &ValueType, value: &Value) -> Result<Value, PredicateError> {
    let converted = match (target, value) {
        (ValueType::Int, Value::Int(n)) => Some(Value::Int(*n)),
        (ValueType::Int, Value::Bool(b)) => Some(Value::Int(i64::from(*b))),
        (ValueType::Int, Value::Float(x)) if in_i64_range(*x) => Some(Value::Int(x.trunc() as i64)),
        (ValueType::Int, Value::Str(s)) => s.trim().parse::<i64>().ok().map(Value::Int),
        (ValueType::Float, Value::Float(x)) => Some(Value::Float(*x)),
        (ValueType::Float, Value::Int(n)) => Some(Value::Float(*n as f64)),
        (ValueType::Float, Value::Bool(b)) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
        (ValueType::Float, Value::Str(s)) => s.trim().parse::<f64>().ok().map(Value::Float),
        (ValueType::Str, Value::Str(s)) => Some(Value::Str(s.clone())),
        (ValueType::Str, other) if other.is_primitive() => Some(Value::Str(other.to_string())),
        (ValueType::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
        (ValueType::Bool, Value::Int(n)) => Some(Value::Bool(*n != 0)),
        _ => None,
    };
    converted.ok_or_else(|| PredicateError::invalid(ErrorKind::Value, format!("expected {target}")))
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.name)
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Attribute-wise schema for instances of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectShape {
    class: String,
    attrs: Vec<(String, RawSchema)>,
}

impl ObjectShape {
    /// A shape for instances of `class` with no attributes declared yet.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attrs: Vec::new(),
        }
    }

    /// Declare attribute `name` validated by `schema`.
    pub fn attr(mut self, name: impl Into<String>, schema: impl Into<RawSchema>) -> Self {
        self.attrs.push((name.into(), schema.into()));
        self
    }

    /// The required class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Declared attributes, in declaration order.
    pub fn attrs(&self) -> &[(String, RawSchema)] {
        &self.attrs
    }
}

/// A declarative schema fragment, before compilation.
#[derive(Debug, Clone)]
pub enum RawSchema {
    /// Matches values equal to the given primitive.
    Literal(Value),
    /// Matches instances of the given type.
    Type(ValueType),
    /// Validates and converts through a function.
    Predicate(Predicate),
    /// Matches mappings; entries are (key pattern, value schema).
    Mapping(Vec<(RawSchema, RawSchema)>),
    /// Matches lists whose elements each satisfy one of the alternatives.
    List(Vec<RawSchema>),
    /// Matches tuples whose elements each satisfy one of the alternatives.
    Tuple(Vec<RawSchema>),
    /// Matches sets whose members each satisfy one of the alternatives.
    Set(Vec<RawSchema>),
    /// Matches objects attribute by attribute.
    Object(ObjectShape),
    /// A key (or sequence alternative) with marker semantics.
    Marker(Marker),
    /// A schema whose direct failures are reported with a fixed message.
    Msg(Msg),
    /// An already-compiled schema, reused as a fragment.
    Schema(Schema),
}

impl RawSchema {
    /// Literal match.
    pub fn literal(value: impl Into<Value>) -> Self {
        RawSchema::Literal(value.into())
    }

    /// Type check.
    pub fn of_type(ty: ValueType) -> Self {
        RawSchema::Type(ty)
    }

    /// Predicate from a closure.
    pub fn predicate<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, PredicateError> + Send + Sync + 'static,
    {
        RawSchema::Predicate(Predicate::new(name, func))
    }

    /// Mapping from (key, value) schema pairs, in declaration order.
    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<RawSchema>,
        V: Into<RawSchema>,
    {
        RawSchema::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// List of alternatives.
    pub fn list<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RawSchema>,
    {
        RawSchema::List(alternatives.into_iter().map(Into::into).collect())
    }

    /// Tuple of alternatives.
    pub fn tuple<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RawSchema>,
    {
        RawSchema::Tuple(alternatives.into_iter().map(Into::into).collect())
    }

    /// Set of alternatives.
    pub fn set<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RawSchema>,
    {
        RawSchema::Set(alternatives.into_iter().map(Into::into).collect())
    }

    /// The fragment used for key lookup: markers are looked through to the
    /// key they wrap.
    pub fn lookup_key(&self) -> &RawSchema {
        match self {
            RawSchema::Marker(marker) => marker.key().lookup_key(),
            other => other,
        }
    }

    /// The primitive this fragment matches by equality, if it is a literal
    /// (possibly marker-wrapped).
    pub fn literal_key(&self) -> Option<&Value> {
        match self.lookup_key() {
            RawSchema::Literal(value) if value.is_primitive() => Some(value),
            _ => None,
        }
    }
}

fn unordered_eq<T, F>(a: &[T], b: &[T], eq: F) -> bool
where
    F: Fn(&T, &T) -> bool,
{
    a.len() == b.len()
        && a.iter().all(|x| b.iter().any(|y| eq(x, y)))
        && b.iter().all(|y| a.iter().any(|x| eq(x, y)))
}

impl PartialEq for RawSchema {
    fn eq(&self, other: &Self) -> bool {
        match (self.lookup_key(), other.lookup_key()) {
            (RawSchema::Literal(a), RawSchema::Literal(b)) => a == b,
            (RawSchema::Type(a), RawSchema::Type(b)) => a == b,
            (RawSchema::Predicate(a), RawSchema::Predicate(b)) => a == b,
            (RawSchema::Mapping(a), RawSchema::Mapping(b)) => {
                unordered_eq(a, b, |(ka, va), (kb, vb)| ka == kb && va == vb)
            }
            (RawSchema::List(a), RawSchema::List(b)) => a == b,
            (RawSchema::Tuple(a), RawSchema::Tuple(b)) => a == b,
            (RawSchema::Set(a), RawSchema::Set(b)) => unordered_eq(a, b, |x, y| x == y),
            (RawSchema::Object(a), RawSchema::Object(b)) => a == b,
            (RawSchema::Msg(a), RawSchema::Msg(b)) => a == b,
            (RawSchema::Schema(a), RawSchema::Schema(b)) => a == b,
            _ => false,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[RawSchema]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for RawSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSchema::Literal(value) => write!(f, "{value}"),
            RawSchema::Type(ty) => write!(f, "<{ty}>"),
            RawSchema::Predicate(p) => f.write_str(p.name()),
            RawSchema::Mapping(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            RawSchema::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            RawSchema::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            RawSchema::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            RawSchema::Object(shape) => {
                write!(f, "Object({{")?;
                for (i, (name, schema)) in shape.attrs().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{name}': {schema}")?;
                }
                write!(f, "}}, cls={})", shape.class())
            }
            RawSchema::Marker(marker) => write!(f, "{marker}"),
            RawSchema::Msg(msg) => write!(f, "{msg}"),
            RawSchema::Schema(schema) => write!(f, "{}", schema.raw()),
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

/// Values convert structurally: mappings become [`RawSchema::Mapping`] with
/// literal keys, lists/tuples/sets become sequence schemas, and scalars
/// become literals.
impl From<Value> for RawSchema {
    fn from(value: Value) -> Self {
        match value {
            Value::Map(map) => RawSchema::Mapping(
                map.into_iter()
                    .map(|(k, v)| (RawSchema::from(k), RawSchema::from(v)))
                    .collect(),
            ),
            Value::List(items) => RawSchema::List(items.into_iter().map(RawSchema::from).collect()),
            Value::Tuple(items) => {
                RawSchema::Tuple(items.into_iter().map(RawSchema::from).collect())
            }
            Value::Set(members) => {
                RawSchema::Set(members.into_iter().map(RawSchema::from).collect())
            }
            scalar => RawSchema::Literal(scalar),
        }
    }
}

impl From<&str> for RawSchema {
    fn from(s: &str) -> Self {
        RawSchema::Literal(Value::from(s))
    }
}

impl From<String> for RawSchema {
    fn from(s: String) -> Self {
        RawSchema::Literal(Value::Str(s))
    }
}

impl From<i64> for RawSchema {
    fn from(n: i64) -> Self {
        RawSchema::Literal(Value::Int(n))
    }
}

impl From<i32> for RawSchema {
    fn from(n: i32) -> Self {
        RawSchema::Literal(Value::from(n))
    }
}

impl From<bool> for RawSchema {
    fn from(b: bool) -> Self {
        RawSchema::Literal(Value::Bool(b))
    }
}

impl From<f64> for RawSchema {
    fn from(x: f64) -> Self {
        RawSchema::Literal(Value::Float(x))
    }
}

impl From<ValueType> for RawSchema {
    fn from(ty: ValueType) -> Self {
        RawSchema::Type(ty)
    }
}

impl From<Predicate> for RawSchema {
    fn from(p: Predicate) -> Self {
        RawSchema::Predicate(p)
    }
}

impl From<ObjectShape> for RawSchema {
    fn from(shape: ObjectShape) -> Self {
        RawSchema::Object(shape)
    }
}

impl From<Marker> for RawSchema {
    fn from(marker: Marker) -> Self {
        RawSchema::Marker(marker)
    }
}

impl From<Msg> for RawSchema {
    fn from(msg: Msg) -> Self {
        RawSchema::Msg(msg)
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        RawSchema::Schema(schema)
    }
}

impl From<serde_json::Value> for RawSchema {
    fn from(json: serde_json::Value) -> Self {
        RawSchema::from(Value::from(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_converts_structurally() {
        let raw = RawSchema::from(Value::map([("a", Value::list([1, 2]))]));
        let expected = RawSchema::mapping([("a", RawSchema::list([1, 2]))]);
        assert_eq!(raw, expected);
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a = RawSchema::mapping([("a", ValueType::Str), ("b", ValueType::Int)]);
        let b = RawSchema::mapping([("b", ValueType::Int), ("a", ValueType::Str)]);
        assert_eq!(a, b);
        let c = RawSchema::mapping([("b", ValueType::Int), ("a", ValueType::Int)]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_list_equality_is_ordered() {
        assert_ne!(RawSchema::list([1, 2]), RawSchema::list([2, 1]));
        assert_eq!(RawSchema::set([1, 2]), RawSchema::set([2, 1]));
    }

    #[test]
    fn test_only_extra_is_catch_all() {
        assert!(Predicate::extra().is_catch_all());
        assert!(!Predicate::coerce(ValueType::Int).is_catch_all());
        assert!(!Predicate::new("Extra", |v| Ok(v.clone())).is_catch_all());
    }

    #[test]
    fn test_predicate_equality_is_identity() {
        let p = Predicate::extra();
        assert_eq!(RawSchema::from(p.clone()), RawSchema::from(p));
        assert_ne!(
            RawSchema::from(Predicate::extra()),
            RawSchema::from(Predicate::extra())
        );
    }

    #[test]
    fn test_marker_equals_wrapped_key() {
        let required = RawSchema::from(Marker::required("a"));
        assert_eq!(required, RawSchema::from("a"));
        assert_eq!(required.literal_key(), Some(&Value::from("a")));
        assert_eq!(RawSchema::from(ValueType::Int).literal_key(), None);
    }

    #[test]
    fn test_coerce() {
        let to_int = Predicate::coerce(ValueType::Int);
        assert_eq!(to_int.call(&Value::from(" 10 ")), Ok(Value::Int(10)));
        assert_eq!(to_int.call(&Value::Float(3.7)), Ok(Value::Int(3)));
        let err = to_int.call(&Value::from("ten")).unwrap_err();
        assert_eq!(err.to_string(), "expected int");
        for out_of_range in [1e300, -1e300, 9.3e18, f64::INFINITY, f64::NAN] {
            let err = to_int.call(&Value::Float(out_of_range)).unwrap_err();
            assert_eq!(err.to_string(), "expected int");
        }
        assert_eq!(to_int.call(&Value::Float(-9.2e18)), Ok(Value::Int(-9_200_000_000_000_000_000)));

        let to_str = Predicate::coerce(ValueType::Str);
        assert_eq!(to_str.call(&Value::Int(5)), Ok(Value::from("5")));
        assert_eq!(to_str.call(&Value::from("x")), Ok(Value::from("x")));
    }

    #[test]
    fn test_display() {
        let raw = RawSchema::mapping([
            (RawSchema::from("a"), RawSchema::from(ValueType::Str)),
            (
                RawSchema::from(Predicate::extra()),
                RawSchema::tuple([RawSchema::from(1)]),
            ),
        ]);
        assert_eq!(raw.to_string(), "{'a': <str>, Extra: (1,)}");
    }
}
