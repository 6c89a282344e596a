//! # Dynamic Value Tree
//!
//! `Value` is the data model that schemas are matched against: nested
//! mappings, sequences, sets, attribute-carrying objects, and scalars.
//!
//! ## Equality
//!
//! Equality is structural and variant-strict: `Int(1)`, `Float(1.0)` and
//! `Bool(true)` are three distinct values. Floats compare by value, with
//! `NaN` equal to itself so that every value can be used as a mapping key.
//! Mappings and sets compare without regard to insertion order, and hash
//! order-independently, so `Value` is `Eq + Hash` all the way down.
//!
//! ## Rendering
//!
//! `Display` renders a literal-style `repr` (`'text'`, `None`, `True`,
//! `(1,)`, `{'a': 1}`, `set()`), which is what error paths and the humanizer
//! print.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A dynamically-typed data tree.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value (`None`).
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// A complex number.
    Complex {
        /// Real part.
        re: f64,
        /// Imaginary part.
        im: f64,
    },
    /// A text string.
    Str(String),
    /// A byte string.
    Bytes(Vec<u8>),
    /// An insertion-ordered mapping with unique keys.
    Map(ValueMap),
    /// A mutable-style ordered sequence.
    List(Vec<Value>),
    /// A fixed ordered sequence.
    Tuple(Vec<Value>),
    /// An unordered collection of unique values.
    Set(ValueSet),
    /// An instance of a named class carrying attributes.
    Object(Object),
}

impl Value {
    /// Build a list from anything convertible into values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a tuple from anything convertible into values.
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a set; duplicates collapse.
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a mapping from key/value pairs; later duplicates replace earlier ones.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Complex { .. } => ValueType::Complex,
            Value::Str(_) => ValueType::Str,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Map(_) => ValueType::Dict,
            Value::List(_) => ValueType::List,
            Value::Tuple(_) => ValueType::Tuple,
            Value::Set(_) => ValueType::Set,
            Value::Object(obj) => ValueType::Instance(obj.class().to_string()),
        }
    }

    /// Human-readable type name, as used in "expected X but got Y" messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Object(obj) => obj.class(),
            other => other.value_type().static_name(),
        }
    }

    /// True for scalars: everything except maps, sequences, sets and objects.
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            Value::Map(_) | Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::Object(_)
        )
    }

    /// Borrow the text of a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer of an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the mapping of a `Map`.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the elements of a `List` or `Tuple`.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the set of a `Set`.
    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the object of an `Object`.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// True if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::Complex { re: ar, im: ai }, Value::Complex { re: br, im: bi }) => {
                float_eq(*ar, *br) && float_eq(*ai, *bi)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(f) => float_bits(*f).hash(state),
            Value::Complex { re, im } => {
                float_bits(*re).hash(state);
                float_bits(*im).hash(state);
            }
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Map(m) => m.hash(state),
            Value::List(items) | Value::Tuple(items) => items.hash(state),
            Value::Set(s) => s.hash(state),
            Value::Object(o) => o.hash(state),
        }
    }
}

/// Insertion-ordered mapping from `Value` keys to `Value`s.
///
/// Keys are unique under `Value` equality; inserting an existing key replaces
/// the value in place without moving the entry. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace; returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for ValueMap {}

impl Hash for ValueMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        let combined = self
            .entries
            .iter()
            .fold(0u64, |acc, entry| acc.wrapping_add(hash_one(entry)));
        combined.hash(state);
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        map.extend(iter);
        map
    }
}

impl Extend<(Value, Value)> for ValueMap {
    fn extend<I: IntoIterator<Item = (Value, Value)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Set of unique values, iterated in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    items: Vec<Value>,
}

impl ValueSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if `value` is a member.
    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    /// Add `value`; returns false if it was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    /// Iterate members in first-insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl Eq for ValueSet {}

impl Hash for ValueSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        let combined = self
            .items
            .iter()
            .fold(0u64, |acc, item| acc.wrapping_add(hash_one(item)));
        combined.hash(state);
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

impl IntoIterator for ValueSet {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An instance of a named class with an ordered attribute table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object {
    class: String,
    attrs: Vec<(String, Value)>,
}

impl Object {
    /// Create an instance of `class` with no attributes.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attrs: Vec::new(),
        }
    }

    /// Builder form of [`Object::set_attr`].
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// The class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// True if the instance carries attribute `name`.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// Current value of attribute `name`.
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set attribute `name`, replacing in place if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Iterate attributes in definition order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// The type of a [`Value`], as matched by type-check schema nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `Value::Null`.
    Null,
    /// `Value::Bool`.
    Bool,
    /// `Value::Int`.
    Int,
    /// `Value::Float`.
    Float,
    /// `Value::Complex`.
    Complex,
    /// `Value::Str`.
    Str,
    /// `Value::Bytes`.
    Bytes,
    /// `Value::Map`.
    Dict,
    /// `Value::List`.
    List,
    /// `Value::Tuple`.
    Tuple,
    /// `Value::Set`.
    Set,
    /// Any `Value::Object`, whatever its class.
    Object,
    /// A `Value::Object` of the named class.
    Instance(String),
    /// Every value.
    Any,
}

impl ValueType {
    /// True if `value` is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Object, Value::Object(_)) => true,
            (ValueType::Instance(class), Value::Object(obj)) => obj.class() == class,
            (expected, actual) => *expected == actual.value_type(),
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        match self {
            ValueType::Instance(class) => class,
            other => other.static_name(),
        }
    }

    fn static_name(&self) -> &'static str {
        match self {
            ValueType::Null => "None",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Complex => "complex",
            ValueType::Str => "str",
            ValueType::Bytes => "bytes",
            ValueType::Dict => "dict",
            ValueType::List => "list",
            ValueType::Tuple => "tuple",
            ValueType::Set => "set",
            ValueType::Object | ValueType::Instance(_) => "object",
            ValueType::Any => "any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Rendering ────────────────────────────────────────────────────────

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{x:?}")
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

fn write_bytes_repr(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b'")?;
    for &b in bytes {
        match b {
            b'\\' => f.write_str("\\\\")?,
            b'\'' => f.write_str("\\'")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            0x20..=0x7e => write!(f, "{}", b as char)?,
            _ => write!(f, "\\x{b:02x}")?,
        }
    }
    f.write_str("'")
}

fn write_joined<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write_float(f, *x),
            Value::Complex { re, im } => {
                f.write_str("(")?;
                write_float(f, *re)?;
                if *im >= 0.0 || im.is_nan() {
                    f.write_str("+")?;
                }
                write_float(f, *im)?;
                f.write_str("j)")
            }
            Value::Str(s) => write_str_repr(f, s),
            Value::Bytes(b) => write_bytes_repr(f, b),
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Set(s) if s.is_empty() => f.write_str("set()"),
            Value::Set(s) => {
                f.write_str("{")?;
                write_joined(f, s)?;
                f.write_str("}")
            }
            Value::Object(obj) => {
                write!(f, "{}(", obj.class())?;
                for (i, (name, v)) in obj.attrs().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={v}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

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
        Value::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Value::Map(m)
    }
}

impl From<ValueSet> for Value {
    fn from(s: ValueSet) -> Self {
        Value::Set(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 beyond i64::MAX and non-integral numbers both land here.
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Complex { re, im } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(re)?;
                seq.serialize_element(im)?;
                seq.end()
            }
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Set(s) => {
                let mut seq = serializer.serialize_seq(Some(s.len()))?;
                for item in s {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(None)?;
                for (name, v) in obj.attrs() {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for arbitrary value trees with text and integer keys.
    fn value_tree() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            any::<f64>().prop_map(Value::Float),
            "[a-zA-Z0-9_ ']{0,20}".prop_map(Value::Str),
            prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
        ];
        leaf.prop_recursive(3, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Tuple),
                prop::collection::vec(inner.clone(), 0..6).prop_map(|items| Value::set(items)),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..6)
                    .prop_map(|entries| Value::map(entries)),
            ]
        })
    }

    fn digest(value: &Value) -> u64 {
        hash_one(value)
    }

    proptest! {
        /// Every value equals its clone and hashes identically.
        #[test]
        fn clone_is_equal_and_hash_stable(value in value_tree()) {
            let copy = value.clone();
            prop_assert_eq!(&value, &copy);
            prop_assert_eq!(digest(&value), digest(&copy));
        }

        /// Reversing insertion order leaves mapping equality and hash unchanged.
        #[test]
        fn map_order_does_not_matter(entries in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)) {
            let forward = Value::map(entries.clone());
            let backward = Value::map(entries.into_iter().rev());
            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(digest(&forward), digest(&backward));
        }

        /// Rendering never panics.
        #[test]
        fn display_never_panics(value in value_tree()) {
            let _ = value.to_string();
        }
    }
}
