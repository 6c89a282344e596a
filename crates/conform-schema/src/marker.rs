//! # Markers and Override Messages
//!
//! A [`Marker`] wraps a mapping key (or a sequence alternative) and attaches
//! key semantics: `Required`, `Optional`, `Exclusive`, `Inclusive`, `Remove`.
//!
//! A marker has two independent comparability facets:
//!
//! - **Lookup**: a marker compares equal to the key it wraps
//!   ([`crate::RawSchema::lookup_key`]), so `Required("a")` and `"a"` name the
//!   same mapping entry.
//! - **Identity**: every marker carries a [`MarkerId`] assigned at
//!   construction. Exclusion and inclusion groups are partitioned by identity,
//!   never by lookup equality.
//!
//! [`Msg`] attaches an override message to any schema fragment.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use conform_core::{ErrorKind, SchemaError, Value};

use crate::raw::RawSchema;

static NEXT_MARKER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity token of a [`Marker`]. Clones share the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    fn next() -> Self {
        MarkerId(NEXT_MARKER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The semantics a [`Marker`] attaches to its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// The key must be present (or defaulted).
    Required,
    /// The key may be absent, even when the schema is `required`.
    Optional,
    /// At most one key of the named group may be present.
    Exclusive {
        /// Group name.
        group: String,
    },
    /// Either all or none of the keys of the named group may be present.
    Inclusive {
        /// Group name.
        group: String,
    },
    /// Matching keys (or sequence elements) are dropped from the output.
    Remove,
}

impl MarkerKind {
    /// The marker's name.
    pub fn name(&self) -> &'static str {
        match self {
            MarkerKind::Required => "Required",
            MarkerKind::Optional => "Optional",
            MarkerKind::Exclusive { .. } => "Exclusive",
            MarkerKind::Inclusive { .. } => "Inclusive",
            MarkerKind::Remove => "Remove",
        }
    }

    /// The group name, for `Exclusive` and `Inclusive`.
    pub fn group(&self) -> Option<&str> {
        match self {
            MarkerKind::Exclusive { group } | MarkerKind::Inclusive { group } => Some(group),
            _ => None,
        }
    }

    fn accepts_default(&self) -> bool {
        matches!(
            self,
            MarkerKind::Required | MarkerKind::Optional | MarkerKind::Inclusive { .. }
        )
    }
}

type DefaultFactory = dyn Fn() -> Value + Send + Sync;

/// Value inserted for a missing key.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// No default.
    #[default]
    Absent,
    /// Insert a clone of this value.
    Constant(Value),
    /// Call this factory on every miss.
    Factory(Arc<DefaultFactory>),
}

impl DefaultValue {
    /// True unless `Absent`.
    pub fn is_set(&self) -> bool {
        !matches!(self, DefaultValue::Absent)
    }

    /// Produce the default for one missing key.
    pub fn materialize(&self) -> Option<Value> {
        match self {
            DefaultValue::Absent => None,
            DefaultValue::Constant(value) => Some(value.clone()),
            DefaultValue::Factory(factory) => Some(factory()),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Absent => f.write_str("Absent"),
            DefaultValue::Constant(value) => write!(f, "Constant({value})"),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A mapping key (or sequence alternative) with marker semantics.
#[derive(Debug, Clone)]
pub struct Marker {
    kind: MarkerKind,
    key: Box<RawSchema>,
    msg: Option<String>,
    description: Option<String>,
    default: DefaultValue,
    id: MarkerId,
}

impl Marker {
    fn with_kind(kind: MarkerKind, key: RawSchema) -> Self {
        Self {
            kind,
            key: Box::new(key),
            msg: None,
            description: None,
            default: DefaultValue::Absent,
            id: MarkerId::next(),
        }
    }

    /// `Required(key)`.
    pub fn required(key: impl Into<RawSchema>) -> Self {
        Self::with_kind(MarkerKind::Required, key.into())
    }

    /// `Optional(key)`.
    pub fn optional(key: impl Into<RawSchema>) -> Self {
        Self::with_kind(MarkerKind::Optional, key.into())
    }

    /// `Exclusive(key, group)`.
    pub fn exclusive(key: impl Into<RawSchema>, group: impl Into<String>) -> Self {
        Self::with_kind(
            MarkerKind::Exclusive {
                group: group.into(),
            },
            key.into(),
        )
    }

    /// `Inclusive(key, group)`.
    pub fn inclusive(key: impl Into<RawSchema>, group: impl Into<String>) -> Self {
        Self::with_kind(
            MarkerKind::Inclusive {
                group: group.into(),
            },
            key.into(),
        )
    }

    /// `Remove(key)`.
    pub fn remove(key: impl Into<RawSchema>) -> Self {
        Self::with_kind(MarkerKind::Remove, key.into())
    }

    /// Override message for failures attributed to this marker.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// Free-form description; metadata only, never used in matching.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Insert a clone of `value` when the key is missing.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Constant(value.into());
        self
    }

    /// Insert a freshly built value when the key is missing.
    pub fn with_default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = DefaultValue::Factory(Arc::new(factory));
        self
    }

    /// The marker semantics.
    pub fn kind(&self) -> &MarkerKind {
        &self.kind
    }

    /// The wrapped key (lookup facet).
    pub fn key(&self) -> &RawSchema {
        &self.key
    }

    /// The override message.
    pub fn msg(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    /// The description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The default.
    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    /// The identity token.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// True for `Remove`.
    pub fn is_remove(&self) -> bool {
        self.kind == MarkerKind::Remove
    }

    /// Reject marker configurations that can never be honoured.
    pub(crate) fn check(&self) -> Result<(), SchemaError> {
        if let Some(group) = self.kind.group() {
            if group.is_empty() {
                return Err(SchemaError::new(format!(
                    "{} marker for key {} needs a non-empty group name",
                    self.kind.name(),
                    self.key
                )));
            }
        }
        if self.default.is_set() && !self.kind.accepts_default() {
            return Err(SchemaError::new(format!(
                "{} marker for key {} cannot carry a default",
                self.kind.name(),
                self.key
            )));
        }
        Ok(())
    }
}

/// Lookup equality: two markers are equal when their wrapped keys are.
impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MarkerKind::Remove => write!(f, "Remove({})", self.key),
            _ => write!(f, "{}", self.key),
        }
    }
}

/// Report a fixed message when `schema` fails directly.
///
/// Failures nested deeper than one segment below the wrapped schema are
/// passed through untouched, so the message never masks a specific inner
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Msg {
    schema: Box<RawSchema>,
    message: String,
    kind: Option<ErrorKind>,
}

impl Msg {
    /// Wrap `schema` with `message`.
    pub fn new(schema: impl Into<RawSchema>, message: impl Into<String>) -> Self {
        Self {
            schema: Box::new(schema.into()),
            message: message.into(),
            kind: None,
        }
    }

    /// Raise the override as `kind` instead of [`ErrorKind::Invalid`].
    /// Must be a validation kind; [`ErrorKind::Schema`] is rejected when the
    /// schema is compiled.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The wrapped schema.
    pub fn schema(&self) -> &RawSchema {
        &self.schema
    }

    /// The override message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The override kind, if set.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({}, {}", self.schema, Value::from(self.message.as_str()))?;
        match self.kind {
            Some(kind) => write!(f, ", kind={kind})"),
            None => f.write_str(")"),
        }
    }
}
