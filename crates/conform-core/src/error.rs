//! # Error Types — Validation Failures and Their Aggregate
//!
//! Every failure produced while matching a value against a schema is an
//! [`Invalid`]: a message, an [`ErrorKind`] tag, and the [`Path`] of the
//! failure site. Matchers never return a bare `Invalid`; they return a
//! [`MultipleInvalid`] aggregate, so a lone failure and a hundred failures
//! have the same shape at every boundary.
//!
//! ## Design
//!
//! - Paths are relative to the node that produced the error. Container
//!   matchers prepend their key, index or attribute on the way up, so by the
//!   time an aggregate leaves the schema every path is rooted at the input.
//! - The aggregate renders as its first error; the full list stays available
//!   through [`MultipleInvalid::errors`].
//! - [`SchemaError`] is raised only while compiling a schema, never while
//!   validating data.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::{Path, PathSegment};
use crate::value::ValueType;

/// Category tag carried by every [`Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Generic failure; the kind used by override messages unless told otherwise.
    Invalid,
    /// The value is not acceptable ("not a valid value").
    Value,
    /// The value is not an instance of the expected type.
    Type,
    /// A mapping was expected.
    Dict,
    /// A list or tuple was expected.
    Sequence,
    /// A set was expected.
    Set,
    /// An object of a particular class was expected.
    Object,
    /// A key is present that the schema does not declare.
    ExtraKey,
    /// A required key is absent.
    RequiredField,
    /// Two or more members of an exclusion group are present.
    Exclusive,
    /// Some but not all members of an inclusion group are present.
    Inclusive,
    /// The schema itself is malformed. Construction time only.
    Schema,
}

impl ErrorKind {
    /// Stable short code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "invalid",
            ErrorKind::Value => "value",
            ErrorKind::Type => "type",
            ErrorKind::Dict => "dict",
            ErrorKind::Sequence => "sequence",
            ErrorKind::Set => "set",
            ErrorKind::Object => "object",
            ErrorKind::ExtraKey => "extra_key",
            ErrorKind::RequiredField => "required_field",
            ErrorKind::Exclusive => "exclusive",
            ErrorKind::Inclusive => "inclusive",
            ErrorKind::Schema => "schema",
        }
    }

    /// True for kinds that may be raised while validating data.
    pub fn is_validation_kind(&self) -> bool {
        !matches!(self, ErrorKind::Schema)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn path_suffix(path: &Path) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" @ {path}")
    }
}

/// A single validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", path_suffix(.path))]
pub struct Invalid {
    kind: ErrorKind,
    message: String,
    path: Path,
}

impl Invalid {
    /// A failure of `kind` at the root of the current node.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: Path::root(),
        }
    }

    /// Replace the path.
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }

    /// "not a valid value".
    pub fn not_valid() -> Self {
        Self::new(ErrorKind::Value, "not a valid value")
    }

    /// "expected <type>".
    pub fn type_mismatch(expected: &ValueType) -> Self {
        Self::new(ErrorKind::Type, format!("expected {expected}"))
    }

    /// "extra keys not allowed".
    pub fn extra_key() -> Self {
        Self::new(ErrorKind::ExtraKey, "extra keys not allowed")
    }

    /// The category tag.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message, without the path.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failure site.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Grow the path by one segment at the root end.
    pub fn prepend(&mut self, segment: PathSegment) {
        self.path.prepend(segment);
    }
}

fn render_first(errors: &[Invalid]) -> String {
    match errors.first() {
        Some(first) => first.to_string(),
        None => "no validation errors".to_string(),
    }
}

/// Ordered aggregate of [`Invalid`]s; the only error shape matchers return.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", render_first(.errors))]
pub struct MultipleInvalid {
    errors: Vec<Invalid>,
}

impl MultipleInvalid {
    /// Aggregate the given failures in order.
    pub fn new(errors: Vec<Invalid>) -> Self {
        Self { errors }
    }

    /// All failures, in the order they were recorded.
    pub fn errors(&self) -> &[Invalid] {
        &self.errors
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True if no failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first failure.
    pub fn first(&self) -> Option<&Invalid> {
        self.errors.first()
    }

    /// Iterate failures in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Invalid> {
        self.errors.iter()
    }

    /// Record one more failure.
    pub fn push(&mut self, error: Invalid) {
        self.errors.push(error);
    }

    /// Append every failure of `other`, flattening it into this aggregate.
    pub fn merge(&mut self, other: MultipleInvalid) {
        self.errors.extend(other.errors);
    }

    /// Grow every contained path by `segment` at the root end.
    pub fn prepend(&mut self, segment: &PathSegment) {
        for error in &mut self.errors {
            error.prepend(segment.clone());
        }
    }

    /// Builder form of [`MultipleInvalid::prepend`].
    pub fn prefixed(mut self, segment: PathSegment) -> Self {
        self.prepend(&segment);
        self
    }

    /// True if every contained failure sits at most one segment below the
    /// node that produced the aggregate.
    pub fn is_shallow(&self) -> bool {
        self.errors.iter().all(|e| e.path().len() <= 1)
    }

    /// Consume the aggregate, yielding its failures.
    pub fn into_errors(self) -> Vec<Invalid> {
        self.errors
    }
}

impl From<Invalid> for MultipleInvalid {
    fn from(error: Invalid) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for MultipleInvalid {
    type Item = Invalid;
    type IntoIter = std::vec::IntoIter<Invalid>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultipleInvalid {
    type Item = &'a Invalid;
    type IntoIter = std::slice::Iter<'a, Invalid>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<Invalid> for MultipleInvalid {
    fn from_iter<I: IntoIterator<Item = Invalid>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<Invalid> for MultipleInvalid {
    fn extend<I: IntoIterator<Item = Invalid>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

/// Result of applying a schema node to a value.
pub type ValidationResult<T = crate::value::Value> = Result<T, MultipleInvalid>;

/// A malformed schema, detected while compiling it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema error: {message}")]
pub struct SchemaError {
    message: String,
}

impl SchemaError {
    /// A construction-time failure with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The description, without the `schema error:` prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Always [`ErrorKind::Schema`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Schema
    }
}
