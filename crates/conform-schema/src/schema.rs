//! # Schema Façade
//!
//! [`Schema`] binds a raw definition to its options and the node tree
//! compiled from them. Construction is the only fallible step that can
//! report a [`SchemaError`]; after that a schema is immutable and can be
//! shared across threads and applied any number of times.

use std::fmt;
use std::sync::Arc;

use conform_core::{SchemaError, ValidationResult, Value};
use serde::{Deserialize, Serialize};

use crate::compile::{compile, SchemaNode};
use crate::raw::RawSchema;

/// What a mapping does with input keys no entry claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtraPolicy {
    /// Report each one as "extra keys not allowed".
    #[default]
    #[serde(rename = "PREVENT_EXTRA")]
    Prevent,
    /// Copy them to the output unchanged.
    #[serde(rename = "ALLOW_EXTRA")]
    Allow,
    /// Drop them silently.
    #[serde(rename = "REMOVE_EXTRA")]
    Remove,
}

impl ExtraPolicy {
    /// The policy's canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            ExtraPolicy::Prevent => "PREVENT_EXTRA",
            ExtraPolicy::Allow => "ALLOW_EXTRA",
            ExtraPolicy::Remove => "REMOVE_EXTRA",
        }
    }
}

impl fmt::Display for ExtraPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How input keys are compared with literal schema keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatching {
    /// Keys must be equal.
    #[default]
    Exact,
    /// Text keys with no exact match fall back to a case-insensitive match
    /// against text literals.
    CaseInsensitive,
}

/// Options applied to every mapping of a schema, nested ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Treat unmarked literal keys as required.
    pub required: bool,
    /// Extra-key policy.
    pub extra: ExtraPolicy,
    /// Key comparison mode.
    pub key_matching: KeyMatching,
}

impl SchemaOptions {
    /// Set `required`.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the extra-key policy.
    pub fn extra(mut self, extra: ExtraPolicy) -> Self {
        self.extra = extra;
        self
    }

    /// Set the key comparison mode.
    pub fn key_matching(mut self, key_matching: KeyMatching) -> Self {
        self.key_matching = key_matching;
        self
    }
}

/// A compiled, immutable validator.
///
/// Cloning is cheap: the raw definition and the compiled tree are shared.
#[derive(Clone)]
pub struct Schema {
    raw: Arc<RawSchema>,
    options: SchemaOptions,
    root: Arc<SchemaNode>,
}

impl Schema {
    /// Compile `raw` with default options.
    pub fn new(raw: impl Into<RawSchema>) -> Result<Self, SchemaError> {
        Self::with_options(raw, SchemaOptions::default())
    }

    /// Compile `raw` with `options`.
    pub fn with_options(raw: impl Into<RawSchema>, options: SchemaOptions) -> Result<Self, SchemaError> {
        let raw = raw.into();
        let root = compile(&raw, &options)?;
        tracing::debug!(
            required = options.required,
            extra = %options.extra,
            key_matching = ?options.key_matching,
            "compiled schema"
        );
        Ok(Self {
            raw: Arc::new(raw),
            options,
            root: Arc::new(root),
        })
    }

    /// The raw definition.
    pub fn raw(&self) -> &RawSchema {
        &self.raw
    }

    /// The options the schema was compiled with.
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Validate `data`, returning the transformed value or every failure
    /// found.
    ///
    /// Recursion follows schema and input nesting; pathologically deep data
    /// is bounded only by the calling thread's stack.
    pub fn validate(&self, data: &Value) -> ValidationResult {
        self.root.validate(data)
    }

    /// Merge `overlay` into this mapping schema, keeping this schema's
    /// options.
    pub fn extend(&self, overlay: &Schema) -> Result<Schema, SchemaError> {
        self.extend_with(overlay, None, None)
    }

    /// Merge `overlay` into this mapping schema.
    ///
    /// Overlay entries replace base entries with an equal lookup key, in the
    /// base entry's position; other overlay entries are appended. Options
    /// left as `None` are inherited from this schema. Nested mappings are
    /// replaced wholesale, not merged.
    pub fn extend_with(
        &self,
        overlay: &Schema,
        required: Option<bool>,
        extra: Option<ExtraPolicy>,
    ) -> Result<Schema, SchemaError> {
        let (RawSchema::Mapping(base), RawSchema::Mapping(additions)) = (self.raw(), overlay.raw())
        else {
            return Err(SchemaError::new(format!(
                "extend requires two mapping schemas, got {} and {}",
                self.raw, overlay.raw
            )));
        };

        let mut entries = base.clone();
        for (key, value) in additions {
            match entries.iter_mut().find(|(existing, _)| existing == key) {
                Some(slot) => *slot = (key.clone(), value.clone()),
                None => entries.push((key.clone(), value.clone())),
            }
        }
        tracing::debug!(
            base = base.len(),
            overlay = additions.len(),
            merged = entries.len(),
            "extending schema"
        );

        let options = SchemaOptions {
            required: required.unwrap_or(self.options.required),
            extra: extra.unwrap_or(self.options.extra),
            key_matching: self.options.key_matching,
        };
        Schema::with_options(RawSchema::Mapping(entries), options)
    }

    pub(crate) fn root(&self) -> &Arc<SchemaNode> {
        &self.root
    }
}

/// Two schemas are equal when their raw definitions are; options are not
/// compared.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Schema({}, extra={}, required={})>",
            self.raw, self.options.extra, self.options.required
        )
    }
}
