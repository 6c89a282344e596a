//! # Node Compiler
//!
//! Turns a [`RawSchema`] fragment into a [`SchemaNode`]: a closed variant
//! resolved once, at construction. Validation is then a `match` on the node
//! kind; no shape inspection of the schema happens per call.
//!
//! Compilation is eager and total. Every reachable fragment is compiled up
//! front, so a malformed schema fails in [`crate::Schema::new`], never on
//! first use.
//!
//! Nested mappings inherit the owning schema's options. The inner schemas of
//! [`crate::Msg`] and of markers are compiled with default options.
//!
//! Recursion depth follows schema nesting composed with input nesting and is
//! bounded only by the thread's stack.

use std::sync::Arc;

use conform_core::{ErrorKind, Invalid, MultipleInvalid, SchemaError, ValidationResult, Value, ValueType};

use crate::mapping::MappingNode;
use crate::object::ObjectNode;
use crate::raw::{Predicate, PredicateError, RawSchema};
use crate::schema::SchemaOptions;
use crate::sequence::{SequenceKind, SequenceNode};

/// Compiled validator for one schema fragment.
#[derive(Debug)]
pub(crate) enum SchemaNode {
    Literal(Value),
    Type(ValueType),
    Predicate(Predicate),
    Mapping(MappingNode),
    Sequence(SequenceNode),
    Object(ObjectNode),
    /// A `Msg` wrapper.
    Message(OverrideNode),
    /// A marker used as a validator (sequence alternative or key pattern).
    Marked { node: OverrideNode, remove: bool },
    /// The root of a nested compiled schema.
    Nested(Arc<SchemaNode>),
}

impl SchemaNode {
    /// Apply this node to `value`. Error paths are relative to this node.
    pub(crate) fn validate(&self, value: &Value) -> ValidationResult {
        match self {
            SchemaNode::Literal(expected) => {
                if value == expected {
                    Ok(value.clone())
                } else {
                    Err(Invalid::not_valid().into())
                }
            }
            SchemaNode::Type(ty) => {
                if ty.matches(value) {
                    Ok(value.clone())
                } else {
                    Err(Invalid::type_mismatch(ty).into())
                }
            }
            SchemaNode::Predicate(predicate) => call_predicate(predicate, value),
            SchemaNode::Mapping(node) => node.validate(value),
            SchemaNode::Sequence(node) => node.validate(value),
            SchemaNode::Object(node) => node.validate(value),
            SchemaNode::Message(node) => node.validate(value),
            SchemaNode::Marked { node, .. } => node.validate(value),
            SchemaNode::Nested(root) => root.validate(value),
        }
    }

    /// True for a `Remove` marker: a successful match drops the element.
    pub(crate) fn is_remove(&self) -> bool {
        matches!(self, SchemaNode::Marked { remove: true, .. })
    }
}

fn call_predicate(predicate: &Predicate, value: &Value) -> ValidationResult {
    predicate.call(value).map_err(|err| match err {
        PredicateError::Conversion(reason) => {
            tracing::trace!(predicate = predicate.name(), %reason, "predicate conversion failed");
            MultipleInvalid::from(Invalid::not_valid())
        }
        PredicateError::Invalid(errors) => errors,
    })
}

/// Shared override rule of `Msg` and markers.
#[derive(Debug)]
pub(crate) struct OverrideNode {
    inner: Box<SchemaNode>,
    message: Option<String>,
    kind: ErrorKind,
}

impl OverrideNode {
    fn validate(&self, value: &Value) -> ValidationResult {
        self.inner.validate(value).map_err(|errors| self.apply(errors))
    }

    /// Deep failures pass through; direct ones are replaced by the override.
    fn apply(&self, errors: MultipleInvalid) -> MultipleInvalid {
        match &self.message {
            Some(message) if errors.is_shallow() => Invalid::new(self.kind, message.clone()).into(),
            _ => errors,
        }
    }
}

/// Compile `raw` under `options`.
pub(crate) fn compile(raw: &RawSchema, options: &SchemaOptions) -> Result<SchemaNode, SchemaError> {
    match raw {
        RawSchema::Literal(value) => {
            if !value.is_primitive() {
                return Err(SchemaError::new(format!(
                    "literal {value} is not a primitive value; \
                     use a mapping, sequence or set schema instead"
                )));
            }
            Ok(SchemaNode::Literal(value.clone()))
        }
        RawSchema::Type(ty) => Ok(SchemaNode::Type(ty.clone())),
        RawSchema::Predicate(predicate) => Ok(SchemaNode::Predicate(predicate.clone())),
        RawSchema::Mapping(entries) => Ok(SchemaNode::Mapping(MappingNode::compile(entries, options)?)),
        RawSchema::List(alternatives) => Ok(SchemaNode::Sequence(SequenceNode::compile(
            SequenceKind::List,
            alternatives,
            options,
        )?)),
        RawSchema::Tuple(alternatives) => Ok(SchemaNode::Sequence(SequenceNode::compile(
            SequenceKind::Tuple,
            alternatives,
            options,
        )?)),
        RawSchema::Set(alternatives) => Ok(SchemaNode::Sequence(SequenceNode::compile(
            SequenceKind::Set,
            alternatives,
            options,
        )?)),
        RawSchema::Object(shape) => Ok(SchemaNode::Object(ObjectNode::compile(shape, options)?)),
        RawSchema::Marker(marker) => {
            marker.check()?;
            let inner = compile(marker.key(), &SchemaOptions::default())?;
            Ok(SchemaNode::Marked {
                node: OverrideNode {
                    inner: Box::new(inner),
                    message: marker.msg().map(str::to_string),
                    kind: ErrorKind::Invalid,
                },
                remove: marker.is_remove(),
            })
        }
        RawSchema::Msg(msg) => {
            let kind = msg.kind().unwrap_or(ErrorKind::Invalid);
            if !kind.is_validation_kind() {
                return Err(SchemaError::new(format!(
                    "Msg can only override with a validation error kind, got '{kind}'"
                )));
            }
            let inner = compile(msg.schema(), &SchemaOptions::default())?;
            Ok(SchemaNode::Message(OverrideNode {
                inner: Box::new(inner),
                message: Some(msg.message().to_string()),
                kind,
            }))
        }
        RawSchema::Schema(schema) => Ok(SchemaNode::Nested(Arc::clone(schema.root()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{Marker, Msg};
    use conform_core::PathSegment;

    fn node(raw: impl Into<RawSchema>) -> SchemaNode {
        compile(&raw.into(), &SchemaOptions::default()).expect("compiles")
    }

    #[test]
    fn test_literal_node() {
        let n = node("one");
        assert_eq!(n.validate(&Value::from("one")), Ok(Value::from("one")));
        let err = n.validate(&Value::from("two")).unwrap_err();
        assert_eq!(err.to_string(), "not a valid value");
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Value));
    }

    #[test]
    fn test_type_node() {
        let n = node(ValueType::Float);
        assert_eq!(n.validate(&Value::Float(1.5)), Ok(Value::Float(1.5)));
        let err = n.validate(&Value::from("1")).unwrap_err();
        assert_eq!(err.to_string(), "expected float");
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Type));
    }

    #[test]
    fn test_predicate_conversion_failure_becomes_not_valid() {
        let n = node(RawSchema::predicate("float", |v| match v {
            Value::Str(s) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| PredicateError::conversion(e.to_string())),
            _ => Err(PredicateError::conversion("not text")),
        }));
        assert_eq!(n.validate(&Value::from("1")), Ok(Value::Float(1.0)));
        let err = n.validate(&Value::from("a")).unwrap_err();
        assert_eq!(err.to_string(), "not a valid value");
    }

    #[test]
    fn test_predicate_invalid_propagates_unchanged() {
        let n = node(RawSchema::predicate("positive", |v| match v {
            Value::Int(n) if *n > 0 => Ok(v.clone()),
            _ => Err(PredicateError::invalid(ErrorKind::Invalid, "must be positive")),
        }));
        let err = n.validate(&Value::Int(-1)).unwrap_err();
        assert_eq!(err.to_string(), "must be positive");
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Invalid));
    }

    #[test]
    fn test_container_literal_is_rejected() {
        let err = compile(&RawSchema::Literal(Value::list([1])), &SchemaOptions::default())
            .unwrap_err();
        assert!(err.message().contains("not a primitive value"));
    }

    #[test]
    fn test_msg_rejects_schema_kind() {
        let raw = RawSchema::from(Msg::new(RawSchema::list([ValueType::Int]), "x").with_kind(ErrorKind::Schema));
        assert!(compile(&raw, &SchemaOptions::default()).is_err());
    }

    #[test]
    fn test_msg_overrides_direct_failure_only() {
        let n = node(Msg::new(
            RawSchema::list([RawSchema::from("one"), RawSchema::from("two"), RawSchema::from(ValueType::Int)]),
            "should be one of \"one\", \"two\" or an integer",
        ));
        let err = n.validate(&Value::list(["three"])).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.to_string(), "should be one of \"one\", \"two\" or an integer");

        let nested = node(Msg::new(
            RawSchema::list([RawSchema::list([
                RawSchema::from("one"),
                RawSchema::from("two"),
                RawSchema::from(ValueType::Int),
            ])]),
            "not okay!",
        ));
        let err = nested
            .validate(&Value::list([Value::list(["three"])]))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected int @ data[0][0]");
    }

    #[test]
    fn test_msg_override_kind() {
        let n = node(
            Msg::new(RawSchema::list([ValueType::Int]), "bad").with_kind(ErrorKind::Value),
        );
        let err = n.validate(&Value::list(["x"])).unwrap_err();
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Value));
        assert!(err.first().map(|e| e.path().is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_marker_node_is_remove() {
        let n = node(Marker::remove(ValueType::Float));
        assert!(n.is_remove());
        assert!(!node(Marker::optional(ValueType::Float)).is_remove());
        assert_eq!(n.validate(&Value::Float(2.0)), Ok(Value::Float(2.0)));
    }

    #[test]
    fn test_marker_message_applies_to_direct_failure() {
        let n = node(Marker::optional(ValueType::Int).with_msg("want an int"));
        let err = n.validate(&Value::from("x")).unwrap_err();
        assert_eq!(err.to_string(), "want an int");
        let prefixed = err.prefixed(PathSegment::Index(2));
        assert_eq!(prefixed.to_string(), "want an int @ data[2]");
    }
}
