//! # Sequence Matcher
//!
//! Lists, tuples and sets share one matcher. Each element is tried against
//! the alternatives in declaration order and the first success wins.
//!
//! An alternative that fails deeper than the element itself stops the
//! search for that element: the data clearly had the right shape and
//! reporting the specific inner failure beats trying unrelated
//! alternatives. A `Remove` alternative that accepts an element drops it.

use conform_core::{
    ErrorKind, Invalid, MultipleInvalid, PathSegment, SchemaError, ValidationResult, Value,
    ValueSet,
};

use crate::compile::{compile, SchemaNode};
use crate::raw::RawSchema;
use crate::schema::SchemaOptions;

/// Which container a sequence schema accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceKind {
    List,
    Tuple,
    Set,
}

impl SequenceKind {
    fn shape_error(self) -> Invalid {
        match self {
            SequenceKind::List => Invalid::new(ErrorKind::Sequence, "expected a list"),
            SequenceKind::Tuple => Invalid::new(ErrorKind::Sequence, "expected a tuple"),
            SequenceKind::Set => Invalid::new(ErrorKind::Set, "expected a set"),
        }
    }
}

/// Outcome of matching one element.
enum Element {
    Keep(Value),
    Drop,
}

/// Compiled list, tuple or set schema.
#[derive(Debug)]
pub(crate) struct SequenceNode {
    kind: SequenceKind,
    alternatives: Vec<SchemaNode>,
}

impl SequenceNode {
    pub(crate) fn compile(
        kind: SequenceKind,
        alternatives: &[RawSchema],
        options: &SchemaOptions,
    ) -> Result<Self, SchemaError> {
        let alternatives = alternatives
            .iter()
            .map(|alt| compile(alt, options))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { kind, alternatives })
    }

    pub(crate) fn validate(&self, data: &Value) -> ValidationResult {
        match (self.kind, data) {
            (SequenceKind::List, Value::List(items)) => self.validate_items(items).map(Value::List),
            (SequenceKind::Tuple, Value::Tuple(items)) => {
                self.validate_items(items).map(Value::Tuple)
            }
            (SequenceKind::Set, Value::Set(members)) => self.validate_set(members),
            _ => Err(self.kind.shape_error().into()),
        }
    }

    /// Match one element. On failure, yields the errors of the last
    /// alternative tried, relative to the element.
    fn match_element(&self, item: &Value) -> Result<Element, MultipleInvalid> {
        let mut last = MultipleInvalid::from(Invalid::not_valid());
        for alternative in &self.alternatives {
            match alternative.validate(item) {
                Ok(_) if alternative.is_remove() => return Ok(Element::Drop),
                Ok(value) => return Ok(Element::Keep(value)),
                Err(errors) => {
                    let deep = errors.iter().any(|e| !e.path().is_empty());
                    last = errors;
                    if deep {
                        break;
                    }
                }
            }
        }
        Err(last)
    }

    fn validate_items(&self, items: &[Value]) -> ValidationResult<Vec<Value>> {
        if self.alternatives.is_empty() {
            return if items.is_empty() {
                Ok(Vec::new())
            } else {
                Err(Invalid::not_valid().into())
            };
        }

        let mut out = Vec::with_capacity(items.len());
        let mut errors = MultipleInvalid::default();
        for (index, item) in items.iter().enumerate() {
            match self.match_element(item) {
                Ok(Element::Keep(value)) => out.push(value),
                Ok(Element::Drop) => tracing::trace!(index, "removing sequence element"),
                Err(failed) => errors.merge(failed.prefixed(PathSegment::Index(index))),
            }
        }
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    /// Sets carry no positions, so each failing member is reported once at
    /// the set itself.
    fn validate_set(&self, members: &ValueSet) -> ValidationResult {
        if self.alternatives.is_empty() {
            return if members.is_empty() {
                Ok(Value::Set(ValueSet::new()))
            } else {
                Err(Invalid::not_valid().into())
            };
        }

        let mut out = ValueSet::new();
        let mut errors = MultipleInvalid::default();
        for member in members {
            match self.match_element(member) {
                Ok(Element::Keep(value)) => {
                    out.insert(value);
                }
                Ok(Element::Drop) => {}
                Err(_) => errors.push(Invalid::new(ErrorKind::Value, "invalid value in set")),
            }
        }
        if errors.is_empty() {
            Ok(Value::Set(out))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Marker;
    use crate::raw::Predicate;
    use conform_core::ValueType;

    fn list(alternatives: Vec<RawSchema>) -> SequenceNode {
        SequenceNode::compile(SequenceKind::List, &alternatives, &SchemaOptions::default())
            .expect("compiles")
    }

    #[test]
    fn test_first_matching_alternative_wins() {
        let node = list(vec![
            RawSchema::from("one"),
            RawSchema::from("two"),
            RawSchema::from(ValueType::Int),
        ]);
        assert_eq!(
            node.validate(&Value::list([Value::from("one"), Value::Int(2)])),
            Ok(Value::list([Value::from("one"), Value::Int(2)]))
        );
        let err = node.validate(&Value::list(["three"])).unwrap_err();
        assert_eq!(err.to_string(), "expected int @ data[0]");
    }

    #[test]
    fn test_every_failing_element_is_reported() {
        let node = list(vec![RawSchema::from(ValueType::Int)]);
        let err = node
            .validate(&Value::list([Value::from("a"), Value::Int(1), Value::from("b")]))
            .unwrap_err();
        let paths: Vec<String> = err.iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["data[0]", "data[2]"]);
    }

    #[test]
    fn test_remove_alternative_drops_elements() {
        let node = list(vec![
            RawSchema::from(ValueType::Int),
            RawSchema::from(Marker::remove(ValueType::Float)),
            RawSchema::from(Predicate::extra()),
        ]);
        let input = Value::list([
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Float(4.0),
            Value::Int(5),
            Value::Float(6.0),
            Value::from("7"),
        ]);
        assert_eq!(
            node.validate(&input),
            Ok(Value::list([
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(5),
                Value::from("7"),
            ]))
        );
    }

    #[test]
    fn test_empty_alternatives_accept_only_empty_input() {
        let node = list(Vec::new());
        assert_eq!(node.validate(&Value::list(Vec::<Value>::new())), Ok(Value::list(Vec::<Value>::new())));
        let err = node.validate(&Value::list([1])).unwrap_err();
        assert_eq!(err.to_string(), "not a valid value");
    }

    #[test]
    fn test_shape_errors() {
        let tuple = SequenceNode::compile(
            SequenceKind::Tuple,
            &[RawSchema::from(ValueType::Int)],
            &SchemaOptions::default(),
        )
        .expect("compiles");
        let err = tuple.validate(&Value::list([1])).unwrap_err();
        assert_eq!(err.to_string(), "expected a tuple");
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Sequence));
        assert_eq!(tuple.validate(&Value::tuple([1])), Ok(Value::tuple([1])));

        let set = SequenceNode::compile(
            SequenceKind::Set,
            &[RawSchema::from(ValueType::Int)],
            &SchemaOptions::default(),
        )
        .expect("compiles");
        let err = set.validate(&Value::list([1])).unwrap_err();
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Set));
    }

    #[test]
    fn test_set_members_are_transformed() {
        let set = SequenceNode::compile(
            SequenceKind::Set,
            &[RawSchema::from(Predicate::coerce(ValueType::Int))],
            &SchemaOptions::default(),
        )
        .expect("compiles");
        assert_eq!(
            set.validate(&Value::set(["1", "2"])),
            Ok(Value::set([Value::Int(1), Value::Int(2)]))
        );
        let err = set.validate(&Value::set(["1", "x"])).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.to_string(), "invalid value in set");
    }

    #[test]
    fn test_deep_failure_stops_alternative_search() {
        let node = list(vec![
            RawSchema::mapping([("a", ValueType::Int)]),
            RawSchema::from(Predicate::extra()),
        ]);
        let err = node
            .validate(&Value::list([Value::map([("a", "x")])]))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected int @ data[0]['a']");
    }
}
