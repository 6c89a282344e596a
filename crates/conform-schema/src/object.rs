//! # Object Matcher
//!
//! Validates declared attributes of a class instance. The output is a copy
//! of the instance with each validated attribute replaced by its
//! transformed value; the caller's input is left untouched.

use std::collections::HashSet;

use conform_core::{
    ErrorKind, Invalid, MultipleInvalid, PathSegment, SchemaError, ValidationResult, Value,
};

use crate::compile::{compile, SchemaNode};
use crate::raw::ObjectShape;
use crate::schema::SchemaOptions;

/// Compiled attribute-wise schema for one class.
#[derive(Debug)]
pub(crate) struct ObjectNode {
    class: String,
    attrs: Vec<(String, SchemaNode)>,
}

impl ObjectNode {
    pub(crate) fn compile(shape: &ObjectShape, options: &SchemaOptions) -> Result<Self, SchemaError> {
        if shape.class().is_empty() {
            return Err(SchemaError::new("object schema needs a non-empty class name"));
        }
        let mut seen = HashSet::new();
        let mut attrs = Vec::with_capacity(shape.attrs().len());
        for (name, raw) in shape.attrs() {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::new(format!(
                    "duplicate attribute '{name}' in object schema for {}",
                    shape.class()
                )));
            }
            attrs.push((name.clone(), compile(raw, options)?));
        }
        Ok(Self {
            class: shape.class().to_string(),
            attrs,
        })
    }

    pub(crate) fn validate(&self, data: &Value) -> ValidationResult {
        let instance = match data {
            Value::Object(obj) if obj.class() == self.class => obj,
            other => {
                return Err(Invalid::new(
                    ErrorKind::Object,
                    format!("expected {} but got {}", self.class, other.type_name()),
                )
                .into())
            }
        };

        let mut out = instance.clone();
        let mut errors = MultipleInvalid::default();
        for (name, node) in &self.attrs {
            let Some(current) = instance.get_attr(name) else {
                continue;
            };
            match node.validate(current) {
                Ok(validated) => out.set_attr(name.as_str(), validated),
                Err(failed) => errors.merge(failed.prefixed(PathSegment::Attr(name.clone()))),
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(out))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Predicate;
    use conform_core::{Object, ValueType};

    fn point() -> ObjectNode {
        let shape = ObjectShape::new("Point")
            .attr("x", Predicate::coerce(ValueType::Int))
            .attr("y", ValueType::Int);
        ObjectNode::compile(&shape, &SchemaOptions::default()).expect("compiles")
    }

    #[test]
    fn test_attributes_written_back_on_copy() {
        let input = Value::from(Object::new("Point").with_attr("x", "3").with_attr("y", 4));
        let out = point().validate(&input).expect("valid");
        assert_eq!(
            out,
            Value::from(Object::new("Point").with_attr("x", 3).with_attr("y", 4))
        );
        // The input still carries the unconverted attribute.
        assert_eq!(
            input.as_object().and_then(|o| o.get_attr("x")),
            Some(&Value::from("3"))
        );
    }

    #[test]
    fn test_absent_attributes_are_skipped() {
        let input = Value::from(Object::new("Point").with_attr("y", 1));
        assert_eq!(point().validate(&input), Ok(input.clone()));
    }

    #[test]
    fn test_wrong_class_reports_actual_type() {
        let err = point()
            .validate(&Value::from(Object::new("Vector")))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected Point but got Vector");
        assert_eq!(err.first().map(Invalid::kind), Some(ErrorKind::Object));

        let err = point().validate(&Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "expected Point but got int");
    }

    #[test]
    fn test_attribute_errors_are_aggregated() {
        let input = Value::from(Object::new("Point").with_attr("x", "a").with_attr("y", "b"));
        let err = point().validate(&input).unwrap_err();
        let rendered: Vec<String> = err.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["expected int @ data['x']", "expected int @ data['y']"]
        );
    }

    #[test]
    fn test_compile_rejects_bad_shapes() {
        assert!(ObjectNode::compile(&ObjectShape::new(""), &SchemaOptions::default()).is_err());
        let dup = ObjectShape::new("P").attr("a", ValueType::Int).attr("a", ValueType::Str);
        assert!(ObjectNode::compile(&dup, &SchemaOptions::default()).is_err());
    }
}
