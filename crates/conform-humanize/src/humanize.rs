//! # Failure Rendering
//!
//! Turns a [`MultipleInvalid`] into text a person can act on. Each failure
//! is shown with the value found at its path in the original input, so the
//! reader sees what was rejected as well as why.
//!
//! Paths are re-resolved against the input independently of the schema:
//! mappings by key, lists and tuples by index, objects by attribute. A path
//! that cannot be followed renders `<unavailable>`; rendering never fails.

use conform_core::{Invalid, MultipleInvalid, PathSegment, Value};
use conform_schema::Schema;
use thiserror::Error;

/// Default cap on the rendered length of one offending value.
pub const MAX_VALIDATION_ERROR_ITEM_LENGTH: usize = 500;

const UNAVAILABLE: &str = "<unavailable>";

/// A rejected input, with the rendered report and the failures behind it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HumanizedError {
    message: String,
    errors: MultipleInvalid,
}

impl HumanizedError {
    /// The rendered report.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying failures.
    pub fn errors(&self) -> &MultipleInvalid {
        &self.errors
    }

    /// Consume the error, yielding the underlying failures.
    pub fn into_errors(self) -> MultipleInvalid {
        self.errors
    }
}

/// Follow `segments` from `data`. Group segments never resolve.
fn resolve<'a>(data: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    segments.iter().try_fold(data, |current, segment| match segment {
        PathSegment::Key(key) => current.as_map()?.get(key),
        PathSegment::Index(index) => current.as_seq()?.get(*index),
        PathSegment::Attr(name) => current.as_object()?.get_attr(name),
        PathSegment::Group(_) => None,
    })
}

fn truncate(repr: String, max_len: usize) -> String {
    match repr.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &repr[..cut]),
        None => repr,
    }
}

/// Render one failure against the input it was raised for.
///
/// ```text
/// <message>
/// Got value: <repr>
///  @ data[<path>]
/// ```
///
/// The path line is omitted for a failure at the root.
pub fn humanize_invalid(data: &Value, error: &Invalid, max_len: usize) -> String {
    let got = match resolve(data, error.path().segments()) {
        Some(value) => truncate(value.to_string(), max_len),
        None => UNAVAILABLE.to_string(),
    };
    if error.path().is_empty() {
        format!("{}\nGot value: {got}", error.message())
    } else {
        format!("{}\nGot value: {got}\n @ {}", error.message(), error.path())
    }
}

/// Render every failure of `errors`, in order, one block per failure.
///
/// Reports with more than one failure start with a `Multiple errors:` line.
pub fn humanize_error(data: &Value, errors: &MultipleInvalid, max_len: usize) -> String {
    let blocks: Vec<String> = errors
        .iter()
        .map(|error| humanize_invalid(data, error, max_len))
        .collect();
    if blocks.len() > 1 {
        format!("Multiple errors:\n{}", blocks.join("\n"))
    } else {
        blocks.join("\n")
    }
}

/// Validate `data`, rendering any failures with [`humanize_error`].
pub fn validate_with_humanized_errors(
    schema: &Schema,
    data: &Value,
    max_len: usize,
) -> Result<Value, HumanizedError> {
    schema.validate(data).map_err(|errors| HumanizedError {
        message: humanize_error(data, &errors, max_len),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::{ErrorKind, Object, Path};

    fn at(segments: Vec<PathSegment>, message: &str) -> Invalid {
        Invalid::new(ErrorKind::Invalid, message).with_path(Path::from(segments))
    }

    #[test]
    fn test_resolves_keys_indices_and_attrs() {
        let data = Value::map([(
            "rows",
            Value::list([Value::from(Object::new("Row").with_attr("id", "x"))]),
        )]);
        let error = at(
            vec![
                PathSegment::from("rows"),
                PathSegment::Index(0),
                PathSegment::Attr("id".into()),
            ],
            "expected int",
        );
        assert_eq!(
            humanize_invalid(&data, &error, MAX_VALIDATION_ERROR_ITEM_LENGTH),
            "expected int\nGot value: 'x'\n @ data['rows'][0]['id']"
        );
    }

    #[test]
    fn test_root_failure_has_no_path_line() {
        let error = Invalid::new(ErrorKind::Dict, "expected a dictionary");
        assert_eq!(
            humanize_invalid(&Value::Int(3), &error, 10),
            "expected a dictionary\nGot value: 3"
        );
    }

    #[test]
    fn test_unresolvable_paths_render_unavailable() {
        let data = Value::map([("a", 1)]);
        for segments in [
            vec![PathSegment::from("missing")],
            vec![PathSegment::from("a"), PathSegment::Index(0)],
            vec![PathSegment::Group("g".into())],
        ] {
            let rendered = humanize_invalid(&data, &at(segments, "bad"), 50);
            assert!(rendered.contains("Got value: <unavailable>"), "{rendered}");
        }
    }

    #[test]
    fn test_long_values_are_truncated() {
        let data = Value::map([("a", "x".repeat(20))]);
        let error = at(vec![PathSegment::from("a")], "bad");
        assert_eq!(
            humanize_invalid(&data, &error, 5),
            "bad\nGot value: 'xxxx...\n @ data['a']"
        );
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate("ééé".to_string(), 2), "éé...");
        assert_eq!(truncate("ab".to_string(), 2), "ab");
    }

    #[test]
    fn test_multiple_errors_header() {
        let data = Value::map([("a", 1), ("b", 2)]);
        let errors: MultipleInvalid = vec![
            at(vec![PathSegment::from("a")], "first"),
            at(vec![PathSegment::from("b")], "second"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            humanize_error(&data, &errors, 100),
            "Multiple errors:\nfirst\nGot value: 1\n @ data['a']\nsecond\nGot value: 2\n @ data['b']"
        );
    }
}
