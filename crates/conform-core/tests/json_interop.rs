//! # JSON Interoperability Tests
//!
//! Documents arriving as `serde_json` values must map onto the value model
//! predictably, and failures must serialize for transport to API clients.

use conform_core::{ErrorKind, Invalid, MultipleInvalid, Path, PathSegment, Value};
use serde_json::json;

#[test]
fn json_documents_become_value_trees() {
    let value = Value::from(json!({
        "name": "api",
        "replicas": 3,
        "ratio": 0.5,
        "tags": ["a", "b"],
        "owner": null
    }));
    let map = value.as_map().expect("a mapping");
    assert_eq!(map.len(), 5);
    assert_eq!(map.get(&Value::from("replicas")), Some(&Value::Int(3)));
    assert_eq!(map.get(&Value::from("ratio")), Some(&Value::Float(0.5)));
    assert_eq!(map.get(&Value::from("owner")), Some(&Value::Null));
    assert_eq!(
        map.get(&Value::from("tags")),
        Some(&Value::list(["a", "b"]))
    );
}

#[test]
fn values_serialize_back_to_json() {
    let value = Value::map([
        ("id", Value::Int(7)),
        ("members", Value::tuple([true, false])),
    ]);
    let rendered = serde_json::to_value(&value).expect("serializes");
    assert_eq!(rendered, json!({"id": 7, "members": [true, false]}));
}

#[test]
fn error_kinds_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_value(ErrorKind::RequiredField).expect("serializes"),
        json!("required_field")
    );
    let kind: ErrorKind = serde_json::from_value(json!("extra_key")).expect("parses");
    assert_eq!(kind, ErrorKind::ExtraKey);
}

#[test]
fn aggregate_display_shows_first_failure_with_path() {
    let errors: MultipleInvalid = vec![
        Invalid::new(ErrorKind::Type, "expected int")
            .with_path(Path::from(vec![PathSegment::from("a"), PathSegment::Index(2)])),
        Invalid::extra_key().with_path(Path::from(vec![PathSegment::from("b")])),
    ]
    .into_iter()
    .collect();
    assert_eq!(errors.to_string(), "expected int @ data['a'][2]");
    assert!(!errors.is_shallow());
}
