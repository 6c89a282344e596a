//! # conform-schema — Declarative Schema Validation
//!
//! A [`Schema`] is built from a [`RawSchema`] tree: literals, types,
//! predicates, mappings, lists, tuples, sets, object shapes, key
//! [`Marker`]s and [`Msg`] overrides. Construction compiles the tree once
//! into immutable validator nodes; [`Schema::validate`] then applies them
//! to a [`Value`] and returns either the transformed value or every
//! failure found, each addressed by its [`conform_core::Path`].
//!
//! ```
//! use conform_schema::{Marker, RawSchema, Schema, Value, ValueType};
//!
//! let schema = Schema::new(RawSchema::mapping([
//!     (RawSchema::from(Marker::required("name")), RawSchema::from(ValueType::Str)),
//!     (RawSchema::from(Marker::optional("port").with_default(8080)), RawSchema::from(ValueType::Int)),
//! ]))
//! .unwrap();
//!
//! let out = schema.validate(&Value::map([("name", "api")])).unwrap();
//! assert_eq!(out, Value::map([("name", Value::from("api")), ("port", Value::Int(8080))]));
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Compile once.** All shape inspection of the schema happens in
//!    [`Schema::new`]. A malformed schema is a [`SchemaError`] at
//!    construction, never a surprise on first use.
//!
//! 2. **Aggregate, don't stop.** Independent failures in one mapping,
//!    sequence or object are all reported together as a
//!    [`MultipleInvalid`].
//!
//! 3. **Validation is a transformation.** Predicates may coerce, defaults are
//!    inserted, `Remove` keys and elements are dropped. The input is never
//!    mutated.
//!
//! 4. **Shareable.** A compiled `Schema` holds no mutable state and is
//!    `Clone + Send + Sync`.
//!
//! ## Crate Policy
//!
//! - Depends only on `conform-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests. Panics raised by caller
//!   predicates propagate unchanged.

mod compile;
mod mapping;
pub mod marker;
mod object;
pub mod raw;
pub mod schema;
mod sequence;

pub use marker::{DefaultValue, Marker, MarkerId, MarkerKind, Msg};
pub use raw::{ObjectShape, Predicate, PredicateError, RawSchema};
pub use schema::{ExtraPolicy, KeyMatching, Schema, SchemaOptions};

// Re-export the core types schemas are written against.
pub use conform_core::{
    ErrorKind, Invalid, MultipleInvalid, Object, Path, PathSegment, SchemaError, ValidationResult,
    Value, ValueMap, ValueSet, ValueType,
};
