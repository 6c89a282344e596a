//! # conform-core — Foundational Types for conform
//!
//! This crate defines the data that flows through every schema: the dynamic
//! [`Value`] tree being validated, the [`Path`] addressing a failure site,
//! and the error model ([`Invalid`], [`MultipleInvalid`], [`SchemaError`]).
//! Every other crate in the workspace depends on `conform-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One value model.** `Value` is a closed enum. Schemas dispatch on it
//!    with exhaustive `match`es, never on run-time type names.
//!
//! 2. **Every value is a key.** `Value` is `Eq + Hash` (floats included), so
//!    mappings may be keyed by integers, tuples, or anything else.
//!
//! 3. **One failure shape.** Validation returns `MultipleInvalid` at every
//!    boundary; a single failure is a one-element aggregate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `conform-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod path;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{ErrorKind, Invalid, MultipleInvalid, SchemaError, ValidationResult};
pub use path::{Path, PathSegment};
pub use value::{Object, Value, ValueMap, ValueSet, ValueType};
