//! # conform-humanize — Readable Validation Reports
//!
//! Renders the failures of a [`conform_schema::Schema`] for people: each
//! failure message is paired with the offending value, looked up in the
//! original input by the failure's path.
//!
//! This crate only consumes the error structure and the input. It has no
//! access to the schema internals and never changes validation outcomes.
//!
//! ## Crate Policy
//!
//! - Rendering is total: an unresolvable path renders `<unavailable>`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod humanize;

pub use humanize::{
    humanize_error, humanize_invalid, validate_with_humanized_errors, HumanizedError,
    MAX_VALIDATION_ERROR_ITEM_LENGTH,
};
