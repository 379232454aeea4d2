//! # card-schema
//!
//! Declarative schema registry for model cards.
//!
//! This crate provides:
//! - `SchemaRegistry`: the loaded schema, read-only after construction
//! - `FieldSchema` / `SectionSchema`: typed views of each section
//! - Validation of the schema file itself against a JSON Schema generated
//!   from those types
//! - Static tables: metric sub-fields per metric group, evaluator fields,
//!   splice anchors
//!
//! ## Architecture
//!
//! The schema file is JSON: `section -> field map | list of full keys`. The
//! embedded default lives in `schemas/model_card_schema.json`; a file on disk
//! can replace it. Field declaration order is preserved and drives the field
//! order of exported documents.

pub mod error;
pub mod field;
pub mod registry;
pub mod tables;

pub use error::SchemaError;
pub use field::{FieldSchema, SectionSchema};
pub use registry::SchemaRegistry;
