//! # card-core
//!
//! Core types shared across the model card crates.
//!
//! This crate provides the foundational pieces the engine is built from:
//! - Task, field type, IO source, and metric group enums
//! - Date normalization to and from the canonical `YYYYMMDD` form
//! - Ordered-document splicing (`insert_after`, `insert_many_after`)
//! - The key namespace codec mapping logical addresses to flat-store keys
//! - The flat answer store and its typed accessors
//! - Missing-field report types
//! - Cross-cutting error types

pub mod dates;
pub mod enums;
pub mod errors;
pub mod keys;
pub mod ordered;
pub mod report;
pub mod store;

pub use ordered::Document;
pub use store::FlatStore;
