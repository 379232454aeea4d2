//! # card-engine
//!
//! Keeps the flat answer store and the structured model card document
//! consistent.
//!
//! - [`flatten`]: flat store to ordered document
//! - [`hydrate`]: document back into the flat store, section by section
//! - [`validate`]: required fields still unanswered under the active task
//! - [`formats`]: answers that do not match their field's `format`
//! - [`groups`]: the repeated-group strategies all three share
//! - [`session`]: one author's store plus the shared schema, with the
//!   questionnaire's turn operations
//!
//! Flatten and validation are total over any flat store. Hydration is the
//! only fallible engine and reports failures per top-level section.

pub mod error;
pub mod flatten;
pub mod formats;
pub mod groups;
pub mod hydrate;
pub mod session;
pub mod validate;

pub use error::{HydrateError, SessionError};
pub use flatten::flatten;
pub use formats::{FormatViolation, check_formats};
pub use hydrate::{HydrateReport, SectionFailure, hydrate};
pub use session::Session;
pub use validate::{Validator, compute_missing};
