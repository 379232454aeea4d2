//! Answers that do not match their field's declared `format`.

use card_core::enums::Task;
use card_core::keys::Address;
use card_core::store::FlatStore;
use card_schema::{SchemaRegistry, tables};
use serde::Serialize;

use crate::flatten::is_derived_evaluation_field;
use crate::groups::{self, RepeatedGroup};

const DEFAULT_MESSAGE: &str = "Invalid format.";

/// One stored answer that fails its format pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatViolation {
    pub section: String,
    pub label: String,
    pub value: String,
    pub message: String,
}

/// Check every non-empty string answer that has a format pattern.
///
/// Covers the static sections and each registered evaluation. Fields that do
/// not apply to `task` are not checked.
#[must_use]
pub fn check_formats(
    schema: &SchemaRegistry,
    store: &FlatStore,
    task: Option<Task>,
) -> Vec<FormatViolation> {
    let mut out = Vec::new();

    for section in schema.section_names() {
        if tables::AUXILIARY_SECTIONS.contains(&section) {
            continue;
        }
        for (name, field) in schema.applicable_fields(section, task) {
            let Some(pattern) = schema.format_regex(section, name) else {
                continue;
            };
            let key = Address::plain(section, name).encode();
            if let Some(value) = non_empty_text(store, &key)
                && !pattern.is_match(value)
            {
                out.push(FormatViolation {
                    section: section.to_string(),
                    label: field.display_label(name),
                    value: value.to_string(),
                    message: message(field.format_description.as_deref()),
                });
            }
        }
    }

    let evaluation_fields = schema.applicable_fields(tables::EVALUATION_DATA, task);
    for evaluation in groups::evaluations(store) {
        for (name, field) in &evaluation_fields {
            if is_derived_evaluation_field(schema, name) {
                continue;
            }
            let Some(pattern) = schema.format_regex(tables::EVALUATION_DATA, name) else {
                continue;
            };
            if let Some(value) = non_empty_text(store, &evaluation.key(name))
                && !pattern.is_match(value)
            {
                out.push(FormatViolation {
                    section: tables::EVALUATION_DATA.to_string(),
                    label: evaluation.label(&field.display_label(name)),
                    value: value.to_string(),
                    message: message(field.format_description.as_deref()),
                });
            }
        }
    }

    tracing::debug!(count = out.len(), "formats: checked");
    out
}

fn non_empty_text<'s>(store: &'s FlatStore, key: &str) -> Option<&'s str> {
    store
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn message(description: Option<&str>) -> String {
    description.unwrap_or(DEFAULT_MESSAGE).to_string()
}
