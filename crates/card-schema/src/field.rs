//! Field and section declarations.

use card_core::enums::{FieldType, Task};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declaration of one questionnaire field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FieldSchema {
    pub label: Option<String>,
    pub description: String,
    pub example: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Tasks the field applies to. `None` or empty applies to every task.
    pub model_types: Option<Vec<Task>>,
    pub options: Vec<String>,
    /// Regex the answer must match at its start.
    pub format: Option<String>,
    pub format_description: Option<String>,
}

impl FieldSchema {
    /// Whether the field exists under `task`.
    ///
    /// Task-restricted fields never apply when no task is selected.
    #[must_use]
    pub fn applies_to(&self, task: Option<Task>) -> bool {
        match self.model_types.as_deref() {
            None | Some([]) => true,
            Some(allowed) => task.is_some_and(|task| allowed.contains(&task)),
        }
    }

    #[must_use]
    pub fn required_for(&self, task: Option<Task>) -> bool {
        self.required && self.applies_to(task)
    }

    /// Label or key with underscores as spaces, title-cased.
    #[must_use]
    pub fn display_label(&self, key: &str) -> String {
        title_case(&self.label.as_deref().unwrap_or(key).replace('_', " "))
    }

    /// Label as declared, falling back to the title-cased key.
    #[must_use]
    pub fn plain_label(&self, key: &str) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| title_case(&key.replace('_', " ")))
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.field_type, FieldType::Image)
    }

    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self.field_type, FieldType::Date)
    }
}

/// One section of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSchema {
    /// Ordered field declarations.
    Fields(Vec<(String, FieldSchema)>),
    /// Fully-qualified flat keys copied verbatim.
    Keys(Vec<String>),
}

impl SectionSchema {
    /// Declared fields in order. Key-list sections have none.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldSchema)] {
        match self {
            Self::Fields(fields) => fields,
            Self::Keys(_) => &[],
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, field)| field)
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Fields(_) => &[],
            Self::Keys(keys) => keys,
        }
    }
}

/// Capitalise the first letter of every word and lowercase the rest.
///
/// A word starts after any non-alphabetic character.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
