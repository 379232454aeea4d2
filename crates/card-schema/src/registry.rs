//! The loaded model card schema.
//!
//! A `SchemaRegistry` is built once per process from the declarative schema
//! file and shared read-only between sessions. Before decoding, the file is
//! validated against a JSON Schema generated from [`SchemaFile`] with
//! [`schemars::schema_for!`], so a malformed field declaration is reported
//! with every offending path at once instead of failing on the first one.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use card_core::enums::{MetricGroup, Task};
use card_core::keys::KeyCodec;
use regex::Regex;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::field::{FieldSchema, SectionSchema};
use crate::tables;

const BUILTIN_SCHEMA: &str = include_str!("../schemas/model_card_schema.json");

/// Shape of a single section in the schema file.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
#[allow(dead_code)]
enum SectionDecl {
    Keys(Vec<String>),
    Fields(BTreeMap<String, FieldSchema>),
}

/// Shape of the whole schema file. Only used to generate its JSON Schema;
/// decoding walks the ordered JSON so declaration order survives.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(transparent)]
#[allow(dead_code)]
struct SchemaFile(BTreeMap<String, SectionDecl>);

/// The model card schema, in declaration order.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    sections: Vec<(String, SectionSchema)>,
    formats: HashMap<(String, String), Regex>,
}

impl SchemaRegistry {
    /// Load the schema embedded in this crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded file is malformed.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_json_str(BUILTIN_SCHEMA)
    }

    /// Load a schema file from disk.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Io` if the file cannot be read, and the errors of
    /// [`SchemaRegistry::from_json_str`] otherwise.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parse, validate, and decode a schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Parse` for invalid JSON,
    /// `SchemaError::ValidationFailed` when the document does not match the
    /// schema-file shape, and `SchemaError::InvalidFormat` when a field's
    /// `format` is not a valid regex.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Validate and decode an already-parsed schema document.
    ///
    /// # Errors
    ///
    /// See [`SchemaRegistry::from_json_str`].
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        validate_schema_file(value)?;

        let mut sections = Vec::new();
        let mut formats = HashMap::new();
        if let Value::Object(map) = value {
            for (name, decl) in map {
                let section = match decl {
                    Value::Array(keys) => SectionSchema::Keys(
                        keys.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect(),
                    ),
                    Value::Object(fields) => {
                        let mut decoded = Vec::with_capacity(fields.len());
                        for (key, props) in fields {
                            let field: FieldSchema = serde_json::from_value(props.clone())?;
                            if let Some(pattern) = &field.format {
                                let regex = compile_format(pattern).map_err(|e| {
                                    SchemaError::InvalidFormat {
                                        section: name.clone(),
                                        field: key.clone(),
                                        reason: e.to_string(),
                                    }
                                })?;
                                formats.insert((name.clone(), key.clone()), regex);
                            }
                            decoded.push((key.clone(), field));
                        }
                        SectionSchema::Fields(decoded)
                    }
                    _ => continue,
                };
                sections.push((name.clone(), section));
            }
        }

        tracing::debug!(
            sections = sections.len(),
            formats = formats.len(),
            "schema: registry loaded"
        );
        Ok(Self { sections, formats })
    }

    // ---- lookups ----

    /// Section names in declaration order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &SectionSchema)> {
        self.sections
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&SectionSchema> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, section)| section)
    }

    /// Section lookup that fails loudly, for callers that name a section
    /// explicitly (the `schema --section` command).
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if no such section is declared.
    pub fn require_section(&self, name: &str) -> Result<&SectionSchema, SchemaError> {
        self.section(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    #[must_use]
    pub fn field(&self, section: &str, name: &str) -> Option<&FieldSchema> {
        self.section(section)?.field(name)
    }

    /// Declared fields of `section`, empty if it is missing or a key list.
    #[must_use]
    pub fn fields(&self, section: &str) -> &[(String, FieldSchema)] {
        self.section(section)
            .map(SectionSchema::fields)
            .unwrap_or_default()
    }

    /// Fields of `section` that exist under `task`, in declaration order.
    #[must_use]
    pub fn applicable_fields(
        &self,
        section: &str,
        task: Option<Task>,
    ) -> Vec<(&str, &FieldSchema)> {
        self.fields(section)
            .iter()
            .filter(|(_, field)| field.applies_to(task))
            .map(|(key, field)| (key.as_str(), field))
            .collect()
    }

    /// Fields of one learning-architecture instance.
    #[must_use]
    pub fn architecture_fields(&self) -> &[(String, FieldSchema)] {
        self.fields(tables::LEARNING_ARCHITECTURE)
    }

    /// Technical-specification fields of one modality entry.
    #[must_use]
    pub fn io_fields(&self) -> &[(String, FieldSchema)] {
        self.fields(tables::IO_SPECIFICATIONS)
    }

    /// Per-evaluation fields.
    #[must_use]
    pub fn evaluation_fields(&self) -> &[(String, FieldSchema)] {
        self.fields(tables::EVALUATION_DATA)
    }

    /// Full flat keys of the hardware and software block.
    #[must_use]
    pub fn hw_and_sw_keys(&self) -> &[String] {
        self.section(tables::HW_AND_SW)
            .map(SectionSchema::keys)
            .unwrap_or_default()
    }

    /// Ordered sub-fields of each metric in `group`.
    #[must_use]
    pub const fn metric_fields(&self, group: MetricGroup) -> &'static [&'static str] {
        tables::metric_fields(group)
    }

    /// Compiled `format` pattern of a field, anchored at the start.
    #[must_use]
    pub fn format_regex(&self, section: &str, field: &str) -> Option<&Regex> {
        self.formats
            .get(&(section.to_string(), field.to_string()))
    }

    /// Key codec for this schema and the given evaluation slugs.
    #[must_use]
    pub fn codec<I>(&self, slugs: I) -> KeyCodec
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        KeyCodec::new(
            self.section_names().map(str::to_string),
            slugs,
            tables::all_metric_fields(),
        )
    }
}

/// JSON Schema describing a valid schema file.
///
/// # Errors
///
/// Returns `SchemaError::Generation` if the generated schema cannot be
/// serialised.
pub fn schema_file_json_schema() -> Result<Value, SchemaError> {
    serde_json::to_value(schema_for!(SchemaFile)).map_err(|e| SchemaError::Generation(e.to_string()))
}

fn validate_schema_file(instance: &Value) -> Result<(), SchemaError> {
    let schema = schema_file_json_schema()?;
    let validator =
        jsonschema::validator_for(&schema).map_err(|e| SchemaError::Generation(format!("{e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{e} at {}", e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::ValidationFailed { errors })
    }
}

/// Formats match at the start of the answer, like a prefix match.
fn compile_format(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}
