//! The flat answer store.
//!
//! [`FlatStore`] is the single mutable mapping from flat key to answer that a
//! session owns. It keeps insertion order, which is the order modality
//! discovery and architecture extras are reported in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::Task;
use crate::errors::CoreError;
use crate::keys::{self, Address};

/// Stored record for an uploaded image field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub name: String,
    pub path: PathBuf,
}

/// Insertion-ordered map of flat keys to answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatStore {
    values: Map<String, Value>,
}

impl FlatStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON snapshot of a store.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StoreShape` if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(CoreError::StoreShape(json_kind(&other).to_string())),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_address(&self, address: &Address) -> Option<&Value> {
        self.values.get(&address.encode())
    }

    /// Stored value, or `""` when the key is absent.
    #[must_use]
    pub fn value_or_empty(&self, key: &str) -> Value {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))
    }

    /// First non-empty value among `candidates`, tried in order.
    #[must_use]
    pub fn first_non_empty<'a, I>(&self, candidates: I) -> Option<&Value>
    where
        I: IntoIterator<Item = &'a String>,
    {
        candidates
            .into_iter()
            .filter_map(|key| self.values.get(key))
            .find(|value| !is_empty_value(Some(value)))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Insert `value` and, when it is a list, mirror it at the `_list` shadow.
    pub fn insert_with_shadow(&mut self, key: &str, value: Value) {
        let shadow = value.is_array().then(|| value.clone());
        self.values.insert(key.to_string(), value);
        if let Some(shadow) = shadow {
            self.values.insert(keys::list_shadow(key), shadow);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.values.retain(|key, value| keep(key, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ---- typed views ----

    /// Active task, if one is stored and recognised.
    #[must_use]
    pub fn task(&self) -> Option<Task> {
        self.values
            .get(keys::TASK)
            .and_then(Value::as_str)
            .and_then(|name| name.parse().ok())
    }

    /// Registered evaluation names in registration order.
    #[must_use]
    pub fn evaluation_names(&self) -> Vec<String> {
        self.string_list(keys::EVALUATION_FORMS)
    }

    /// Number of registered learning architectures.
    ///
    /// The registry is normally a map with one entry per instance; a list is
    /// accepted as well. Any other shape counts as zero, so the count never
    /// exceeds the number of stored entries.
    #[must_use]
    pub fn architecture_count(&self) -> usize {
        match self.values.get(keys::ARCHITECTURE_FORMS) {
            Some(Value::Object(forms)) => forms.len(),
            Some(Value::Array(forms)) => forms.len(),
            _ => 0,
        }
    }

    /// String items of the list stored at `key`. Non-string items are skipped.
    #[must_use]
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.values
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Upload record stored for the image field at `key`.
    #[must_use]
    pub fn upload(&self, key: &str) -> Option<UploadRecord> {
        let record = self.values.get(keys::UPLOADS)?.get(key)?;
        serde_json::from_value(record.clone()).ok()
    }

    /// Record an upload for the image field at `key`.
    pub fn record_upload(&mut self, key: &str, record: &UploadRecord) {
        let uploads = self
            .values
            .entry(keys::UPLOADS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !uploads.is_object() {
            *uploads = Value::Object(Map::new());
        }
        if let Value::Object(uploads) = uploads
            && let Ok(record) = serde_json::to_value(record)
        {
            uploads.insert(key.to_string(), record);
        }
    }
}

impl From<Map<String, Value>> for FlatStore {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// `true` for an absent value, `null`, `""`, `[]`, or `{}`.
///
/// `false` and `0` are answers, not gaps.
#[must_use]
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => false,
    }
}

/// `true` for boolean `true`, a non-zero number, or the strings `true`,
/// `yes`, and `1` in any case.
#[must_use]
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => {
            let text = text.trim();
            ["true", "yes", "1"]
                .iter()
                .any(|word| text.eq_ignore_ascii_case(word))
        }
        _ => false,
    }
}

/// Short JSON type name used in error messages.
#[must_use]
pub const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
