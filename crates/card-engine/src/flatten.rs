//! Flat store to structured document.
//!
//! The document is rebuilt from scratch on every call. Missing keys degrade
//! to `""` (or an empty list for repeated groups), so flattening never fails.
//!
//! Top-level order: `task`, `card_metadata`, `model_basic_information`,
//! `technical_specifications` (with `learning_architectures` and `hw_and_sw`
//! appended), `training_data` (per-modality list spliced after `url_info`),
//! `evaluations`, `other_considerations`.

use card_core::enums::{MetricGroup, Task};
use card_core::keys::{self, Address, KeyCodec};
use card_core::ordered::{Document, insert_after, insert_many_after};
use card_core::store::{FlatStore, is_truthy};
use card_schema::{SchemaRegistry, SectionSchema, tables};
use serde_json::Value;

use crate::groups::{
    self, ArchitectureInstance, EvaluationInstance, ModalityInstance, ModalityPair,
    RepeatedGroup,
};

/// Build the structured document for `store` under `task`.
#[must_use]
pub fn flatten(store: &FlatStore, schema: &SchemaRegistry, task: Option<Task>) -> Document {
    let evaluations = groups::evaluations(store);
    let codec = schema.codec(evaluations.iter().map(|evaluation| evaluation.slug.clone()));
    let pairs = groups::modality_pairs(store);

    let mut doc = Document::new();
    if let Some(task) = task {
        doc.insert(keys::TASK.to_string(), Value::from(task.as_str()));
    }

    for section in [tables::CARD_METADATA, tables::MODEL_BASIC_INFORMATION] {
        if let Some(declared) = schema.section(section) {
            doc.insert(
                section.to_string(),
                Value::Object(plain_section(store, section, declared, task)),
            );
        }
    }

    let mut technical = schema
        .section(tables::TECHNICAL_SPECIFICATIONS)
        .map(|declared| plain_section(store, tables::TECHNICAL_SPECIFICATIONS, declared, task))
        .unwrap_or_default();
    let architectures: Vec<Value> = groups::architectures(store)
        .into_iter()
        .map(|instance| Value::Object(architecture_entry(store, schema, &codec, instance, task)))
        .collect();
    technical.insert(
        tables::LEARNING_ARCHITECTURES_KEY.to_string(),
        Value::Array(architectures),
    );
    if let Some(declared) = schema.section(tables::HW_AND_SW) {
        technical.insert(
            tables::HW_AND_SW.to_string(),
            Value::Object(plain_section(store, tables::HW_AND_SW, declared, task)),
        );
    }
    doc.insert(
        tables::TECHNICAL_SPECIFICATIONS.to_string(),
        Value::Object(technical),
    );

    if let Some(declared) = schema.section(tables::TRAINING_DATA) {
        let training = plain_section(store, tables::TRAINING_DATA, declared, task);
        let io = io_entries(store, schema, pairs.iter().map(ModalityInstance::training));
        doc.insert(
            tables::TRAINING_DATA.to_string(),
            Value::Object(insert_after(
                &training,
                tables::IO_SPECIFICATIONS,
                Value::Array(io),
                tables::IO_ANCHOR,
            )),
        );
    }

    let entries: Vec<Value> = evaluations
        .iter()
        .map(|evaluation| Value::Object(evaluation_entry(store, schema, evaluation, &pairs, task)))
        .collect();
    doc.insert(tables::EVALUATIONS_KEY.to_string(), Value::Array(entries));

    if let Some(declared) = schema.section(tables::OTHER_CONSIDERATIONS) {
        doc.insert(
            tables::OTHER_CONSIDERATIONS.to_string(),
            Value::Object(plain_section(store, tables::OTHER_CONSIDERATIONS, declared, task)),
        );
    }

    tracing::debug!(
        sections = doc.len(),
        evaluations = evaluations.len(),
        modalities = pairs.len(),
        "flatten: document built"
    );
    doc
}

/// Field-map sections keep applicable fields; key-list sections copy every
/// key verbatim with the section prefix removed.
fn plain_section(
    store: &FlatStore,
    section: &str,
    declared: &SectionSchema,
    task: Option<Task>,
) -> Document {
    let mut out = Document::new();
    match declared {
        SectionSchema::Keys(full_keys) => {
            for full_key in full_keys {
                let field = full_key
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .unwrap_or(full_key);
                out.insert(field.to_string(), store.value_or_empty(full_key));
            }
        }
        SectionSchema::Fields(fields) => {
            for (field, props) in fields {
                if props.applies_to(task) {
                    let key = Address::plain(section, field.as_str()).encode();
                    out.insert(field.clone(), store.value_or_empty(&key));
                }
            }
        }
    }
    out
}

/// Schema fields in order, then extra fields stored under the instance's
/// key shape in store order, then `id`.
fn architecture_entry(
    store: &FlatStore,
    schema: &SchemaRegistry,
    codec: &KeyCodec,
    instance: ArchitectureInstance,
    task: Option<Task>,
) -> Document {
    let declared = schema.architecture_fields();
    let mut out = Document::new();
    for (field, props) in declared {
        if !props.applies_to(task) {
            continue;
        }
        let candidates = instance.candidates(field);
        let value = store
            .first_non_empty(&candidates)
            .cloned()
            .unwrap_or_else(|| store.value_or_empty(&candidates[0]));
        out.insert(field.clone(), value);
    }

    for (key, value) in store.iter() {
        let Some(Address::Architecture {
            index,
            field,
            legacy: false,
        }) = codec.decode(key)
        else {
            continue;
        };
        if index != instance.index
            || field == tables::ARCHITECTURE_ID
            || is_shadow(&field)
            || declared.iter().any(|(name, _)| *name == field)
        {
            continue;
        }
        out.insert(field, value.clone());
    }

    out.insert(
        tables::ARCHITECTURE_ID.to_string(),
        Value::from(instance.index),
    );
    out
}

fn is_shadow(field: &str) -> bool {
    field.ends_with("_list") || field.ends_with("_widget")
}

/// One `{entry, source, <io fields>}` object per modality instance.
fn io_entries<I>(store: &FlatStore, schema: &SchemaRegistry, instances: I) -> Vec<Value>
where
    I: IntoIterator<Item = ModalityInstance>,
{
    instances
        .into_iter()
        .map(|instance| {
            let mut entry = Document::new();
            entry.insert(
                tables::MODALITY_ENTRY.to_string(),
                Value::from(instance.pair.label.as_str()),
            );
            entry.insert(
                tables::MODALITY_SOURCE.to_string(),
                Value::from(instance.pair.source.as_str()),
            );
            for (field, _) in schema.io_fields() {
                let value = store
                    .first_non_empty(&instance.candidates(field))
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()));
                entry.insert(field.clone(), value);
            }
            Value::Object(entry)
        })
        .collect()
}

/// Evaluation fields derived elsewhere: metric selectors, metric sub-fields,
/// and per-modality fields.
pub(crate) fn is_derived_evaluation_field(schema: &SchemaRegistry, field: &str) -> bool {
    tables::is_metric_selector(field)
        || tables::all_metric_fields().contains(&field)
        || schema.io_fields().iter().any(|(name, _)| name == field)
}

fn evaluation_entry(
    store: &FlatStore,
    schema: &SchemaRegistry,
    evaluation: &EvaluationInstance,
    pairs: &[ModalityPair],
    task: Option<Task>,
) -> Document {
    let same_as_approved = is_truthy(store.get(&evaluation.key(tables::SAME_AS_APPROVED)));

    let mut entry = Document::new();
    entry.insert(
        tables::ENTRY_NAME.to_string(),
        Value::from(evaluation.name.as_str()),
    );
    for (field, _) in schema.applicable_fields(tables::EVALUATION_DATA, task) {
        if is_derived_evaluation_field(schema, field) {
            continue;
        }
        let key = match tables::approved_counterpart(field) {
            Some(approved) if same_as_approved => {
                Address::plain(tables::MODEL_BASIC_INFORMATION, approved).encode()
            }
            _ => evaluation.key(field),
        };
        entry.insert(field.to_string(), store.value_or_empty(&key));
    }

    let io = io_entries(
        store,
        schema,
        pairs.iter().map(|pair| evaluation.modality(pair)),
    );
    let entry = insert_after(
        &entry,
        tables::IO_SPECIFICATIONS,
        Value::Array(io),
        tables::IO_ANCHOR,
    );

    let mut metric_map = Document::new();
    for &group in MetricGroup::for_task(task) {
        let metrics: Vec<Value> = evaluation
            .metrics(store, group)
            .into_iter()
            .map(|metric| {
                let mut out = Document::new();
                out.insert(
                    tables::ENTRY_NAME.to_string(),
                    Value::from(metric.name.as_str()),
                );
                for field in schema.metric_fields(group) {
                    out.insert((*field).to_string(), store.value_or_empty(&metric.key(field)));
                }
                Value::Object(out)
            })
            .collect();
        metric_map.insert(group.as_str().to_string(), Value::Array(metrics));
    }
    insert_many_after(&entry, &metric_map, tables::METRICS_ANCHOR)
}
