//! Static tables that sit beside the schema file.
//!
//! Section identifiers, splice anchors, the metric sub-fields of each metric
//! group, and the evaluator fields that mirror the approved-by fields.

use card_core::enums::MetricGroup;

pub const CARD_METADATA: &str = "card_metadata";
pub const MODEL_BASIC_INFORMATION: &str = "model_basic_information";
pub const TECHNICAL_SPECIFICATIONS: &str = "technical_specifications";
pub const TRAINING_DATA: &str = card_core::keys::TRAINING_SECTION;
pub const OTHER_CONSIDERATIONS: &str = "other_considerations";

pub const LEARNING_ARCHITECTURE: &str = "learning_architecture";
pub const HW_AND_SW: &str = "hw_and_sw";
pub const IO_SPECIFICATIONS: &str = "inputs_outputs_technical_specifications";
pub const EVALUATION_DATA: &str = "evaluation_data";

/// Sections that describe repeated-group instances rather than document
/// sections of their own.
pub const AUXILIARY_SECTIONS: [&str; 4] = [
    LEARNING_ARCHITECTURE,
    HW_AND_SW,
    IO_SPECIFICATIONS,
    EVALUATION_DATA,
];

// ---- document keys ----

pub const LEARNING_ARCHITECTURES_KEY: &str = "learning_architectures";
pub const EVALUATIONS_KEY: &str = "evaluations";
pub const ARCHITECTURE_ID: &str = "id";
pub const ENTRY_NAME: &str = "name";
pub const MODALITY_ENTRY: &str = "entry";
pub const MODALITY_SOURCE: &str = "source";

/// Field the per-modality list is spliced after, in training data and in each
/// evaluation.
pub const IO_ANCHOR: &str = "url_info";
/// Evaluation field the metric-group map is spliced after.
pub const METRICS_ANCHOR: &str = "additional_patient_info_ev";

// ---- evaluator identity ----

/// Evaluation flag that waives the evaluator fields.
pub const SAME_AS_APPROVED: &str = "evaluated_same_as_approved";

/// Evaluator field paired with the `model_basic_information` field it copies
/// when the evaluation was done by the approvers.
pub const EVALUATOR_FIELDS: [(&str, &str); 3] = [
    ("evaluated_by_name", "clearance_approved_by_name"),
    ("evaluated_by_institution", "clearance_approved_by_institution"),
    (
        "evaluated_by_contact_email",
        "clearance_approved_by_contact_email",
    ),
];

/// Approved-by field an evaluator field mirrors.
#[must_use]
pub fn approved_counterpart(field: &str) -> Option<&'static str> {
    EVALUATOR_FIELDS
        .iter()
        .find(|(evaluator, _)| *evaluator == field)
        .map(|(_, approved)| *approved)
}

/// Architecture fields also stored under the legacy
/// `technical_specifications_learning_architecture_{i}_` prefix.
pub const LEGACY_ARCHITECTURE_FIELDS: [&str; 1] = ["architecture_figure"];

// ---- metric groups ----

/// Ordered sub-fields recorded for each metric in `group`.
#[must_use]
pub const fn metric_fields(group: MetricGroup) -> &'static [&'static str] {
    match group {
        MetricGroup::Ism => &[
            "on_volume",
            "registration",
            "sample_data",
            "mean_data",
            "figure_appendix",
        ],
        MetricGroup::GmSeg => &[
            "metric_specifications",
            "on_volume",
            "sample_data",
            "mean_data",
            "figure_appendix",
        ],
        MetricGroup::DoseDm | MetricGroup::DoseDmSeg | MetricGroup::DoseDmDp => &[
            "metric_specifications",
            "on_volume",
            "registration",
            "treatment_modality",
            "dose_engine",
            "sample_data",
            "mean_data",
            "figure_appendix",
        ],
        MetricGroup::MetricsOther => &[
            "metric_specifications",
            "sample_data",
            "mean_data",
            "figure_appendix",
        ],
    }
}

/// Every metric sub-field across all groups, first-seen order, no repeats.
#[must_use]
pub fn all_metric_fields() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for group in MetricGroup::ALL {
        for &field in metric_fields(group) {
            if !out.contains(&field) {
                out.push(field);
            }
        }
    }
    out
}

/// `true` for evaluation fields that select a metric group (`type_*`).
#[must_use]
pub fn is_metric_selector(field: &str) -> bool {
    MetricGroup::ALL.iter().any(|group| group.as_str() == field)
}

/// Short metric name shown in labels: the part before ` (`.
#[must_use]
pub fn short_metric_name(metric: &str) -> &str {
    metric.split(" (").next().unwrap_or(metric)
}
