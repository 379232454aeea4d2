//! Task, field type, IO source, and metric group enums.
//!
//! `Task` serializes with the human-readable names stored in model cards
//! (`"Image-to-Image translation"`, `"Dose prediction"`); the remaining enums
//! use the `snake_case` identifiers that appear inside flat-store keys.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// The model card category selected once per session.
///
/// Gates which schema fields apply (via `model_types`) and which metric
/// groups an evaluation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Task {
    #[serde(
        rename = "Image-to-Image translation",
        alias = "image-to-image translation"
    )]
    ImageToImageTranslation,
    #[serde(alias = "segmentation")]
    Segmentation,
    #[serde(rename = "Dose prediction", alias = "dose prediction")]
    DosePrediction,
    #[serde(alias = "other")]
    Other,
}

impl Task {
    pub const ALL: [Self; 4] = [
        Self::ImageToImageTranslation,
        Self::Segmentation,
        Self::DosePrediction,
        Self::Other,
    ];

    /// Return the display name stored in documents and the flat store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImageToImageTranslation => "Image-to-Image translation",
            Self::Segmentation => "Segmentation",
            Self::DosePrediction => "Dose prediction",
            Self::Other => "Other",
        }
    }

    /// Metric groups an evaluation carries under this task.
    #[must_use]
    pub const fn metric_groups(self) -> &'static [MetricGroup] {
        match self {
            Self::ImageToImageTranslation => &[MetricGroup::Ism, MetricGroup::DoseDm],
            Self::Segmentation => &[MetricGroup::GmSeg, MetricGroup::DoseDmSeg],
            Self::DosePrediction => &[MetricGroup::DoseDmDp],
            Self::Other => &[MetricGroup::MetricsOther],
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = CoreError;

    /// Case-insensitive, whitespace-trimmed match on the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|task| task.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownTask(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Widget type of a schema field.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Select,
    Image,
    Date,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::Image => "image",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IoSource
// ---------------------------------------------------------------------------

/// Whether a modality entry describes a model input or a model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IoSource {
    ModelInputs,
    ModelOutputs,
}

impl IoSource {
    pub const ALL: [Self; 2] = [Self::ModelInputs, Self::ModelOutputs];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModelInputs => "model_inputs",
            Self::ModelOutputs => "model_outputs",
        }
    }
}

impl fmt::Display for IoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IoSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| CoreError::UnknownSource(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MetricGroup
// ---------------------------------------------------------------------------

/// A family of evaluation metrics, selected per task.
///
/// The identifier doubles as the evaluation field holding the list of metric
/// names the author added (`evaluation_{slug}_{group}_list`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum MetricGroup {
    /// Image similarity metrics.
    #[serde(rename = "type_ism")]
    Ism,
    /// Dose metrics for image-to-image translation.
    #[serde(rename = "type_dose_dm")]
    DoseDm,
    /// Geometric segmentation metrics.
    #[serde(rename = "type_gm_seg")]
    GmSeg,
    /// Dose metrics for segmentation.
    #[serde(rename = "type_dose_dm_seg")]
    DoseDmSeg,
    /// Dose metrics for dose prediction.
    #[serde(rename = "type_dose_dm_dp")]
    DoseDmDp,
    /// Free-form metrics for the "Other" task.
    #[serde(rename = "type_metrics_other")]
    MetricsOther,
}

impl MetricGroup {
    pub const ALL: [Self; 6] = [
        Self::Ism,
        Self::DoseDm,
        Self::GmSeg,
        Self::DoseDmSeg,
        Self::DoseDmDp,
        Self::MetricsOther,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ism => "type_ism",
            Self::DoseDm => "type_dose_dm",
            Self::GmSeg => "type_gm_seg",
            Self::DoseDmSeg => "type_dose_dm_seg",
            Self::DoseDmDp => "type_dose_dm_dp",
            Self::MetricsOther => "type_metrics_other",
        }
    }

    /// Groups applicable to an optional task. No task means no groups.
    #[must_use]
    pub fn for_task(task: Option<Task>) -> &'static [Self] {
        task.map(Task::metric_groups).unwrap_or_default()
    }
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricGroup {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| CoreError::UnknownMetricGroup(s.to_string()))
    }
}
