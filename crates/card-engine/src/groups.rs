//! Repeated-group strategies.
//!
//! Each kind of repeated group has its own identity scheme and key family.
//! Instances are discovered from a typed view of the flat store and then
//! addressed through [`RepeatedGroup`], so the flatten, hydrate, and
//! validation engines never build keys for a group themselves.

use std::fmt;

use card_core::enums::{IoSource, MetricGroup};
use card_core::keys::{self, Address, ModalityScope};
use card_core::store::FlatStore;
use card_schema::tables;

/// The four kinds of repeated group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Architecture,
    Evaluation,
    Modality,
    Metric,
}

impl GroupKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Evaluation => "evaluation",
            Self::Modality => "modality",
            Self::Metric => "metric",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One instance of a repeated group.
pub trait RepeatedGroup {
    const KIND: GroupKind;

    /// Address of `field` within this instance.
    fn address(&self, field: &str) -> Address;

    /// Label for `field_label` in a missing-field report, tagged with this
    /// instance's identity.
    fn label(&self, field_label: &str) -> String;

    /// Flat key of `field` within this instance.
    fn key(&self, field: &str) -> String {
        self.address(field).encode()
    }
}

// ---------------------------------------------------------------------------
// Learning architectures
// ---------------------------------------------------------------------------

/// A registered learning architecture, by 0-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchitectureInstance {
    pub index: usize,
}

impl ArchitectureInstance {
    /// Keys to try for `field`, primary spelling first.
    #[must_use]
    pub fn candidates(&self, field: &str) -> Vec<String> {
        let mut out = vec![self.key(field)];
        if tables::LEGACY_ARCHITECTURE_FIELDS.contains(&field) {
            out.push(Address::legacy_architecture(self.index, field).encode());
        }
        out
    }

    /// Display name used as the instance's registry entry.
    #[must_use]
    pub fn form_name(&self) -> String {
        format!("Learning Architecture {}", self.index + 1)
    }
}

impl RepeatedGroup for ArchitectureInstance {
    const KIND: GroupKind = GroupKind::Architecture;

    fn address(&self, field: &str) -> Address {
        Address::architecture(self.index, field)
    }

    fn label(&self, field_label: &str) -> String {
        format!("{field_label} (Learning Architecture {})", self.index + 1)
    }
}

/// Registered architectures: indices `0..count`.
#[must_use]
pub fn architectures(store: &FlatStore) -> Vec<ArchitectureInstance> {
    traced(
        (0..store.architecture_count())
            .map(|index| ArchitectureInstance { index })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Evaluations
// ---------------------------------------------------------------------------

/// A registered evaluation, by its human-chosen name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationInstance {
    pub name: String,
    pub slug: String,
}

impl EvaluationInstance {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: keys::slugify(name),
        }
    }

    /// Key holding the metric names added to `group`.
    #[must_use]
    pub fn metric_list_key(&self, group: MetricGroup) -> String {
        keys::list_shadow(&self.key(group.as_str()))
    }

    #[must_use]
    pub fn metric(&self, group: MetricGroup, name: &str) -> MetricInstance {
        MetricInstance {
            evaluation: self.name.clone(),
            slug: self.slug.clone(),
            group,
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn modality(&self, pair: &ModalityPair) -> ModalityInstance {
        ModalityInstance {
            pair: pair.clone(),
            scope: ModalityScope::Evaluation {
                slug: self.slug.clone(),
            },
            evaluation: Some(self.name.clone()),
        }
    }

    /// Metrics added to `group`, in the order they were added.
    ///
    /// Reads the `_list` shadow and falls back to the selector field itself.
    #[must_use]
    pub fn metrics(&self, store: &FlatStore, group: MetricGroup) -> Vec<MetricInstance> {
        let list_key = self.metric_list_key(group);
        let names = if store.contains(&list_key) {
            store.string_list(&list_key)
        } else {
            store.string_list(&self.key(group.as_str()))
        };
        names.iter().map(|name| self.metric(group, name)).collect()
    }
}

impl RepeatedGroup for EvaluationInstance {
    const KIND: GroupKind = GroupKind::Evaluation;

    fn address(&self, field: &str) -> Address {
        Address::evaluation(self.slug.clone(), field)
    }

    fn label(&self, field_label: &str) -> String {
        format!("{field_label} (Eval: {})", self.name)
    }
}

/// Registered evaluations in registration order.
#[must_use]
pub fn evaluations(store: &FlatStore) -> Vec<EvaluationInstance> {
    traced(
        store
            .evaluation_names()
            .iter()
            .map(|name| EvaluationInstance::new(name))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Modality entries
// ---------------------------------------------------------------------------

/// A discovered `(modality, source)` pair. The label is kept as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalityPair {
    pub label: String,
    pub source: IoSource,
}

/// A modality pair placed in the training scope or in one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalityInstance {
    pub pair: ModalityPair,
    pub scope: ModalityScope,
    evaluation: Option<String>,
}

impl ModalityInstance {
    #[must_use]
    pub fn training(pair: &ModalityPair) -> Self {
        Self {
            pair: pair.clone(),
            scope: ModalityScope::Training,
            evaluation: None,
        }
    }

    /// Keys to try for `field`: the key and its two legacy spellings.
    #[must_use]
    pub fn candidates(&self, field: &str) -> [String; 3] {
        keys::legacy_spellings(&self.key(field))
    }
}

impl RepeatedGroup for ModalityInstance {
    const KIND: GroupKind = GroupKind::Modality;

    fn address(&self, field: &str) -> Address {
        Address::modality(self.scope.clone(), &self.pair.label, self.pair.source, field)
    }

    fn label(&self, field_label: &str) -> String {
        let base = format!("{field_label} ({} - {})", self.pair.label, self.pair.source);
        match &self.evaluation {
            Some(name) => format!("{base}(Eval: {name})"),
            None => base,
        }
    }
}

/// Scan the store for list-valued `*_model_inputs` / `*_model_outputs` keys.
///
/// Pairs come out in store order, one per list item, duplicates included.
/// Underscore-prefixed widget shadows and non-string items are skipped.
#[must_use]
pub fn modality_pairs(store: &FlatStore) -> Vec<ModalityPair> {
    let mut out = Vec::new();
    for (key, value) in store.iter() {
        if key.starts_with('_') {
            continue;
        }
        let Some(items) = value.as_array() else {
            continue;
        };
        let Some(source) = IoSource::ALL.into_iter().find(|source| {
            key.strip_suffix(source.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.ends_with('_'))
        }) else {
            continue;
        };
        out.extend(items.iter().filter_map(|item| item.as_str()).map(|label| ModalityPair {
            label: label.to_string(),
            source,
        }));
    }
    tracing::debug!(kind = %GroupKind::Modality, count = out.len(), "groups: discovered");
    out
}

// ---------------------------------------------------------------------------
// Metric entries
// ---------------------------------------------------------------------------

/// A metric added to one metric group of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricInstance {
    pub evaluation: String,
    pub slug: String,
    pub group: MetricGroup,
    pub name: String,
}

impl RepeatedGroup for MetricInstance {
    const KIND: GroupKind = GroupKind::Metric;

    fn address(&self, field: &str) -> Address {
        Address::metric(self.slug.clone(), self.name.clone(), field)
    }

    fn label(&self, field_label: &str) -> String {
        format!(
            "{field_label} (Metric: {}, Eval: {})",
            tables::short_metric_name(&self.name),
            self.evaluation
        )
    }
}

fn traced<G: RepeatedGroup>(instances: Vec<G>) -> Vec<G> {
    tracing::debug!(kind = %G::KIND, count = instances.len(), "groups: discovered");
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store(value: serde_json::Value) -> FlatStore {
        FlatStore::from_value(value).unwrap()
    }

    #[test]
    fn modality_discovery_follows_store_order() {
        let s = store(json!({
            "training_data_model_outputs": ["RTSTRUCT"],
            "training_data_model_inputs": ["CT", "MRI", "CT"],
            "training_data_model_inputs_list": ["CT", "MRI", "CT"],
            "_training_data_model_inputs": ["PET"],
            "technical_specifications_model_inputs_description": "CT only"
        }));
        let pairs = modality_pairs(&s);
        let got: Vec<(&str, IoSource)> = pairs
            .iter()
            .map(|pair| (pair.label.as_str(), pair.source))
            .collect();
        assert_eq!(
            got,
            vec![
                ("RTSTRUCT", IoSource::ModelOutputs),
                ("CT", IoSource::ModelInputs),
                ("MRI", IoSource::ModelInputs),
                ("CT", IoSource::ModelInputs),
            ]
        );
    }

    #[test]
    fn modality_keys_are_scoped() {
        let pair = ModalityPair {
            label: "Planning CT".into(),
            source: IoSource::ModelInputs,
        };
        let evaluation = EvaluationInstance::new("External test");
        assert_eq!(
            ModalityInstance::training(&pair).key("fov"),
            "training_data_planning_ct_model_inputs_fov"
        );
        assert_eq!(
            evaluation.modality(&pair).key("fov"),
            "evaluation_External_test_planning_ct_model_inputs_fov"
        );
        assert_eq!(
            evaluation.modality(&pair).label("FOV"),
            "FOV (Planning CT - model_inputs)(Eval: External test)"
        );
    }

    #[test]
    fn architecture_candidates_include_legacy_spelling_for_figures_only() {
        let arch = ArchitectureInstance { index: 1 };
        assert_eq!(
            arch.candidates("architecture_figure"),
            vec![
                "learning_architecture_1_architecture_figure",
                "technical_specifications_learning_architecture_1_architecture_figure",
            ]
        );
        assert_eq!(
            arch.candidates("loss_function"),
            vec!["learning_architecture_1_loss_function"]
        );
        assert_eq!(arch.label("Loss function"), "Loss function (Learning Architecture 2)");
    }

    #[test]
    fn metrics_prefer_list_shadow() {
        let s = store(json!({
            "evaluation_Site_B_type_gm_seg": ["DSC"],
            "evaluation_Site_B_type_gm_seg_list": ["DSC", "HD95"],
            "evaluation_Site_B_type_dose_dm_seg": ["DVH (Dose-Volume Histogram)"]
        }));
        let evaluation = EvaluationInstance::new("Site B");
        let names = |group| -> Vec<String> {
            evaluation
                .metrics(&s, group)
                .into_iter()
                .map(|metric| metric.name)
                .collect()
        };
        assert_eq!(names(MetricGroup::GmSeg), vec!["DSC", "HD95"]);
        assert_eq!(
            names(MetricGroup::DoseDmSeg),
            vec!["DVH (Dose-Volume Histogram)"]
        );
        assert!(names(MetricGroup::Ism).is_empty());

        let metric = evaluation.metric(MetricGroup::DoseDmSeg, "DVH (Dose-Volume Histogram)");
        assert_eq!(
            metric.key("mean_data"),
            "evaluation_Site_B.DVH (Dose-Volume Histogram)_mean_data"
        );
        assert_eq!(
            metric.label("Mean Data"),
            "Mean Data (Metric: DVH, Eval: Site B)"
        );
    }

    #[test]
    fn registered_instances() {
        let s = store(json!({
            "learning_architecture_forms": {"Learning Architecture 1": {}, "Learning Architecture 2": {}},
            "evaluation_forms": ["A", "B c"]
        }));
        assert_eq!(
            architectures(&s),
            vec![ArchitectureInstance { index: 0 }, ArchitectureInstance { index: 1 }]
        );
        let slugs: Vec<String> = evaluations(&s).into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["A", "B_c"]);
    }
}
