//! Key namespace codec.
//!
//! Every flat-store key that holds a field answer encodes a logical
//! [`Address`]. Keys are only ever built through [`Address::encode`] and the
//! shadow helpers in this module, and read back through [`KeyCodec::decode`].
//!
//! ```text
//! plain          {section}_{field}
//! architecture   learning_architecture_{index}_{field}
//!                technical_specifications_learning_architecture_{index}_{field}   (legacy)
//! evaluation     evaluation_{slug}_{field}
//! modality       training_data_{modality}_{source}_{field}
//!                evaluation_{slug}_{modality}_{source}_{field}
//! metric         evaluation_{slug}.{metric}_{field}
//! list shadow    {key}_list
//! date widget    {key}_widget
//! ```

use std::fmt;

use crate::enums::IoSource;

/// Active task display name.
pub const TASK: &str = "task";
/// Ordered list of registered evaluation names.
pub const EVALUATION_FORMS: &str = "evaluation_forms";
/// Map with one entry per registered learning architecture.
pub const ARCHITECTURE_FORMS: &str = "learning_architecture_forms";
/// Map from image-field key to its stored upload record.
pub const UPLOADS: &str = "render_uploads";

/// Keys that hold registries rather than field answers.
pub const REGISTRY_KEYS: [&str; 4] = [TASK, EVALUATION_FORMS, ARCHITECTURE_FORMS, UPLOADS];

pub const TRAINING_SECTION: &str = "training_data";
const EVALUATION_PREFIX: &str = "evaluation_";
const ARCHITECTURE_PREFIX: &str = "learning_architecture_";
const LEGACY_ARCHITECTURE_PREFIX: &str = "technical_specifications_learning_architecture_";
const LIST_SUFFIX: &str = "_list";
const WIDGET_SUFFIX: &str = "_widget";

/// Underscore-joined form of a human-chosen evaluation name.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.replace(' ', "_")
}

/// `true` when keys under one slug can be read as keys under the other.
///
/// Evaluation keys are `evaluation_{slug}_{field}` and
/// `evaluation_{slug}.{metric}_{field}`, so two slugs clash when they are
/// equal or one extends the other past a `_` or `.` boundary.
#[must_use]
pub fn slugs_overlap(a: &str, b: &str) -> bool {
    let extends = |long: &str, short: &str| {
        long.strip_prefix(short)
            .is_some_and(|rest| rest.starts_with('_') || rest.starts_with('.'))
    };
    a == b || extends(a, b) || extends(b, a)
}

/// Key-safe form of a modality label: trimmed, spaces to underscores, lowercase.
#[must_use]
pub fn clean_modality(label: &str) -> String {
    label.trim().replace(' ', "_").to_lowercase()
}

/// Key holding the list-valued shadow of `key`.
#[must_use]
pub fn list_shadow(key: &str) -> String {
    format!("{key}{LIST_SUFFIX}")
}

/// Key holding the ISO widget rendering of the date stored at `key`.
#[must_use]
pub fn widget_key(key: &str) -> String {
    format!("{key}{WIDGET_SUFFIX}")
}

/// `key` followed by its two legacy spellings with leading underscores.
#[must_use]
pub fn legacy_spellings(key: &str) -> [String; 3] {
    [key.to_string(), format!("_{key}"), format!("__{key}")]
}

/// Which key family a modality field belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModalityScope {
    Training,
    Evaluation { slug: String },
}

/// Logical location of a field answer in the flat store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Plain {
        section: String,
        field: String,
    },
    Architecture {
        index: usize,
        field: String,
        legacy: bool,
    },
    Evaluation {
        slug: String,
        field: String,
    },
    Modality {
        scope: ModalityScope,
        modality: String,
        source: IoSource,
        field: String,
    },
    Metric {
        slug: String,
        metric: String,
        field: String,
    },
}

impl Address {
    pub fn plain(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Plain {
            section: section.into(),
            field: field.into(),
        }
    }

    pub fn architecture(index: usize, field: impl Into<String>) -> Self {
        Self::Architecture {
            index,
            field: field.into(),
            legacy: false,
        }
    }

    pub fn legacy_architecture(index: usize, field: impl Into<String>) -> Self {
        Self::Architecture {
            index,
            field: field.into(),
            legacy: true,
        }
    }

    pub fn evaluation(slug: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Evaluation {
            slug: slug.into(),
            field: field.into(),
        }
    }

    /// Modality field; `label` is cleaned with [`clean_modality`].
    pub fn modality(
        scope: ModalityScope,
        label: &str,
        source: IoSource,
        field: impl Into<String>,
    ) -> Self {
        Self::Modality {
            scope,
            modality: clean_modality(label),
            source,
            field: field.into(),
        }
    }

    pub fn metric(
        slug: impl Into<String>,
        metric: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::Metric {
            slug: slug.into(),
            metric: metric.into(),
            field: field.into(),
        }
    }

    /// Field name at the end of the address.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Plain { field, .. }
            | Self::Architecture { field, .. }
            | Self::Evaluation { field, .. }
            | Self::Modality { field, .. }
            | Self::Metric { field, .. } => field,
        }
    }

    /// Render the flat-store key.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Plain { section, field } => format!("{section}_{field}"),
            Self::Architecture {
                index,
                field,
                legacy,
            } => {
                let prefix = if *legacy {
                    LEGACY_ARCHITECTURE_PREFIX
                } else {
                    ARCHITECTURE_PREFIX
                };
                format!("{prefix}{index}_{field}")
            }
            Self::Evaluation { slug, field } => format!("{EVALUATION_PREFIX}{slug}_{field}"),
            Self::Modality {
                scope,
                modality,
                source,
                field,
            } => match scope {
                ModalityScope::Training => {
                    format!("{TRAINING_SECTION}_{modality}_{source}_{field}")
                }
                ModalityScope::Evaluation { slug } => {
                    format!("{EVALUATION_PREFIX}{slug}_{modality}_{source}_{field}")
                }
            },
            Self::Metric {
                slug,
                metric,
                field,
            } => format!("{EVALUATION_PREFIX}{slug}.{metric}_{field}"),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decoder for flat-store keys.
///
/// Several shapes share a prefix and allow underscores inside their
/// components, so decoding needs the vocabulary the keys were built from:
/// schema section names, registered evaluation slugs, and metric sub-field
/// names. Longer vocabulary entries are tried first.
#[derive(Debug, Clone, Default)]
pub struct KeyCodec {
    sections: Vec<String>,
    slugs: Vec<String>,
    metric_fields: Vec<String>,
}

impl KeyCodec {
    pub fn new<S, E, M>(sections: S, slugs: E, metric_fields: M) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            sections: longest_first(sections),
            slugs: longest_first(slugs),
            metric_fields: longest_first(metric_fields),
        }
    }

    /// Decode `key` into its address, or `None` when it matches no known shape.
    ///
    /// Registry keys and underscore-prefixed widget shadows are never
    /// addresses.
    #[must_use]
    pub fn decode(&self, key: &str) -> Option<Address> {
        if key.starts_with('_') || REGISTRY_KEYS.contains(&key) {
            return None;
        }

        if let Some(rest) = key.strip_prefix(EVALUATION_PREFIX)
            && let Some(address) = self.decode_evaluation(rest)
        {
            return Some(address);
        }

        if let Some(rest) = key.strip_prefix(LEGACY_ARCHITECTURE_PREFIX) {
            if let Some((index, field)) = split_index(rest) {
                return Some(Address::Architecture {
                    index,
                    field,
                    legacy: true,
                });
            }
        } else if let Some(rest) = key.strip_prefix(ARCHITECTURE_PREFIX)
            && let Some((index, field)) = split_index(rest)
        {
            return Some(Address::architecture(index, field));
        }

        if let Some(tail) = key
            .strip_prefix(TRAINING_SECTION)
            .and_then(|rest| rest.strip_prefix('_'))
            && let Some((modality, source, field)) = split_modality(tail)
        {
            return Some(Address::Modality {
                scope: ModalityScope::Training,
                modality,
                source,
                field,
            });
        }

        self.sections.iter().find_map(|section| {
            key.strip_prefix(section.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|field| !field.is_empty())
                .map(|field| Address::plain(section.clone(), field))
        })
    }

    fn decode_evaluation(&self, rest: &str) -> Option<Address> {
        self.slugs.iter().find_map(|slug| {
            let tail = rest.strip_prefix(slug.as_str())?;
            if let Some(metric_part) = tail.strip_prefix('.') {
                return self.split_metric(metric_part).map(|(metric, field)| {
                    Address::Metric {
                        slug: slug.clone(),
                        metric,
                        field,
                    }
                });
            }
            let tail = tail.strip_prefix('_').filter(|tail| !tail.is_empty())?;
            Some(match split_modality(tail) {
                Some((modality, source, field)) => Address::Modality {
                    scope: ModalityScope::Evaluation { slug: slug.clone() },
                    modality,
                    source,
                    field,
                },
                None => Address::evaluation(slug.clone(), tail),
            })
        })
    }

    fn split_metric(&self, part: &str) -> Option<(String, String)> {
        self.metric_fields.iter().find_map(|field| {
            let metric = part.strip_suffix(field.as_str())?.strip_suffix('_')?;
            (!metric.is_empty()).then(|| (metric.to_string(), field.clone()))
        })
    }
}

fn longest_first<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut out: Vec<String> = items.into_iter().map(Into::into).collect();
    out.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    out.dedup();
    out
}

fn split_index(rest: &str) -> Option<(usize, String)> {
    let (digits, field) = rest.split_once('_')?;
    if digits.is_empty() || field.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((digits.parse().ok()?, field.to_string()))
}

/// Split `{modality}_{source}_{field}` at the earliest source marker.
fn split_modality(tail: &str) -> Option<(String, IoSource, String)> {
    IoSource::ALL
        .into_iter()
        .filter_map(|source| {
            let marker = format!("_{source}_");
            let at = tail.find(&marker)?;
            let modality = &tail[..at];
            let field = &tail[at + marker.len()..];
            (!modality.is_empty() && !field.is_empty())
                .then(|| (at, modality.to_string(), source, field.to_string()))
        })
        .min_by_key(|(at, ..)| *at)
        .map(|(_, modality, source, field)| (modality, source, field))
}
