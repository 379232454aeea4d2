//! Missing-field report types.

use serde::Serialize;

/// One unanswered required field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingItem {
    /// Schema section the field belongs to.
    pub section: String,
    /// Human-readable label, including any instance suffix.
    pub label: String,
}

impl MissingItem {
    pub fn new(section: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            label: label.into(),
        }
    }
}

/// Ordered list of unanswered required fields.
///
/// Purely derived from a flat store; two runs against the same state produce
/// the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MissingFieldReport {
    items: Vec<MissingItem>,
}

impl MissingFieldReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: impl Into<String>, label: impl Into<String>) {
        self.items.push(MissingItem::new(section, label));
    }

    pub fn append(&mut self, other: Self) {
        self.items.extend(other.items);
    }

    #[must_use]
    pub fn items(&self) -> &[MissingItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MissingItem> {
        self.items.iter()
    }

    /// Group items under their section display names.
    ///
    /// Groups follow the display table order; sections missing from the table
    /// are grouped under their raw identifier after the known groups.
    #[must_use]
    pub fn grouped(&self) -> Vec<(String, Vec<&MissingItem>)> {
        let mut groups: Vec<(String, Vec<&MissingItem>)> = SECTION_DISPLAY_NAMES
            .iter()
            .map(|(display, _)| ((*display).to_string(), Vec::new()))
            .collect();
        for item in &self.items {
            let display = section_display_name(&item.section).unwrap_or(item.section.as_str());
            match groups.iter_mut().find(|(name, _)| name.as_str() == display) {
                Some((_, members)) => members.push(item),
                None => groups.push((display.to_string(), vec![item])),
            }
        }
        groups.retain(|(_, members)| !members.is_empty());
        groups
    }
}

impl<'a> IntoIterator for &'a MissingFieldReport {
    type Item = &'a MissingItem;
    type IntoIter = std::slice::Iter<'a, MissingItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<MissingItem> for MissingFieldReport {
    fn from_iter<T: IntoIterator<Item = MissingItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Display name for each group of schema sections in the warnings view.
pub const SECTION_DISPLAY_NAMES: [(&str, &[&str]); 6] = [
    ("Card Metadata", &["card_metadata"]),
    ("Model Basic Information", &["model_basic_information"]),
    (
        "Technical Specifications",
        &["technical_specifications", "learning_architecture", "hw_and_sw"],
    ),
    (
        "Training data, methodology, and information",
        &["training_data"],
    ),
    (
        "Evaluation data, methodology, and results / commissioning",
        &["evaluation_data"],
    ),
    ("Other Considerations", &["other_considerations"]),
];

/// Display name for `section`, if it belongs to a known group.
#[must_use]
pub fn section_display_name(section: &str) -> Option<&'static str> {
    SECTION_DISPLAY_NAMES
        .iter()
        .find(|(_, sections)| sections.contains(&section))
        .map(|(display, _)| *display)
}
