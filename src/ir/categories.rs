//! Run-scoped label to id mapping.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::ids::CategoryId;

/// How labels are ordered when ids are assigned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryOrder {
    /// Order of first appearance across the (name-sorted) input files.
    #[default]
    FirstSeen,
    /// Lexicographic order of the label strings.
    Sorted,
}

/// Unique labels with stable ids.
///
/// Entry `i` has COCO id `i + 1` and YOLO class index `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryTable {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a label stream, merging duplicates.
    pub fn from_labels<I, S>(labels: I, order: CategoryOrder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match order {
            CategoryOrder::FirstSeen => {
                let mut table = Self::new();
                for label in labels {
                    table.insert(label.as_ref());
                }
                table
            }
            CategoryOrder::Sorted => {
                let sorted: BTreeSet<String> =
                    labels.into_iter().map(|l| l.as_ref().to_owned()).collect();
                let mut table = Self::new();
                for label in &sorted {
                    table.insert(label);
                }
                table
            }
        }
    }

    /// Appends `label` if it is new. Returns true if it was inserted.
    pub fn insert(&mut self, label: &str) -> bool {
        if self.index.contains_key(label) {
            return false;
        }
        self.index.insert(label.to_owned(), self.labels.len());
        self.labels.push(label.to_owned());
        true
    }

    /// Reorders the table lexicographically, reassigning ids.
    pub fn into_sorted(self) -> Self {
        Self::from_labels(self.labels, CategoryOrder::Sorted)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// COCO category id (1-based) for `label`.
    pub fn category_id(&self, label: &str) -> Option<CategoryId> {
        self.index.get(label).copied().map(CategoryId::from_index)
    }

    /// YOLO class index (0-based) for `label`.
    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, name)| (CategoryId::from_index(i), name.as_str()))
    }
}
