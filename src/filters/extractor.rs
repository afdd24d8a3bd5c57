//! Deterministic filter extraction from the user's question.

use super::catalog::FilterCatalog;
use crate::time::{parse_date_phrase, DateRange, DATE_FIELD};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// Values matched for one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValues {
    Values(Vec<String>),
    Range(DateRange),
}

impl Serialize for FilterValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValues::Values(values) => values.serialize(serializer),
            FilterValues::Range(range) => range.serialize(serializer),
        }
    }
}

/// Filters found in one question, keyed by field in catalog order with the
/// date range last. Fields without a match are never present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFilters {
    entries: Vec<(String, FilterValues)>,
}

impl ExtractedFilters {
    fn insert(&mut self, field: &str, values: FilterValues) {
        let empty = matches!(&values, FilterValues::Values(v) if v.is_empty());
        if !empty {
            self.entries.push((field.to_string(), values));
        }
    }

    pub fn get(&self, field: &str) -> Option<&FilterValues> {
        self.entries.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }

    /// Matched values of an enumerated field.
    pub fn values(&self, field: &str) -> Option<&[String]> {
        match self.get(field)? {
            FilterValues::Values(values) => Some(values.as_slice()),
            FilterValues::Range(_) => None,
        }
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        match self.get(DATE_FIELD)? {
            FilterValues::Range(range) => Some(range),
            FilterValues::Values(_) => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtractedFilters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, values) in &self.entries {
            map.serialize_entry(field, values)?;
        }
        map.end()
    }
}

/// Matches catalog values and date phrases against a question.
#[derive(Debug, Clone)]
pub struct FilterExtractor {
    catalog: Arc<FilterCatalog>,
}

impl FilterExtractor {
    pub fn new(catalog: Arc<FilterCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    /// Extract categorical values and at most one date range from `question`.
    ///
    /// Within a field, longer values are tried first and a value that is a
    /// substring of an already matched value is dropped, so "Video - Pre-Roll"
    /// never also reports "Video".
    pub fn extract(&self, question: &str, today: NaiveDate) -> ExtractedFilters {
        let haystack = question.to_lowercase();
        let mut filters = ExtractedFilters::default();

        for (field, values) in self.catalog.enumerated_fields() {
            let mut candidates: Vec<(usize, &String)> = values.iter().enumerate().collect();
            // Stable: equal lengths keep catalog order.
            candidates.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));

            let mut matched: Vec<(usize, String)> = Vec::new();
            for (position, value) in candidates {
                let needle = value.trim().to_lowercase();
                if needle.is_empty() || needle == "none" {
                    continue;
                }
                if matched.iter().any(|(_, longer)| longer.to_lowercase().contains(&needle)) {
                    continue;
                }
                if contains_phrase(&haystack, &needle) {
                    matched.push((position, value.clone()));
                }
            }

            matched.sort_by_key(|(position, _)| *position);
            filters.insert(
                field,
                FilterValues::Values(matched.into_iter().map(|(_, v)| v).collect()),
            );
        }

        if let Some(range) = parse_date_phrase(question, today) {
            filters.insert(DATE_FIELD, FilterValues::Range(range));
        }

        filters
    }
}

/// Case-folded phrase match bounded by non-word characters on both sides.
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
            return true;
        }
        // Advance one character so overlapping occurrences are still seen.
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
