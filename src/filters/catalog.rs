//! Known filter values for the campaign performance warehouse.
//!
//! The catalog is built once at startup (either the built-in default or a
//! JSON file) and shared read-only between requests.

use crate::error::{InsightError, Result};
use crate::time::DATE_FIELD;
use serde_json::Value;
use std::path::Path;

/// Marker used in catalog files for continuous (non-enumerable) fields.
pub const RANGE_SENTINEL: &str = "RANGE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterField {
    /// Enumerated categorical values, in catalog order.
    Values(Vec<String>),
    /// Continuous interval such as the date field.
    Range,
}

/// Ordered mapping from filter field name to its known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCatalog {
    fields: Vec<(String, FilterField)>,
}

impl FilterCatalog {
    pub fn new(fields: Vec<(String, FilterField)>) -> Self {
        Self { fields }
    }

    /// Built-in catalog for the campaign performance tables.
    pub fn campaign_default() -> Self {
        fn values(items: &[&str]) -> FilterField {
            FilterField::Values(items.iter().map(|s| s.to_string()).collect())
        }

        Self::new(vec![
            (
                "Channel".to_string(),
                values(&[
                    "Paid Social",
                    "Paid Search",
                    "Display",
                    "Video",
                    "Video - Pre-Roll",
                    "Video - CTV",
                    "Audio",
                    "Native",
                    "Affiliate",
                    "Email",
                    "None",
                ]),
            ),
            (
                "Platform".to_string(),
                values(&[
                    "Meta",
                    "Facebook",
                    "Instagram",
                    "TikTok",
                    "LinkedIn",
                    "Snapchat",
                    "Pinterest",
                    "Google Ads",
                    "Microsoft Ads",
                    "DV360",
                    "The Trade Desk",
                    "Amazon DSP",
                    "YouTube",
                ]),
            ),
            (
                "Publisher".to_string(),
                values(&[
                    "Google",
                    "Meta",
                    "Amazon",
                    "Hulu",
                    "Spotify",
                    "Pandora",
                    "Reddit",
                    "ESPN",
                    "CNN",
                    "New York Times",
                    "None",
                ]),
            ),
            (
                "Objective".to_string(),
                values(&["Awareness", "Consideration", "Conversion", "Retargeting"]),
            ),
            (DATE_FIELD.to_string(), FilterField::Range),
        ])
    }

    /// Parse a catalog from a JSON object whose values are either arrays of
    /// strings or the `"RANGE"` sentinel. Key order is preserved.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| InsightError::Catalog("catalog must be a JSON object".to_string()))?;

        let mut fields = Vec::with_capacity(object.len());
        for (name, entry) in object {
            let field = match entry {
                Value::String(s) if s == RANGE_SENTINEL => FilterField::Range,
                Value::Array(items) => {
                    let values = items
                        .iter()
                        .map(|item| {
                            item.as_str().map(str::to_string).ok_or_else(|| {
                                InsightError::Catalog(format!(
                                    "field '{}' contains a non-string value: {}",
                                    name, item
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    FilterField::Values(values)
                }
                other => {
                    return Err(InsightError::Catalog(format!(
                        "field '{}' must be a list of strings or \"{}\", got {}",
                        name, RANGE_SENTINEL, other
                    )))
                }
            };
            fields.push((name.clone(), field));
        }

        Ok(Self::new(fields))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FilterField)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Enumerated fields only; range fields are structural.
    pub fn enumerated_fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().filter_map(|(name, field)| match field {
            FilterField::Values(values) => Some((name.as_str(), values.as_slice())),
            FilterField::Range => None,
        })
    }

    pub fn get(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::campaign_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_date_range() {
        let catalog = FilterCatalog::campaign_default();
        assert_eq!(catalog.get("date"), Some(&FilterField::Range));
        assert!(catalog.enumerated_fields().all(|(name, _)| name != "date"));
    }

    #[test]
    fn test_from_json_preserves_order() {
        let catalog = FilterCatalog::from_json_str(
            r#"{"Region": ["EMEA", "APAC"], "date": "RANGE", "Channel": ["Display"]}"#,
        )
        .unwrap();
        let names: Vec<&str> = catalog.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Region", "date", "Channel"]);
        assert_eq!(
            catalog.get("Region"),
            Some(&FilterField::Values(vec!["EMEA".to_string(), "APAC".to_string()]))
        );
    }

    #[test]
    fn test_from_json_rejects_bad_entries() {
        assert!(FilterCatalog::from_json_str(r#"["Channel"]"#).is_err());
        assert!(FilterCatalog::from_json_str(r#"{"Channel": [1, 2]}"#).is_err());
        assert!(FilterCatalog::from_json_str(r#"{"date": "RANGES"}"#).is_err());
    }

    #[test]
    fn test_shipped_catalog_matches_default() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/filter_catalog.json");
        let catalog = FilterCatalog::load(&path).unwrap();
        assert_eq!(catalog, FilterCatalog::campaign_default());
    }
}
