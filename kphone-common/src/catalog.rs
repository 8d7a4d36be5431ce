//! Catalog and scale list types
//!
//! The server supplies two ordered lists at page load: catalog entries from
//! `/ids` and scale names from `/scales`. Both are immutable once loaded and
//! are turned into selector options here.

use serde::{Deserialize, Deserializer, Serialize};

/// One selectable object from the `/ids` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Object identifier (KIC number), used as the option value
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Human-readable name (KOI name), used as the option label
    pub name: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The server emits numeric Kepler ids; older lists carried strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// A single option of a selector control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Build catalog selector options: value = id, label = name, server order kept.
pub fn catalog_options(entries: &[CatalogEntry]) -> Vec<SelectOption> {
    entries
        .iter()
        .map(|entry| SelectOption {
            value: entry.id.clone(),
            label: entry.name.clone(),
        })
        .collect()
}

/// Build scale selector options: value and label are both the scale name.
pub fn scale_options(scales: &[String]) -> Vec<SelectOption> {
    scales
        .iter()
        .map(|scale| SelectOption {
            value: scale.clone(),
            label: scale.clone(),
        })
        .collect()
}
