use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::language::Language;

/// Header information about a NewGRF: who made it, what it is called and
/// which version it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrfMetadata {
    /// GRF id, four raw bytes. The first three are conventionally ASCII.
    pub author: [u8; 4],
    pub names: BTreeMap<Language, String>,
    pub descriptions: BTreeMap<Language, String>,
    #[serde(default)]
    pub url: String,
    pub version: u32,
    #[serde(default)]
    pub min_version: u32,
}

impl GrfMetadata {
    pub fn new(author: [u8; 4], name: &str, description: &str) -> Self {
        Self {
            author,
            names: BTreeMap::from([(Language::DEFAULT, name.to_string())]),
            descriptions: BTreeMap::from([(Language::DEFAULT, description.to_string())]),
            url: String::new(),
            version: 1,
            min_version: 0,
        }
    }

    /// Name in the default language, or the first translation available.
    pub fn default_name(&self) -> &str {
        pick_default(&self.names)
    }

    pub fn default_description(&self) -> &str {
        pick_default(&self.descriptions)
    }

    /// Translations other than the default language, in language order.
    pub fn translated_names(&self) -> impl Iterator<Item = (Language, &str)> {
        translations(&self.names)
    }

    pub fn translated_descriptions(&self) -> impl Iterator<Item = (Language, &str)> {
        translations(&self.descriptions)
    }
}

fn pick_default(map: &BTreeMap<Language, String>) -> &str {
    map.get(&Language::DEFAULT)
        .or_else(|| map.values().next())
        .map(String::as_str)
        .unwrap_or("")
}

fn translations(map: &BTreeMap<Language, String>) -> impl Iterator<Item = (Language, &str)> {
    map.iter()
        .filter(|(lang, _)| **lang != Language::DEFAULT)
        .map(|(lang, text)| (*lang, text.as_str()))
}
