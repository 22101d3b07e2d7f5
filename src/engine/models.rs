use std::collections::BTreeMap;
use std::collections::btree_map;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Mapping of app identifier to an opaque version token.
///
/// The persisted cache file and the remote endpoint share this exact shape: a flat
/// JSON object of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.0.get(identifier).map(String::as_str)
    }

    pub fn insert(&mut self, identifier: impl Into<String>, version: impl Into<String>) {
        self.0.insert(identifier.into(), version.into());
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.0.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Manifest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "macOS")]
    MacOs,
    #[serde(rename = "watchOS")]
    WatchOs,
    #[serde(rename = "tvOS")]
    TvOs,
    #[serde(rename = "all")]
    All,
}

impl Platform {
    /// Raw name as it appears in detail documents; used for list ordering.
    pub const fn raw_name(self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::MacOs => "macOS",
            Platform::WatchOs => "watchOS",
            Platform::TvOs => "tvOS",
            Platform::All => "all",
        }
    }

    pub const fn glyph(self) -> &'static str {
        match self {
            Platform::Ios => "📱",
            Platform::MacOs => "💻",
            Platform::WatchOs => "⌚",
            Platform::TvOs => "📺",
            Platform::All => "💻📱",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[serde(rename = "zh_Hans")]
    ZhHans,
    #[default]
    #[serde(rename = "en")]
    En,
}

impl Language {
    pub const fn flag(self) -> &'static str {
        match self {
            Language::ZhHans => "🇨🇳",
            Language::En => "🇺🇸",
        }
    }
}

/// Detailed metadata for one promoted app, decoded from its detail document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub lang: Language,
    #[serde(default)]
    pub icon: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub changelog: String,
    #[serde(default, rename = "homeURL")]
    pub home_url: String,
    #[serde(default, rename = "appStoreURL")]
    pub app_store_url: String,
}

impl AppRecord {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Raw icon bytes (PNG), or `None` when the record carries no usable icon.
    pub fn icon_bytes(&self) -> Option<Vec<u8>> {
        let trimmed = self.icon.trim();
        if trimmed.is_empty() {
            return None;
        }
        STANDARD.decode(trimmed).ok()
    }
}

/// A decoded record together with the manifest identifier it was stored under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub identifier: String,
    pub record: AppRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_flat_json_object() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"Poster 2":"2.8.12","SubRee":"1.1.1"}"#).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("Poster 2"), Some("2.8.12"));
        assert_eq!(manifest.get("SubRee"), Some("1.1.1"));
        assert!(!manifest.contains("Other"));
    }

    #[test]
    fn manifest_rejects_non_string_versions() {
        assert!(serde_json::from_str::<Manifest>(r#"{"A": 1}"#).is_err());
        assert!(serde_json::from_str::<Manifest>(r#"["A"]"#).is_err());
    }

    #[test]
    fn decodes_detail_document_with_authoring_fields() {
        let raw = br#"{
            "id": "6F9619FF-8B86-D011-B42D-00C04FC964FF",
            "platform": "macOS",
            "lang": "zh_Hans",
            "icon": "",
            "name": "Poster 2",
            "version": "2.8.12",
            "changelog": "* Removed the unintended alert.",
            "homeURL": "https://example.com/poster",
            "appStoreURL": "https://apps.apple.com/app/id1",
            "isEditing": false
        }"#;

        let record = AppRecord::from_slice(raw).unwrap();

        assert_eq!(record.platform, Platform::MacOs);
        assert_eq!(record.lang, Language::ZhHans);
        assert_eq!(record.name, "Poster 2");
        assert_eq!(record.home_url, "https://example.com/poster");
        assert_eq!(record.app_store_url, "https://apps.apple.com/app/id1");
        assert_eq!(record.icon_bytes(), None);
    }

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let record = AppRecord::from_slice(br#"{"name":"SubRee","version":"1.1.1"}"#).unwrap();

        assert_eq!(record.platform, Platform::Ios);
        assert_eq!(record.lang, Language::En);
        assert!(record.changelog.is_empty());
    }

    #[test]
    fn unknown_platform_is_a_decode_error() {
        let raw = br#"{"platform":"android","name":"X","version":"1"}"#;
        assert!(AppRecord::from_slice(raw).is_err());
    }

    #[test]
    fn decodes_base64_icon() {
        let record = AppRecord {
            platform: Platform::Ios,
            lang: Language::En,
            icon: STANDARD.encode([0x89, b'P', b'N', b'G']),
            name: "A".into(),
            version: "1".into(),
            changelog: String::new(),
            home_url: String::new(),
            app_store_url: String::new(),
        };

        assert_eq!(record.icon_bytes(), Some(vec![0x89, b'P', b'N', b'G']));
    }
}
