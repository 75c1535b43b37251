//! Descriptive dataset metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dataset-level descriptive fields supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    /// Further properties, written verbatim under their own keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Metadata document keys of the named fields.
const ID: &str = "dc:identifier";
const TITLE: &str = "dc:title";
const DESCRIPTION: &str = "dc:description";
const LICENSE: &str = "dc:license";
const URL: &str = "dcat:accessURL";
const CITATION: &str = "dc:bibliographicCitation";

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the license.
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// Set an extra property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn named(&self) -> [(&'static str, &Option<String>); 6] {
        [
            (ID, &self.id),
            (TITLE, &self.title),
            (DESCRIPTION, &self.description),
            (LICENSE, &self.license),
            (URL, &self.url),
            (CITATION, &self.citation),
        ]
    }

    /// Metadata document properties for these fields.
    pub fn to_properties(&self) -> IndexMap<String, Value> {
        let mut properties = IndexMap::new();
        for (key, value) in self.named() {
            if let Some(value) = value {
                properties.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        for (key, value) in &self.extra {
            properties.insert(key.clone(), value.clone());
        }
        properties
    }

    /// Inverse of [`Metadata::to_properties`]. Keys listed in `skip` are
    /// left out of `extra`.
    pub fn from_properties(properties: &IndexMap<String, Value>, skip: &[&str]) -> Self {
        let text = |key: &str| properties.get(key).and_then(Value::as_str).map(str::to_string);
        let named = [ID, TITLE, DESCRIPTION, LICENSE, URL, CITATION];

        let extra = properties
            .iter()
            .filter(|(key, _)| !named.contains(&key.as_str()) && !skip.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            id: text(ID),
            title: text(TITLE),
            description: text(DESCRIPTION),
            license: text(LICENSE),
            url: text(URL),
            citation: text(CITATION),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_properties_round_trip() {
        let metadata = Metadata::new()
            .with_title("Ikpeng wordlist")
            .with_license("CC-BY-4.0")
            .with_property("dc:creator", "A. Linguist");

        let properties = metadata.to_properties();
        assert_eq!(properties["dc:title"], json!("Ikpeng wordlist"));
        assert_eq!(properties["dc:license"], json!("CC-BY-4.0"));
        assert_eq!(properties["dc:creator"], json!("A. Linguist"));

        assert_eq!(Metadata::from_properties(&properties, &[]), metadata);
    }

    #[test]
    fn test_from_properties_skips_keys() {
        let mut properties = IndexMap::new();
        properties.insert("rdf:ID".to_string(), json!("ikpeng"));
        properties.insert("dc:title".to_string(), json!("T"));

        let metadata = Metadata::from_properties(&properties, &["rdf:ID"]);
        assert_eq!(metadata.title.as_deref(), Some("T"));
        assert!(metadata.extra.is_empty());
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        let metadata: Metadata =
            serde_json::from_str(r#"{"title": "T", "dc:subject": "phonology"}"#).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("T"));
        assert_eq!(metadata.extra["dc:subject"], json!("phonology"));
    }
}
