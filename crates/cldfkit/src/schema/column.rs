//! Column definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::Datatype;

/// Definition of a single schema column.
///
/// Attributes this type does not model (`valueUrl`, `dc:description`, ...)
/// are kept in `extra` and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    /// Column name. May be empty in a user override, see [`ColumnSpec::or_named`].
    #[serde(default)]
    pub name: String,
    /// Semantic property URL, e.g. `http://cldf.clld.org/v1.0/terms.rdf#form`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Separator for list-valued cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ColumnSpec {
    /// Create a plain, optional string column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_url: None,
            datatype: None,
            required: false,
            separator: None,
            extra: IndexMap::new(),
        }
    }

    /// Set the property URL.
    pub fn with_property_url(mut self, url: impl Into<String>) -> Self {
        self.property_url = Some(url.into());
        self
    }

    /// Set the datatype.
    pub fn with_datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// Set the list separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Mark the column as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Fill in `name` with `default` when the definition carries none.
    pub fn or_named(mut self, default: &str) -> Self {
        if self.name.is_empty() {
            self.name = default.to_string();
        }
        self
    }

    /// Semantic handle: the fragment after `#` in the property URL.
    pub fn semantic_handle(&self) -> Option<&str> {
        self.property_url.as_deref().and_then(super::url_fragment)
    }

    /// Returns true if the column references another CLDF component.
    pub fn is_reference(&self) -> bool {
        self.semantic_handle()
            .is_some_and(|handle| handle.ends_with("Reference"))
    }
}
