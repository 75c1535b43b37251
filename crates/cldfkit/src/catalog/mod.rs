//! Reference catalog of CLDF components.
//!
//! Each component (`FormTable`, `LanguageTable`, ...) is described by a
//! `<Component>-metadata.json` file holding its default url and column
//! list. The catalog indexes those definitions by table handle and builds
//! per-handle column dictionaries plus the [`GENERAL`] dictionary that
//! unions the columns of every component.
//!
//! The catalog is read-only once loaded and may be shared between builds.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use rust_embed::RustEmbed;

use crate::error::{CldfError, Result};
use crate::schema::{ColumnSpec, TableSpec};

/// Name of the pseudo-handle whose dictionary spans all components.
pub const GENERAL: &str = "general";

/// Suffix of component definition file names.
pub const METADATA_SUFFIX: &str = "-metadata.json";

/// Column name -> definition, in declaration order.
pub type ColumnDictionary = IndexMap<String, ColumnSpec>;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/components/"]
struct BundledComponents;

/// Loaded component vocabulary.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    /// Handle -> component id, sorted by handle.
    components: IndexMap<String, String>,
    /// Handle -> default table definition.
    definitions: IndexMap<String, TableSpec>,
    /// Handle (and [`GENERAL`]) -> column dictionary.
    dictionaries: IndexMap<String, ColumnDictionary>,
}

impl SchemaCatalog {
    /// Load the component definitions shipped with this library.
    pub fn bundled() -> Result<Self> {
        let mut files = Vec::new();
        for name in BundledComponents::iter() {
            if !name.ends_with(METADATA_SUFFIX) {
                continue;
            }
            let file = BundledComponents::get(&name).ok_or_else(|| {
                CldfError::Catalog(format!("Bundled component '{}' is unreadable", name))
            })?;
            let contents = String::from_utf8(file.data.into_owned()).map_err(|e| {
                CldfError::Catalog(format!("Bundled component '{}' is not UTF-8: {}", name, e))
            })?;
            files.push((name.to_string(), contents));
        }
        Self::from_files(files)
    }

    /// Load every `*-metadata.json` definition found in `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            CldfError::Catalog(format!(
                "Failed to read component directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CldfError::io(dir, e))?.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !name.ends_with(METADATA_SUFFIX) {
                continue;
            }
            let contents = fs::read_to_string(&path).map_err(|e| CldfError::io(&path, e))?;
            files.push((name, contents));
        }
        Self::from_files(files)
    }

    /// Build the catalog from `(file name, JSON contents)` pairs.
    ///
    /// Components are indexed in lexicographic handle order, which also fixes
    /// the last-writer-wins order of the [`GENERAL`] dictionary.
    pub fn from_files(files: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut loaded: Vec<(String, String, TableSpec)> = Vec::new();
        for (name, contents) in files {
            let component_id = name
                .strip_suffix(METADATA_SUFFIX)
                .unwrap_or(&name)
                .to_string();
            let definition: TableSpec = serde_json::from_str(&contents).map_err(|e| {
                CldfError::Catalog(format!("Malformed component definition '{}': {}", name, e))
            })?;
            let handle = definition.handle().to_string();
            if handle.is_empty() || handle == GENERAL {
                return Err(CldfError::Catalog(format!(
                    "Component '{}' declares an unusable url '{}'",
                    component_id, definition.url
                )));
            }
            loaded.push((handle, component_id, definition));
        }

        if loaded.is_empty() {
            return Err(CldfError::Catalog(
                "No component definitions found".to_string(),
            ));
        }
        loaded.sort_by(|a, b| a.0.cmp(&b.0));

        let mut components = IndexMap::new();
        let mut definitions = IndexMap::new();
        let mut dictionaries: IndexMap<String, ColumnDictionary> = IndexMap::new();
        let mut general = ColumnDictionary::new();

        for (handle, component_id, definition) in loaded {
            if components.contains_key(&handle) {
                return Err(CldfError::Catalog(format!(
                    "Handle '{}' is declared by more than one component",
                    handle
                )));
            }
            let mut dictionary = ColumnDictionary::new();
            for column in definition.columns() {
                dictionary.insert(column.name.clone(), column.clone());
                general.insert(column.name.clone(), column.clone());
            }
            components.insert(handle.clone(), component_id);
            dictionaries.insert(handle.clone(), dictionary);
            definitions.insert(handle, definition);
        }
        dictionaries.insert(GENERAL.to_string(), general);

        tracing::debug!(
            target: "cldfkit",
            components = components.len(),
            "loaded component catalog"
        );

        Ok(Self {
            components,
            definitions,
            dictionaries,
        })
    }

    /// Component id for a table handle (`languages` -> `LanguageTable`).
    pub fn component_id(&self, handle: &str) -> Option<&str> {
        self.components.get(handle).map(String::as_str)
    }

    /// Returns true if the handle names a known component.
    pub fn is_native(&self, handle: &str) -> bool {
        self.components.contains_key(handle)
    }

    /// Default definition of the component behind a handle.
    pub fn definition(&self, handle: &str) -> Option<&TableSpec> {
        self.definitions.get(handle)
    }

    /// Default definition of a component, looked up by its id.
    pub fn definition_by_id(&self, component_id: &str) -> Option<&TableSpec> {
        self.components
            .iter()
            .find(|(_, id)| id.as_str() == component_id)
            .and_then(|(handle, _)| self.definitions.get(handle))
    }

    /// Column dictionary of a handle, or of [`GENERAL`].
    pub fn dictionary(&self, handle: &str) -> Option<&ColumnDictionary> {
        self.dictionaries.get(handle)
    }

    /// The dictionary spanning all components.
    pub fn general(&self) -> &ColumnDictionary {
        &self.dictionaries[GENERAL]
    }

    /// Known handles, sorted.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// `(handle, component id)` pairs, sorted by handle.
    pub fn components(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components
            .iter()
            .map(|(handle, id)| (handle.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn component(url: &str, columns: &str) -> String {
        format!(
            r#"{{"url": "{}", "tableSchema": {{"columns": [{}]}}}}"#,
            url, columns
        )
    }

    #[test]
    fn test_bundled_catalog() {
        let catalog = SchemaCatalog::bundled().unwrap();

        assert_eq!(catalog.component_id("languages"), Some("LanguageTable"));
        assert_eq!(catalog.component_id("forms"), Some("FormTable"));
        assert_eq!(catalog.component_id("examples"), Some("ExampleTable"));
        assert!(!catalog.is_native("wordforms"));

        let forms = catalog.dictionary("forms").unwrap();
        let names: Vec<&str> = forms.keys().map(String::as_str).collect();
        assert_eq!(&names[..5], &["ID", "Language_ID", "Parameter_ID", "Value", "Form"]);
        assert_eq!(catalog.component_id("trees"), Some("TreeTable"));
        assert_eq!(catalog.component_id("contributors"), Some("ContributorTable"));
        assert_eq!(
            catalog.component_id("functionalEquivalentsets"),
            Some("FunctionalEquivalentsetTable")
        );

        assert!(catalog.general().contains_key("Glottocode"));
        assert!(catalog.general().contains_key("Primary_Text"));
    }

    #[test]
    fn test_handles_are_sorted() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let handles: Vec<&str> = catalog.handles().collect();
        let mut sorted = handles.clone();
        sorted.sort();
        assert_eq!(handles, sorted);
    }

    #[test]
    fn test_general_is_last_writer_wins_by_handle() {
        let files = vec![
            (
                "Zeta-metadata.json".to_string(),
                component("zetas.csv", r#"{"name": "Shared", "datatype": "integer"}"#),
            ),
            (
                "Alpha-metadata.json".to_string(),
                component("alphas.csv", r#"{"name": "Shared", "datatype": "string"}"#),
            ),
        ];
        let catalog = SchemaCatalog::from_files(files).unwrap();

        let shared = &catalog.general()["Shared"];
        assert_eq!(shared.datatype.as_ref().unwrap().base(), "integer");
        assert_eq!(catalog.components().next(), Some(("alphas", "Alpha")));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("Thing-metadata.json")).unwrap();
        file.write_all(component("things.csv", r#"{"name": "ID"}"#).as_bytes())
            .unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let catalog = SchemaCatalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.definition_by_id("Thing").unwrap().url, "things.csv");
    }

    #[test]
    fn test_missing_dir_is_fatal() {
        let result = SchemaCatalog::load_dir("/nonexistent/components");
        assert!(matches!(result, Err(CldfError::Catalog(_))));
    }

    #[test]
    fn test_malformed_definition_is_fatal() {
        let files = vec![("Broken-metadata.json".to_string(), "{not json".to_string())];
        assert!(matches!(
            SchemaCatalog::from_files(files),
            Err(CldfError::Catalog(_))
        ));
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        assert!(SchemaCatalog::from_files(Vec::new()).is_err());
    }
}
