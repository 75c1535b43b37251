//! The CLDF dataset model: tables, keys, properties and sources.
//!
//! A [`Dataset`] is the in-memory form of a metadata document. Schema
//! mutations go through its methods so that derived structure stays
//! consistent: adding a component wires up foreign keys to and from the
//! components already present, removing a column drops the keys that used
//! it.

mod metadata;
mod module;
mod reader;
mod validate;
mod writer;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::error::{CldfError, Result};
use crate::resolve::capitalize;
use crate::schema::{ColumnSpec, ForeignKey, TableSpec};
use crate::sources::Source;

pub use metadata::Metadata;
pub use module::Module;
pub use reader::{DatasetContents, load_dataset};
pub use validate::validate_dataset;
pub use writer::DatasetWriter;

/// File name of the bibliography, next to the metadata file.
pub const BIB_FNAME: &str = "sources.bib";

/// Property holding the dataset identifier.
pub const IDENTIFIER_PROPERTY: &str = "rdf:ID";

const CSVW_CONTEXT: &str = "http://www.w3.org/ns/csvw";

/// A CLDF dataset rooted at a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    directory: PathBuf,
    metadata_fname: String,
    module: Module,
    properties: IndexMap<String, Value>,
    tables: Vec<TableSpec>,
    sources: Vec<Source>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new(directory: impl Into<PathBuf>, metadata_fname: impl Into<String>, module: Module) -> Self {
        Self {
            directory: directory.into(),
            metadata_fname: metadata_fname.into(),
            module,
            properties: IndexMap::new(),
            tables: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.directory.join(&self.metadata_fname)
    }

    pub fn bib_path(&self) -> PathBuf {
        self.directory.join(BIB_FNAME)
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Write descriptive metadata into the dataset properties.
    pub fn set_metadata(&mut self, metadata: &Metadata) {
        self.properties.extend(metadata.to_properties());
    }

    /// Descriptive metadata recovered from the properties.
    pub fn metadata(&self) -> Metadata {
        Metadata::from_properties(&self.properties, &[IDENTIFIER_PROPERTY])
    }

    pub fn identifier(&self) -> Option<&str> {
        self.properties
            .get(IDENTIFIER_PROPERTY)
            .and_then(Value::as_str)
    }

    /// Set a property unless it is already present. Returns true if set.
    pub fn set_default_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.properties.contains_key(&key) {
            return false;
        }
        self.properties.insert(key, value.into());
        true
    }

    /// Find a table by url, component id or handle, in that order.
    pub fn table(&self, reference: &str) -> Option<&TableSpec> {
        self.table_index(reference).map(|i| &self.tables[i])
    }

    /// Url of the table named by `reference`.
    pub fn table_url(&self, reference: &str) -> Option<&str> {
        self.table(reference).map(|t| t.url.as_str())
    }

    pub fn has_table_url(&self, url: &str) -> bool {
        self.tables.iter().any(|t| t.url == url)
    }

    /// Returns true if any table url starts with `prefix`.
    pub fn has_table_with_prefix(&self, prefix: &str) -> bool {
        self.tables.iter().any(|t| t.url.starts_with(prefix))
    }

    fn table_index(&self, reference: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.url == reference)
            .or_else(|| {
                self.tables
                    .iter()
                    .position(|t| t.component_id() == Some(reference))
            })
            .or_else(|| self.tables.iter().position(|t| t.handle() == reference))
    }

    fn require_table(&self, reference: &str) -> Result<usize> {
        self.table_index(reference)
            .ok_or_else(|| CldfError::Schema(format!("Table '{}' not found in dataset", reference)))
    }

    /// Register a table definition.
    ///
    /// Reference columns of the new table get foreign keys to components
    /// already present, and reference columns of present tables get foreign
    /// keys to the new one.
    pub fn add_component(&mut self, component: TableSpec) -> Result<()> {
        if self.has_table_url(&component.url) {
            return Err(CldfError::Schema(format!(
                "Table '{}' already exists",
                component.url
            )));
        }
        if let Some(id) = component.component_id() {
            if self.tables.iter().any(|t| t.component_id() == Some(id)) {
                return Err(CldfError::Schema(format!("Component '{}' already exists", id)));
            }
        }
        self.tables.push(component);
        self.auto_constraints(self.tables.len() - 1);
        Ok(())
    }

    fn auto_constraints(&mut self, index: usize) {
        let outgoing: Vec<ForeignKey> = self.tables[index]
            .columns()
            .iter()
            .filter_map(|column| {
                let target = referenced_component(column.semantic_handle()?)?;
                let table = self
                    .tables
                    .iter()
                    .find(|t| t.component_id() == Some(target.as_str()))?;
                Some(ForeignKey::new(&column.name, &table.url, identifier_column(table)?))
            })
            .collect();
        for foreign_key in outgoing {
            self.tables[index].push_foreign_key(foreign_key);
        }

        let Some(component) = self.tables[index].component_id().map(str::to_string) else {
            return;
        };
        let Some(key) = identifier_column(&self.tables[index]) else {
            return;
        };
        let url = self.tables[index].url.clone();
        for (i, table) in self.tables.iter_mut().enumerate() {
            if i == index {
                continue;
            }
            let referencing: Vec<String> = table
                .columns()
                .iter()
                .filter(|c| {
                    c.semantic_handle().and_then(referenced_component).as_deref()
                        == Some(component.as_str())
                })
                .map(|c| c.name.clone())
                .collect();
            for column in referencing {
                table.push_foreign_key(ForeignKey::new(column, &url, &key));
            }
        }
    }

    /// Append columns to a table. Fails on a name the table already has.
    pub fn add_columns(
        &mut self,
        table: &str,
        columns: impl IntoIterator<Item = ColumnSpec>,
    ) -> Result<()> {
        let index = self.require_table(table)?;
        for column in columns {
            let name = column.name.clone();
            if !self.tables[index].push_column(column) {
                return Err(CldfError::Schema(format!(
                    "Duplicate column '{}' in table '{}'",
                    name, self.tables[index].url
                )));
            }
        }
        Ok(())
    }

    /// Remove columns from a table, with every key that uses them.
    /// Names the table does not have are ignored. Returns the number removed.
    pub fn remove_columns(&mut self, table: &str, names: &[&str]) -> Result<usize> {
        let index = self.require_table(table)?;
        let url = self.tables[index].url.clone();
        let mut removed = 0;
        for name in names {
            if self.tables[index].remove_column(name) {
                removed += 1;
                for other in &mut self.tables {
                    other.drop_foreign_keys_to(&url, name);
                }
            }
        }
        Ok(removed)
    }

    /// Replace column `name` of a table in place, keeping its position and
    /// the keys that use it. Keys in other tables follow a change of name.
    /// Returns false if the table has no such column.
    pub fn replace_column(&mut self, table: &str, name: &str, column: ColumnSpec) -> Result<bool> {
        let index = self.require_table(table)?;
        let url = self.tables[index].url.clone();
        let renamed = column.name.clone();
        if !self.tables[index].replace_column(name, column) {
            return Ok(false);
        }
        if renamed != name {
            for (i, other) in self.tables.iter_mut().enumerate() {
                if i != index {
                    other.rename_key_column(&url, name, &renamed);
                }
            }
        }
        Ok(true)
    }

    /// Add a foreign key from `column` of `table` to `resource`.
    ///
    /// The referencing column must exist; the referenced table is checked by
    /// validation, so it may be registered later. Returns false if an
    /// identical key already exists.
    pub fn add_foreign_key(
        &mut self,
        table: &str,
        column: &str,
        resource: &str,
        referenced_column: &str,
    ) -> Result<bool> {
        let index = self.require_table(table)?;
        if !self.tables[index].has_column(column) {
            return Err(CldfError::Schema(format!(
                "Cannot add foreign key: column '{}' not in table '{}'",
                column, self.tables[index].url
            )));
        }
        Ok(self.tables[index].push_foreign_key(ForeignKey::new(column, resource, referenced_column)))
    }

    /// Register sources, skipping keys already present. Returns the number added.
    pub fn add_sources(&mut self, sources: impl IntoIterator<Item = Source>) -> usize {
        let mut added = 0;
        for source in sources {
            if self.sources.iter().any(|s| s.key == source.key) {
                continue;
            }
            self.sources.push(source);
            added += 1;
        }
        added
    }

    /// The metadata document describing this dataset.
    pub fn to_metadata_document(&self) -> Result<Value> {
        let mut document = serde_json::Map::new();
        document.insert(
            "@context".to_string(),
            json!([CSVW_CONTEXT, {"@language": "en"}]),
        );
        document.insert(
            "dc:conformsTo".to_string(),
            Value::String(self.module.conforms_to()),
        );
        for (key, value) in &self.properties {
            document.insert(key.clone(), value.clone());
        }
        if !self.sources.is_empty() {
            document.insert("dc:source".to_string(), Value::String(BIB_FNAME.to_string()));
        }
        document.insert("tables".to_string(), serde_json::to_value(&self.tables)?);
        Ok(Value::Object(document))
    }

    /// Rebuild a dataset from a metadata document. Sources are not loaded.
    pub fn from_metadata_document(
        directory: impl Into<PathBuf>,
        metadata_fname: impl Into<String>,
        document: Value,
    ) -> Result<Self> {
        let Value::Object(document) = document else {
            return Err(CldfError::Schema(
                "Metadata document is not a JSON object".to_string(),
            ));
        };

        let mut dataset = Self::new(directory, metadata_fname, Module::default());
        for (key, value) in document {
            match key.as_str() {
                "@context" | "dc:source" => {}
                "dc:conformsTo" => {
                    if let Some(module) = value.as_str().and_then(Module::from_conforms_to) {
                        dataset.module = module;
                    }
                }
                "tables" => dataset.tables = serde_json::from_value(value)?,
                _ => {
                    dataset.properties.insert(key, value);
                }
            }
        }
        Ok(dataset)
    }
}

/// Component referenced by a `…Reference` property: the last camel-case word
/// of the term plus `Table` (`metaLanguageReference` -> `LanguageTable`).
pub fn referenced_component(handle: &str) -> Option<String> {
    let stem = handle.strip_suffix("Reference")?;
    if stem.is_empty() {
        return None;
    }
    let start = stem
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_uppercase())
        .map_or(0, |(i, _)| i);
    Some(format!("{}Table", capitalize(&stem[start..])))
}

/// The column other tables reference: the `#id` column, else the first
/// primary-key column.
fn identifier_column(table: &TableSpec) -> Option<String> {
    table
        .column_by_handle("id")
        .map(|c| c.name.clone())
        .or_else(|| table.primary_key().first().cloned())
}
