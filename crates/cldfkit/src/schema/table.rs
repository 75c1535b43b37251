//! Table-level schema definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::column::ColumnSpec;

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    /// Url of the referenced table.
    pub resource: String,
    #[serde(rename = "columnReference")]
    pub column_reference: Vec<String>,
}

/// A foreign key from columns of this table to another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(rename = "columnReference")]
    pub column_reference: Vec<String>,
    pub reference: ForeignKeyReference,
}

impl ForeignKey {
    /// Single-column foreign key.
    pub fn new(
        column: impl Into<String>,
        resource: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column_reference: vec![column.into()],
            reference: ForeignKeyReference {
                resource: resource.into(),
                column_reference: vec![referenced_column.into()],
            },
        }
    }

    /// Returns true if the key involves `column` on either side of `table_url`.
    fn involves(&self, table_url: &str, column: &str) -> bool {
        self.column_reference.iter().any(|c| c == column)
            || (self.reference.resource == table_url
                && self.reference.column_reference.iter().any(|c| c == column))
    }
}

/// Columns and keys of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(rename = "primaryKey", default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(rename = "foreignKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

/// A table (component) definition as it appears in a metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    /// File name of the table, relative to the metadata file.
    pub url: String,
    /// CLDF component term, e.g. `http://cldf.clld.org/v1.0/terms.rdf#FormTable`.
    #[serde(rename = "dc:conformsTo", skip_serializing_if = "Option::is_none")]
    pub conforms_to: Option<String>,
    #[serde(rename = "tableSchema", default)]
    pub table_schema: TableSchema,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl TableSpec {
    /// Create an empty table that conforms to no component.
    pub fn ad_hoc(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            conforms_to: None,
            table_schema: TableSchema::default(),
            extra: IndexMap::new(),
        }
    }

    /// Component identifier (`FormTable`), when the table conforms to one.
    pub fn component_id(&self) -> Option<&str> {
        self.conforms_to.as_deref().and_then(super::url_fragment)
    }

    /// Table handle: the url without its `.csv` suffix.
    pub fn handle(&self) -> &str {
        self.url.strip_suffix(".csv").unwrap_or(&self.url)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.table_schema.columns
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.table_schema.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Get all column names, in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.table_schema
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Find the first column with the given semantic handle.
    pub fn column_by_handle(&self, handle: &str) -> Option<&ColumnSpec> {
        self.table_schema
            .columns
            .iter()
            .find(|c| c.semantic_handle() == Some(handle))
    }

    /// Append a column. Returns false if a column of that name exists.
    pub fn push_column(&mut self, column: ColumnSpec) -> bool {
        if self.has_column(&column.name) {
            return false;
        }
        self.table_schema.columns.push(column);
        true
    }

    /// Remove a column together with the primary-key entries and foreign
    /// keys that use it. Returns false if there was no such column.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let before = self.table_schema.columns.len();
        self.table_schema.columns.retain(|c| c.name != name);
        if self.table_schema.columns.len() == before {
            return false;
        }
        self.table_schema.primary_key.retain(|c| c != name);
        let url = self.url.clone();
        self.drop_foreign_keys_to(&url, name);
        true
    }

    /// Replace the column `name` in place. Primary-key entries and foreign
    /// keys of this table follow a change of name. Returns false if there
    /// was no such column.
    pub fn replace_column(&mut self, name: &str, column: ColumnSpec) -> bool {
        let Some(index) = self.table_schema.columns.iter().position(|c| c.name == name) else {
            return false;
        };
        let renamed = column.name.clone();
        self.table_schema.columns[index] = column;
        if renamed != name {
            let url = self.url.clone();
            self.rename_key_column(&url, name, &renamed);
        }
        true
    }

    /// Rename `from` to `to` wherever keys of this table use column `from`
    /// of the table at `table_url`.
    pub(crate) fn rename_key_column(&mut self, table_url: &str, from: &str, to: &str) {
        let rename = |columns: &mut Vec<String>| {
            for column in columns.iter_mut() {
                if column.as_str() == from {
                    *column = to.to_string();
                }
            }
        };
        let own = self.url == table_url;
        if own {
            rename(&mut self.table_schema.primary_key);
        }
        for foreign_key in &mut self.table_schema.foreign_keys {
            if own {
                rename(&mut foreign_key.column_reference);
            }
            if foreign_key.reference.resource == table_url {
                rename(&mut foreign_key.reference.column_reference);
            }
        }
    }

    /// Drop foreign keys that involve `column` of the table at `table_url`.
    pub(crate) fn drop_foreign_keys_to(&mut self, table_url: &str, column: &str) {
        if self.url == table_url {
            self.table_schema
                .foreign_keys
                .retain(|fk| !fk.involves(table_url, column));
        } else {
            self.table_schema.foreign_keys.retain(|fk| {
                !(fk.reference.resource == table_url
                    && fk.reference.column_reference.iter().any(|c| c == column))
            });
        }
    }

    /// Add a foreign key unless an identical one exists.
    pub fn push_foreign_key(&mut self, foreign_key: ForeignKey) -> bool {
        if self.table_schema.foreign_keys.contains(&foreign_key) {
            return false;
        }
        self.table_schema.foreign_keys.push(foreign_key);
        true
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.table_schema.foreign_keys
    }

    pub fn primary_key(&self) -> &[String] {
        &self.table_schema.primary_key
    }
}
