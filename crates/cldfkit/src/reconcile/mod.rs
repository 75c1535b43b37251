//! Reconciling input tables with the component catalog.
//!
//! A table whose handle names a catalog component (`languages`, `forms`) is
//! *native*: its columns are matched against the component's own columns,
//! the component is registered, and user overrides, removals and foreign
//! keys are merged into it. Any other handle is *foreign*: an ad hoc table
//! `<handle>.csv` is created on first sight with one column per input
//! column.
//!
//! Both reconcilers rename the input rows to canonical column names and
//! return them for the caller to append to the writer.

mod foreign;
mod native;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::catalog::SchemaCatalog;
use crate::dataset::{Dataset, DatasetWriter};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::input::{Record, RowSet};
use crate::schema::ColumnSpec;

/// User column overrides of one table: column key -> definition.
pub type ColumnOverrides = IndexMap<String, ColumnSpec>;

/// Foreign keys of one table: column -> (referenced table, referenced column).
pub type ForeignKeyDecls = IndexMap<String, (String, String)>;

/// What to do with columns of a native table that its component does not
/// define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedColumnPolicy {
    /// Record a warning and leave the column out of the schema.
    #[default]
    Warn,
    /// Register the column on the component.
    Register,
}

/// One input table and the declarations that apply to it.
#[derive(Debug, Clone)]
pub struct TableInput<'a> {
    pub handle: &'a str,
    pub rows: RowSet,
    pub columns: &'a ColumnOverrides,
    pub foreign_keys: &'a ForeignKeyDecls,
    /// Only used for native tables.
    pub remove_columns: &'a IndexSet<String>,
}

/// Rows renamed to canonical columns, and the table they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledTable {
    /// Component id for native tables, url for foreign ones.
    pub table: String,
    pub rows: Vec<Record>,
}

/// Applies the catalog to input tables, one at a time.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    catalog: &'a SchemaCatalog,
    policy: UndefinedColumnPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            policy: UndefinedColumnPolicy::default(),
        }
    }

    /// Set the policy for undefined native columns.
    pub fn with_policy(mut self, policy: UndefinedColumnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &'a SchemaCatalog {
        self.catalog
    }

    /// Reconcile one table, native or foreign depending on its handle.
    pub fn reconcile(
        &self,
        input: TableInput<'_>,
        writer: &mut DatasetWriter,
        diagnostics: &mut Diagnostics,
    ) -> Result<ReconciledTable> {
        if self.catalog.is_native(input.handle) {
            self.reconcile_native(input, writer, diagnostics)
        } else {
            self.reconcile_foreign(input, writer, diagnostics)
        }
    }

    /// Url of the table a foreign key points at. `reference` may be a url,
    /// a handle or a component id, of a table in the dataset or in the
    /// catalog; anything else is taken as a handle.
    fn resource_url(&self, dataset: &Dataset, reference: &str) -> String {
        if let Some(url) = dataset.table_url(reference) {
            return url.to_string();
        }
        if let Some(definition) = self
            .catalog
            .definition(reference)
            .or_else(|| self.catalog.definition_by_id(reference))
        {
            return definition.url.clone();
        }
        if reference.ends_with(".csv") {
            reference.to_string()
        } else {
            format!("{}.csv", reference)
        }
    }
}

/// Give every override a name, defaulting to its key.
pub fn normalize_overrides(columns: &ColumnOverrides) -> ColumnOverrides {
    columns
        .iter()
        .map(|(key, column)| (key.clone(), column.clone().or_named(key)))
        .collect()
}

/// Rename `from` to `to`; the first column keeps a contested name.
fn rename(rows: &mut RowSet, from: &str, to: &str, table: &str) {
    if !rows.rename_column(from, to) {
        tracing::debug!(
            target: "cldfkit",
            table,
            column = from,
            canonical = to,
            "canonical name already taken, column keeps its input name"
        );
    }
}
