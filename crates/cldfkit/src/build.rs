//! Dataset builds: the request, the driver and its outcome.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::catalog::SchemaCatalog;
use crate::dataset::{validate_dataset, Dataset, DatasetWriter, Metadata, Module, IDENTIFIER_PROPERTY};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Severity};
use crate::error::{CldfError, Result};
use crate::input::{Record, RowSet};
use crate::reconcile::{ColumnOverrides, ForeignKeyDecls, Reconciler, TableInput, UndefinedColumnPolicy};
use crate::schema::{ColumnSpec, TableSpec};
use crate::sources::{parse_bibtex_file, Source, Sources};

/// Where and as what a dataset is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSpec {
    /// Output directory.
    pub dir: PathBuf,
    /// Module name (`Generic`, `Wordlist`, ...).
    pub module: String,
    /// File name of the metadata document.
    pub metadata_fname: String,
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./cldf"),
            module: Module::Generic.name().to_string(),
            metadata_fname: "metadata.json".to_string(),
        }
    }
}

/// A component to register before any input table: either a catalog
/// component by handle or id, or a full table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawComponent {
    Name(String),
    Spec(TableSpec),
}

/// Everything one build needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRequest {
    /// Table handle -> rows, in build order.
    pub tables: IndexMap<String, Vec<Record>>,
    pub sources: Option<Sources>,
    /// Table handle -> column overrides.
    pub columns: IndexMap<String, ColumnOverrides>,
    /// Table handle -> foreign keys.
    pub foreignkeys: IndexMap<String, ForeignKeyDecls>,
    /// Table handle -> catalog columns to drop.
    pub remove_columns: IndexMap<String, IndexSet<String>>,
    pub cldf_tables: Vec<RawComponent>,
    pub metadata: Metadata,
    pub spec: BuildSpec,
    /// Dataset identifier, stored as `rdf:ID` unless already set.
    pub identifier: Option<String>,
    /// Validate the written dataset.
    pub validate: bool,
    pub undefined_columns: UndefinedColumnPolicy,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            tables: IndexMap::new(),
            sources: None,
            columns: IndexMap::new(),
            foreignkeys: IndexMap::new(),
            remove_columns: IndexMap::new(),
            cldf_tables: Vec::new(),
            metadata: Metadata::default(),
            spec: BuildSpec::default(),
            identifier: None,
            validate: true,
            undefined_columns: UndefinedColumnPolicy::default(),
        }
    }
}

impl BuildRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input table.
    pub fn with_table(mut self, handle: impl Into<String>, rows: Vec<Record>) -> Self {
        self.tables.insert(handle.into(), rows);
        self
    }

    pub fn with_sources(mut self, sources: Sources) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Override a column definition of a table.
    pub fn with_column(
        mut self,
        handle: impl Into<String>,
        key: impl Into<String>,
        column: ColumnSpec,
    ) -> Self {
        self.columns
            .entry(handle.into())
            .or_default()
            .insert(key.into(), column);
        self
    }

    /// Declare a foreign key from `column` of `handle`.
    pub fn with_foreign_key(
        mut self,
        handle: impl Into<String>,
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        self.foreignkeys
            .entry(handle.into())
            .or_default()
            .insert(column.into(), (table.into(), referenced_column.into()));
        self
    }

    /// Drop a catalog column from a native table.
    pub fn with_removed_column(mut self, handle: impl Into<String>, column: impl Into<String>) -> Self {
        self.remove_columns
            .entry(handle.into())
            .or_default()
            .insert(column.into());
        self
    }

    pub fn with_component(mut self, component: RawComponent) -> Self {
        self.cldf_tables.push(component);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the output directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.dir = dir.into();
        self
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.spec.module = module.name().to_string();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Skip validation of the written dataset.
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    pub fn with_undefined_columns(mut self, policy: UndefinedColumnPolicy) -> Self {
        self.undefined_columns = policy;
        self
    }
}

/// Result of a build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The dataset as written.
    pub dataset: Dataset,
    /// Problems the build recovered from.
    pub diagnostics: Diagnostics,
    pub metadata_path: PathBuf,
    pub summary: BuildSummary,
}

/// Counts describing a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub tables: usize,
    pub rows: usize,
    pub sources: usize,
    pub warnings: usize,
    pub errors: usize,
    pub validated: bool,
}

/// Builds datasets against one component catalog.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    catalog: Arc<SchemaCatalog>,
}

impl DatasetBuilder {
    /// Create a builder over the bundled component catalog.
    pub fn new() -> Result<Self> {
        Ok(Self::with_catalog(Arc::new(SchemaCatalog::bundled()?)))
    }

    /// Create a builder over a shared catalog.
    pub fn with_catalog(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Run one build.
    pub fn build(&self, request: BuildRequest) -> Result<BuildOutcome> {
        create_dataset(request, &self.catalog)
    }
}

/// Reconcile, write and (optionally) validate one dataset.
pub fn create_dataset(request: BuildRequest, catalog: &SchemaCatalog) -> Result<BuildOutcome> {
    let BuildRequest {
        tables,
        sources,
        columns,
        foreignkeys,
        remove_columns,
        cldf_tables,
        metadata,
        spec,
        identifier,
        validate,
        undefined_columns,
    } = request;

    let module: Module = spec.module.parse()?;
    let mut dataset = Dataset::new(&spec.dir, &spec.metadata_fname, module);
    dataset.set_metadata(&metadata);
    let mut writer = DatasetWriter::new(dataset);
    let mut diagnostics = Diagnostics::new();

    for component in cldf_tables {
        let component = match component {
            RawComponent::Spec(spec) => spec,
            RawComponent::Name(name) => catalog
                .definition(&name)
                .or_else(|| catalog.definition_by_id(&name))
                .cloned()
                .ok_or_else(|| CldfError::Catalog(format!("Unknown component '{}'", name)))?,
        };
        writer.dataset_mut().add_component(component)?;
    }

    let reconciler = Reconciler::new(catalog).with_policy(undefined_columns);
    let no_columns = ColumnOverrides::new();
    let no_foreign_keys = ForeignKeyDecls::new();
    let no_removals = IndexSet::new();
    let mut row_count = 0;

    for (handle, records) in tables {
        let input = TableInput {
            handle: &handle,
            rows: RowSet::from_records(records),
            columns: columns.get(&handle).unwrap_or(&no_columns),
            foreign_keys: foreignkeys.get(&handle).unwrap_or(&no_foreign_keys),
            remove_columns: remove_columns.get(&handle).unwrap_or(&no_removals),
        };
        let reconciled = reconciler.reconcile(input, &mut writer, &mut diagnostics)?;
        row_count += reconciled.rows.len();
        writer.append_rows(&reconciled.table, reconciled.rows)?;
    }

    let entries = collect_sources(sources, &mut diagnostics)?;
    writer.dataset_mut().add_sources(entries);

    if let Some(identifier) = identifier {
        writer
            .dataset_mut()
            .set_default_property(IDENTIFIER_PROPERTY, identifier);
    }

    let dataset = writer.finish()?;
    if validate {
        validate_dataset(&dataset)?;
    }

    let summary = BuildSummary {
        tables: dataset.tables().len(),
        rows: row_count,
        sources: dataset.sources().len(),
        warnings: diagnostics.count(Severity::Warning),
        errors: diagnostics.count(Severity::Error),
        validated: validate,
    };
    tracing::info!(
        target: "cldfkit",
        tables = summary.tables,
        rows = summary.rows,
        sources = summary.sources,
        "dataset written to {}",
        dataset.directory().display()
    );

    Ok(BuildOutcome {
        metadata_path: dataset.metadata_path(),
        dataset,
        diagnostics,
        summary,
    })
}

/// Bibliography entries of a build. A missing or empty bibliography is
/// recorded and yields no entries.
fn collect_sources(sources: Option<Sources>, diagnostics: &mut Diagnostics) -> Result<Vec<Source>> {
    let entries = match sources {
        Some(Sources::Path(path)) if path.is_file() => parse_bibtex_file(&path)?,
        Some(Sources::Path(path)) => {
            diagnostics.error(
                DiagnosticKind::NoSources,
                "sources",
                None,
                format!("Sources file {} not found.", path.display()),
            );
            return Ok(Vec::new());
        }
        Some(Sources::Entries(entries)) => entries,
        None => Vec::new(),
    };
    if entries.is_empty() {
        diagnostics.error(
            DiagnosticKind::NoSources,
            "sources",
            None,
            "No sources file(s) specified.",
        );
    }
    Ok(entries)
}
