//! cldfkit: build CLDF datasets from loosely shaped tables.
//!
//! Input tables are plain records keyed by whatever column names the data
//! happens to use. cldfkit matches those names against the catalog of CLDF
//! components, registers the matching components, merges user column
//! overrides, removals and foreign keys, and writes a dataset that conforms
//! to the CLDF schema.
//!
//! # Core Principles
//!
//! - **Catalog-driven**: column meaning comes from the component vocabulary,
//!   not from code
//! - **Recoverable**: problems the build can work around are returned as
//!   [`Diagnostics`] instead of aborting
//! - **Checked output**: the written dataset is validated before it is handed
//!   back
//!
//! # Example
//!
//! ```no_run
//! use cldfkit::{BuildRequest, DatasetBuilder};
//! use serde_json::json;
//!
//! let request: BuildRequest = serde_json::from_value(json!({
//!     "tables": {
//!         "languages": [{"id": "lg-1", "name": "Ikpeng"}],
//!         "forms": [{"id": "form-1", "form": "yay", "parameter": "tree", "language": "lg-1"}]
//!     },
//!     "spec": {"dir": "./cldf", "module": "Wordlist"}
//! }))
//! .unwrap();
//!
//! let outcome = DatasetBuilder::new().unwrap().build(request).unwrap();
//! println!("Tables: {}", outcome.dataset.tables().len());
//! println!("Diagnostics: {}", outcome.diagnostics.len());
//! ```

pub mod catalog;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod input;
pub mod reconcile;
pub mod resolve;
pub mod schema;
pub mod sources;

mod build;

pub use crate::build::{
    create_dataset, BuildOutcome, BuildRequest, BuildSpec, BuildSummary, DatasetBuilder, RawComponent,
};
pub use catalog::SchemaCatalog;
pub use dataset::{load_dataset, validate_dataset, Dataset, DatasetContents, DatasetWriter, Metadata, Module};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{CldfError, Result};
pub use input::{Record, RowSet};
pub use reconcile::{ReconciledTable, Reconciler, UndefinedColumnPolicy};
pub use resolve::resolve_column;
pub use schema::{ColumnSpec, TableSpec};
pub use sources::{Source, Sources};
