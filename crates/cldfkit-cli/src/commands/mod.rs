//! CLI command implementations.

pub mod build;
pub mod components;
pub mod load;

use std::path::Path;

use cldfkit::SchemaCatalog;

/// The catalog from `dir`, or the bundled one.
pub fn load_catalog(dir: Option<&Path>) -> cldfkit::Result<SchemaCatalog> {
    match dir {
        Some(dir) => SchemaCatalog::load_dir(dir),
        None => SchemaCatalog::bundled(),
    }
}
