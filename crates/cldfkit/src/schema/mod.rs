//! CSVW schema types: columns, datatypes and table definitions.

mod column;
mod table;
mod types;

pub use column::ColumnSpec;
pub use table::{ForeignKey, ForeignKeyReference, TableSchema, TableSpec};
pub use types::{Datatype, DatatypeSpec};

/// Namespace of the CLDF ontology terms.
pub const CLDF_TERMS: &str = "http://cldf.clld.org/v1.0/terms.rdf";

/// Fragment after `#` of a property or conformance URL.
pub fn url_fragment(url: &str) -> Option<&str> {
    url.split_once('#').map(|(_, fragment)| fragment)
}
