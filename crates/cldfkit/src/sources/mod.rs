//! Bibliographic sources.

mod bibtex;

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use bibtex::{parse_bibtex, parse_bibtex_file, to_bibtex};

/// One bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Citation key, referenced from `Source` columns.
    pub key: String,
    /// Entry type (`book`, `article`, ...), lower-case.
    pub genre: String,
    /// Field name (lower-case) -> value.
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

impl Source {
    pub fn new(genre: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            genre: genre.into().to_lowercase(),
            fields: IndexMap::new(),
        }
    }

    /// Set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Where the sources of a build come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    /// Path to a BibTeX file.
    Path(PathBuf),
    /// Entries that are already parsed.
    Entries(Vec<Source>),
}

/// Citation key of a `Source` cell item: `meier2005[12-14]` -> `meier2005`.
pub fn citation_key(reference: &str) -> &str {
    let reference = reference.trim();
    match reference.find('[') {
        Some(index) => reference[..index].trim_end(),
        None => reference,
    }
}
