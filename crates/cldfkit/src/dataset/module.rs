//! CLDF modules (dataset profiles).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CldfError;
use crate::schema::{url_fragment, CLDF_TERMS};

/// The kind of dataset, recorded as the dataset's `dc:conformsTo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Module {
    /// No required components.
    #[default]
    Generic,
    /// Lexical data: forms of parameters in languages.
    Wordlist,
    /// Typological data: values of parameters for languages.
    StructureDataset,
    Dictionary,
    ParallelText,
}

impl Module {
    pub fn name(&self) -> &'static str {
        match self {
            Module::Generic => "Generic",
            Module::Wordlist => "Wordlist",
            Module::StructureDataset => "StructureDataset",
            Module::Dictionary => "Dictionary",
            Module::ParallelText => "ParallelText",
        }
    }

    /// Term URL used as the dataset's `dc:conformsTo`.
    pub fn conforms_to(&self) -> String {
        format!("{}#{}", CLDF_TERMS, self.name())
    }

    /// Recover the module from a `dc:conformsTo` URL.
    pub fn from_conforms_to(url: &str) -> Option<Self> {
        url_fragment(url).and_then(|name| name.parse().ok())
    }

    /// Components a dataset of this module must contain.
    pub fn required_components(&self) -> &'static [&'static str] {
        match self {
            Module::Generic => &[],
            Module::Wordlist => &["FormTable"],
            Module::StructureDataset => &["ValueTable"],
            Module::Dictionary => &["EntryTable", "SenseTable"],
            Module::ParallelText => &["FormTable"],
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Module {
    type Err = CldfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Generic" => Ok(Module::Generic),
            "Wordlist" => Ok(Module::Wordlist),
            "StructureDataset" => Ok(Module::StructureDataset),
            "Dictionary" => Ok(Module::Dictionary),
            "ParallelText" => Ok(Module::ParallelText),
            other => Err(CldfError::Config(format!("Unknown CLDF module '{}'", other))),
        }
    }
}
