//! Column datatypes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CSVW datatype, either a bare base name or a detailed description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datatype {
    /// Base name only, e.g. `"string"`.
    Named(String),
    /// Base with constraints.
    Detailed(DatatypeSpec),
}

/// Detailed datatype description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatypeSpec {
    #[serde(default = "default_base")]
    pub base: String,
    /// Regex every non-empty value must fully match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn default_base() -> String {
    "string".to_string()
}

impl Datatype {
    /// The base datatype name.
    pub fn base(&self) -> &str {
        match self {
            Datatype::Named(name) => name,
            Datatype::Detailed(spec) => &spec.base,
        }
    }

    /// The value format regex, if any.
    pub fn format(&self) -> Option<&str> {
        match self {
            Datatype::Named(_) => None,
            Datatype::Detailed(spec) => spec.format.as_deref(),
        }
    }

    pub fn minimum(&self) -> Option<f64> {
        match self {
            Datatype::Named(_) => None,
            Datatype::Detailed(spec) => spec.minimum.as_ref().and_then(as_number),
        }
    }

    pub fn maximum(&self) -> Option<f64> {
        match self {
            Datatype::Named(_) => None,
            Datatype::Detailed(spec) => spec.maximum.as_ref().and_then(as_number),
        }
    }

    /// Returns true if values of this datatype are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.base(),
            "decimal" | "float" | "double" | "integer" | "int" | "long" | "number"
        )
    }

    /// Returns true if values of this datatype are whole numbers.
    pub fn is_integer(&self) -> bool {
        matches!(self.base(), "integer" | "int" | "long")
    }
}

/// Bounds may be declared as JSON numbers or as numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
