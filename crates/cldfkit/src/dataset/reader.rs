//! Reading a written dataset back into memory.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::{CldfError, Result};
use crate::input::Record;
use crate::schema::ColumnSpec;
use crate::sources::parse_bibtex_file;

use super::validate::validate_dataset;
use super::{Dataset, Metadata, Module};

/// Everything a dataset holds, as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetContents {
    pub module: Module,
    /// Table url -> rows, with typed cells.
    pub tables: IndexMap<String, Vec<Record>>,
    pub metadata: Metadata,
    /// The `rdf:ID` property, if set.
    pub identifier: Option<String>,
    /// Raw bibliography text, when the dataset has one.
    pub sources: Option<String>,
}

/// A table file as text: the header and the data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Read a table file without interpreting any cell. An empty file has no
/// header and no rows.
pub(crate) fn read_raw_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| CldfError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { header, rows })
}

impl Dataset {
    /// Load the dataset described by the metadata file at `path`, together
    /// with its bibliography if present.
    pub fn from_metadata(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CldfError::io(path, e))?;
        let document: Value = serde_json::from_str(&text)?;

        let fname = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CldfError::Config(format!("'{}' is not a metadata file path", path.display()))
            })?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut dataset = Self::from_metadata_document(directory, fname, document)?;
        let bib = dataset.bib_path();
        if bib.is_file() {
            dataset.add_sources(parse_bibtex_file(&bib)?);
        }
        Ok(dataset)
    }

    /// Rows of a table as written on disk, with cells typed by the schema.
    pub fn read_rows(&self, table: &str) -> Result<Vec<Record>> {
        let spec = self
            .table(table)
            .ok_or_else(|| CldfError::Schema(format!("Table '{}' not found in dataset", table)))?;
        let raw = read_raw_table(&self.directory.join(&spec.url))?;
        let columns: Vec<Option<&ColumnSpec>> =
            raw.header.iter().map(|name| spec.column(name)).collect();

        let rows = raw
            .rows
            .iter()
            .map(|row| {
                raw.header
                    .iter()
                    .zip(&columns)
                    .zip(row)
                    .map(|((name, column), cell)| (name.clone(), parse_cell(cell, *column)))
                    .collect()
            })
            .collect();
        Ok(rows)
    }
}

/// Load, validate and read a dataset from its metadata file.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DatasetContents> {
    let dataset = Dataset::from_metadata(path)?;
    validate_dataset(&dataset)?;

    let mut tables = IndexMap::new();
    for table in dataset.tables() {
        tables.insert(table.url.clone(), dataset.read_rows(&table.url)?);
    }

    let bib = dataset.bib_path();
    let sources = if bib.is_file() {
        Some(fs::read_to_string(&bib).map_err(|e| CldfError::io(&bib, e))?)
    } else {
        None
    };

    Ok(DatasetContents {
        module: dataset.module(),
        tables,
        metadata: dataset.metadata(),
        identifier: dataset.identifier().map(str::to_string),
        sources,
    })
}

/// Typed value of a cell. Empty cells stay empty strings; list columns
/// become arrays; cells that do not parse as their datatype stay text.
pub(crate) fn parse_cell(text: &str, column: Option<&ColumnSpec>) -> Value {
    let Some(column) = column else {
        return Value::String(text.to_string());
    };
    if text.is_empty() {
        return Value::String(String::new());
    }
    match column.separator.as_deref() {
        Some(separator) => Value::Array(
            text.split(separator)
                .map(|item| parse_scalar(item.trim(), column))
                .collect(),
        ),
        None => parse_scalar(text, column),
    }
}

fn parse_scalar(text: &str, column: &ColumnSpec) -> Value {
    let Some(datatype) = &column.datatype else {
        return Value::String(text.to_string());
    };
    let parsed = if datatype.is_numeric() {
        text.parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| {
                if datatype.is_integer() {
                    return None;
                }
                text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
            })
    } else {
        match datatype.base() {
            "boolean" => parse_boolean(text).map(Value::Bool),
            "json" => serde_json::from_str(text).ok(),
            _ => None,
        }
    };
    parsed.unwrap_or_else(|| Value::String(text.to_string()))
}

/// CSVW boolean lexical forms.
pub(crate) fn parse_boolean(text: &str) -> Option<bool> {
    match text {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
