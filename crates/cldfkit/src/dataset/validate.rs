//! Structural validation of a written dataset.
//!
//! Validation reads every table file back and checks it against the
//! dataset's schema. All problems are collected and reported together as
//! one [`CldfError::Validation`].

use std::collections::HashSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CldfError, Result};
use crate::schema::{ColumnSpec, Datatype, TableSpec};
use crate::sources::citation_key;

use super::reader::{RawTable, parse_boolean, read_raw_table};
use super::Dataset;

// A `Source` item: citation key, optionally followed by a page range.
static SOURCE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\[\]\s]+\s*(?:\[[^\]]*\])?$").unwrap());

/// Check a written dataset against its schema.
pub fn validate_dataset(dataset: &Dataset) -> Result<()> {
    let mut problems = Vec::new();

    let metadata_path = dataset.metadata_path();
    if !metadata_path.is_file() {
        problems.push(format!(
            "Metadata file '{}' does not exist",
            metadata_path.display()
        ));
    }

    let module = dataset.module();
    for component in module.required_components() {
        if !dataset
            .tables()
            .iter()
            .any(|t| t.component_id() == Some(*component))
        {
            problems.push(format!("{} dataset has no {}", module, component));
        }
    }

    let mut loaded: IndexMap<&str, RawTable> = IndexMap::new();
    for table in dataset.tables() {
        let path = dataset.directory().join(&table.url);
        if !path.is_file() {
            problems.push(format!("Table file '{}' does not exist", path.display()));
            continue;
        }
        match read_raw_table(&path) {
            Ok(raw) => {
                if check_table(table, &raw, &mut problems)? {
                    loaded.insert(table.url.as_str(), raw);
                }
            }
            Err(e) => problems.push(format!("{}: {}", table.url, e)),
        }
    }

    check_foreign_keys(dataset, &loaded, &mut problems);
    check_source_references(dataset, &loaded, &mut problems);

    if problems.is_empty() {
        tracing::debug!(target: "cldfkit", tables = loaded.len(), "dataset is valid");
        Ok(())
    } else {
        Err(CldfError::Validation(problems))
    }
}

/// Checks of one table on its own. Returns false if the header does not
/// match the schema, in which case cell checks are skipped.
fn check_table(table: &TableSpec, raw: &RawTable, problems: &mut Vec<String>) -> Result<bool> {
    let expected = table.column_names();
    if raw.header != expected {
        problems.push(format!(
            "{}: header [{}] does not match schema columns [{}]",
            table.url,
            raw.header.join(", "),
            expected.join(", ")
        ));
        return Ok(false);
    }

    let formats: Vec<Option<Regex>> = table
        .columns()
        .iter()
        .map(|column| {
            column
                .datatype
                .as_ref()
                .and_then(Datatype::format)
                .map(|format| Regex::new(&format!("^(?:{})$", format)))
                .transpose()
        })
        .collect::<std::result::Result<_, _>>()?;

    for (index, row) in raw.rows.iter().enumerate() {
        let line = index + 2;
        if row.len() != expected.len() {
            problems.push(format!(
                "{}:{}: {} cells, expected {}",
                table.url,
                line,
                row.len(),
                expected.len()
            ));
            continue;
        }
        for ((column, format), cell) in table.columns().iter().zip(&formats).zip(row) {
            if cell.is_empty() {
                if column.required {
                    problems.push(format!(
                        "{}:{}: required column '{}' is empty",
                        table.url, line, column.name
                    ));
                }
                continue;
            }
            for item in items(cell, column) {
                if let Some(problem) = check_value(item, column, format.as_ref()) {
                    problems.push(format!("{}:{}: {}", table.url, line, problem));
                }
            }
        }
    }

    check_primary_key(table, raw, problems);
    Ok(true)
}

/// Cell items: the separated parts of a list cell, or the cell itself.
fn items<'a>(cell: &'a str, column: &ColumnSpec) -> Vec<&'a str> {
    match column.separator.as_deref() {
        Some(separator) => cell
            .split(separator)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect(),
        None => vec![cell],
    }
}

fn check_value(value: &str, column: &ColumnSpec, format: Option<&Regex>) -> Option<String> {
    if let Some(format) = format {
        if !format.is_match(value) {
            return Some(format!(
                "value '{}' of column '{}' does not match format '{}'",
                value,
                column.name,
                format.as_str()
            ));
        }
    }

    let datatype = column.datatype.as_ref()?;
    if datatype.is_numeric() {
        let number = if datatype.is_integer() {
            value.parse::<i64>().ok().map(|n| n as f64)
        } else {
            value.parse::<f64>().ok().filter(|n| n.is_finite())
        };
        let Some(number) = number else {
            return Some(format!(
                "value '{}' of column '{}' is not a valid {}",
                value,
                column.name,
                datatype.base()
            ));
        };
        if let Some(minimum) = datatype.minimum().filter(|&m| number < m) {
            return Some(format!(
                "value {} of column '{}' is below the minimum {}",
                value, column.name, minimum
            ));
        }
        if let Some(maximum) = datatype.maximum().filter(|&m| number > m) {
            return Some(format!(
                "value {} of column '{}' is above the maximum {}",
                value, column.name, maximum
            ));
        }
        return None;
    }

    match datatype.base() {
        "boolean" if parse_boolean(value).is_none() => Some(format!(
            "value '{}' of column '{}' is not a boolean",
            value, column.name
        )),
        "json" if serde_json::from_str::<serde_json::Value>(value).is_err() => Some(format!(
            "value of column '{}' is not valid JSON",
            column.name
        )),
        _ => None,
    }
}

fn check_primary_key(table: &TableSpec, raw: &RawTable, problems: &mut Vec<String>) {
    let Some(indices) = column_indices(raw, table.primary_key()) else {
        return;
    };
    if indices.is_empty() {
        return;
    }
    let mut seen = HashSet::new();
    for (index, row) in raw.rows.iter().enumerate() {
        let key: Vec<&str> = indices.iter().filter_map(|&i| row.get(i).map(String::as_str)).collect();
        if !seen.insert(key.clone()) {
            problems.push(format!(
                "{}:{}: duplicate primary key '{}'",
                table.url,
                index + 2,
                key.join(", ")
            ));
        }
    }
}

fn column_indices(raw: &RawTable, names: &[String]) -> Option<Vec<usize>> {
    names.iter().map(|name| raw.column_index(name)).collect()
}

fn check_foreign_keys(dataset: &Dataset, loaded: &IndexMap<&str, RawTable>, problems: &mut Vec<String>) {
    for table in dataset.tables() {
        let Some(raw) = loaded.get(table.url.as_str()) else {
            continue;
        };
        for foreign_key in table.foreign_keys() {
            let resource = &foreign_key.reference.resource;
            let Some(target) = dataset.table(resource) else {
                problems.push(format!(
                    "{}: foreign key on [{}] references missing table '{}'",
                    table.url,
                    foreign_key.column_reference.join(", "),
                    resource
                ));
                continue;
            };
            let Some(target_raw) = loaded.get(target.url.as_str()) else {
                continue;
            };
            let (Some(local), Some(remote)) = (
                column_indices(raw, &foreign_key.column_reference),
                column_indices(target_raw, &foreign_key.reference.column_reference),
            ) else {
                problems.push(format!(
                    "{}: foreign key on [{}] uses columns missing from the data",
                    table.url,
                    foreign_key.column_reference.join(", ")
                ));
                continue;
            };

            let known: HashSet<Vec<&str>> = target_raw
                .rows
                .iter()
                .map(|row| remote.iter().filter_map(|&i| row.get(i).map(String::as_str)).collect())
                .collect();

            for (index, row) in raw.rows.iter().enumerate() {
                let values: Vec<Vec<&str>> = if let [column] = local.as_slice() {
                    let spec = &table.columns()[*column];
                    let cell = row.get(*column).map_or("", String::as_str);
                    if cell.is_empty() {
                        continue;
                    }
                    items(cell, spec).into_iter().map(|item| vec![item]).collect()
                } else {
                    let key: Vec<&str> = local.iter().filter_map(|&i| row.get(i).map(String::as_str)).collect();
                    if key.iter().all(|v| v.is_empty()) {
                        continue;
                    }
                    vec![key]
                };
                for value in values {
                    if !known.contains(&value) {
                        problems.push(format!(
                            "{}:{}: '{}' not found in {}",
                            table.url,
                            index + 2,
                            value.join(", "),
                            target.url
                        ));
                    }
                }
            }
        }
    }
}

fn check_source_references(dataset: &Dataset, loaded: &IndexMap<&str, RawTable>, problems: &mut Vec<String>) {
    let keys: HashSet<&str> = dataset.sources().iter().map(|s| s.key.as_str()).collect();
    for table in dataset.tables() {
        let Some(raw) = loaded.get(table.url.as_str()) else {
            continue;
        };
        for (position, column) in table.columns().iter().enumerate() {
            if column.semantic_handle() != Some("source") && column.name != "Source" {
                continue;
            }
            for (index, row) in raw.rows.iter().enumerate() {
                let cell = row.get(position).map_or("", String::as_str);
                for item in items(cell, column).into_iter().filter(|i| !i.is_empty()) {
                    if !SOURCE_REFERENCE.is_match(item) {
                        problems.push(format!(
                            "{}:{}: malformed source reference '{}'",
                            table.url,
                            index + 2,
                            item
                        ));
                        continue;
                    }
                    let key = citation_key(item);
                    if !keys.contains(key) {
                        problems.push(format!(
                            "{}:{}: source '{}' is not in the bibliography",
                            table.url,
                            index + 2,
                            key
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::dataset::{DatasetWriter, Module};
    use crate::input::Record;
    use crate::sources::Source;
    use serde_json::json;
    use std::path::Path;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn wordlist(dir: &Path) -> DatasetWriter {
        let catalog = SchemaCatalog::bundled().unwrap();
        let mut dataset = Dataset::new(dir, "metadata.json", Module::Wordlist);
        for handle in ["languages", "parameters", "forms"] {
            dataset
                .add_component(catalog.definition(handle).unwrap().clone())
                .unwrap();
        }
        dataset.add_sources(vec![Source::new("book", "meier2005")]);
        let mut writer = DatasetWriter::new(dataset);
        writer
            .append_rows("languages", vec![record(json!({"ID": "ikp", "Latitude": "-11.5"}))])
            .unwrap();
        writer
            .append_rows("parameters", vec![record(json!({"ID": "hand", "Name": "hand"}))])
            .unwrap();
        writer
    }

    fn problems(result: Result<()>) -> Vec<String> {
        match result {
            Err(CldfError::Validation(problems)) => problems,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_wordlist() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = wordlist(dir.path());
        writer
            .append_rows(
                "forms",
                vec![record(json!({
                    "ID": "f1", "Language_ID": "ikp", "Parameter_ID": "hand",
                    "Form": "yay", "Source": ["meier2005[12]"]
                }))],
            )
            .unwrap();
        let dataset = writer.finish().unwrap();
        validate_dataset(&dataset).unwrap();
    }

    #[test]
    fn test_detects_broken_references() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = wordlist(dir.path());
        writer
            .append_rows(
                "forms",
                vec![
                    record(json!({
                        "ID": "f1", "Language_ID": "nope", "Parameter_ID": "hand",
                        "Form": "yay", "Source": "smith1999"
                    })),
                    record(json!({"ID": "f1", "Language_ID": "ikp", "Parameter_ID": "hand", "Form": ""})),
                ],
            )
            .unwrap();
        let dataset = writer.finish().unwrap();

        let problems = problems(validate_dataset(&dataset));
        assert!(problems.iter().any(|p| p.contains("'nope' not found in languages.csv")));
        assert!(problems.iter().any(|p| p.contains("source 'smith1999'")));
        assert!(problems.iter().any(|p| p.contains("duplicate primary key 'f1'")));
        assert!(problems.iter().any(|p| p.contains("required column 'Form' is empty")));
    }

    #[test]
    fn test_detects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = wordlist(dir.path());
        writer
            .append_rows(
                "languages",
                vec![
                    record(json!({"ID": "bad id", "Glottocode": "ikpe1245"})),
                    record(json!({"ID": "north", "Latitude": "95"})),
                    record(json!({"ID": "east", "Longitude": "far"})),
                ],
            )
            .unwrap();
        let dataset = writer.finish().unwrap();

        let problems = problems(validate_dataset(&dataset));
        assert!(problems.iter().any(|p| p.contains("'bad id' of column 'ID' does not match")));
        assert!(problems.iter().any(|p| p.contains("above the maximum")));
        assert!(problems.iter().any(|p| p.contains("'far' of column 'Longitude' is not a valid decimal")));
        assert!(!problems.iter().any(|p| p.contains("Glottocode")));
    }

    #[test]
    fn test_module_requirements_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(dir.path(), "metadata.json", Module::Dictionary);
        dataset.add_component(TableSpec::ad_hoc("notes.csv")).unwrap();

        let problems = problems(validate_dataset(&dataset));
        assert!(problems.iter().any(|p| p.contains("Metadata file")));
        assert!(problems.iter().any(|p| p == "Dictionary dataset has no EntryTable"));
        assert!(problems.iter().any(|p| p == "Dictionary dataset has no SenseTable"));
        assert!(problems.iter().any(|p| p.contains("notes.csv") && p.contains("does not exist")));
    }

    #[test]
    fn test_header_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(dir.path(), "metadata.json", Module::Generic);
        let mut table = TableSpec::ad_hoc("notes.csv");
        table.push_column(ColumnSpec::new("ID"));
        dataset.add_component(table).unwrap();
        let dataset = DatasetWriter::new(dataset).finish().unwrap();
        std::fs::write(dir.path().join("notes.csv"), "Identifier\nn1\n").unwrap();

        let problems = problems(validate_dataset(&dataset));
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("does not match schema columns [ID]"));
    }
}
