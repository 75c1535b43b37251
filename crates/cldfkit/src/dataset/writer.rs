//! Schema-writing session: collects rows per table and writes the dataset.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{CldfError, Result};
use crate::input::Record;
use crate::schema::TableSpec;
use crate::sources::to_bibtex;

use super::Dataset;

/// One dataset build in progress.
///
/// The writer owns the dataset and a row store keyed by table url.
/// [`DatasetWriter::finish`] writes the metadata document, one CSV file per
/// table and the bibliography, and hands the dataset back.
#[derive(Debug)]
pub struct DatasetWriter {
    dataset: Dataset,
    objects: IndexMap<String, Vec<Record>>,
}

impl DatasetWriter {
    /// Start a session for `dataset`.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            objects: IndexMap::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// Append rows to the table named by `table` (url, component id or handle).
    pub fn append_rows(&mut self, table: &str, rows: impl IntoIterator<Item = Record>) -> Result<()> {
        let url = self
            .dataset
            .table_url(table)
            .ok_or_else(|| CldfError::Schema(format!("Table '{}' not found in dataset", table)))?
            .to_string();
        self.objects.entry(url).or_default().extend(rows);
        Ok(())
    }

    /// Rows collected so far for a table.
    pub fn rows(&self, table: &str) -> &[Record] {
        self.dataset
            .table_url(table)
            .and_then(|url| self.objects.get(url))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Write everything to the dataset directory.
    pub fn finish(self) -> Result<Dataset> {
        let directory = self.dataset.directory();
        fs::create_dir_all(directory).map_err(|e| CldfError::io(directory, e))?;

        for table in self.dataset.tables() {
            let rows = self.objects.get(&table.url).map_or(&[][..], Vec::as_slice);
            write_table(&directory.join(&table.url), table, rows)?;
        }

        if !self.dataset.sources().is_empty() {
            let path = self.dataset.bib_path();
            fs::write(&path, to_bibtex(self.dataset.sources())).map_err(|e| CldfError::io(&path, e))?;
        }

        let path = self.dataset.metadata_path();
        write_metadata(&path, &self.dataset)?;

        tracing::debug!(
            target: "cldfkit",
            path = %path.display(),
            tables = self.dataset.tables().len(),
            "wrote dataset"
        );
        Ok(self.dataset)
    }
}

fn write_metadata(path: &Path, dataset: &Dataset) -> Result<()> {
    let document = dataset.to_metadata_document()?;
    let file = File::create(path).map_err(|e| CldfError::io(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

/// Write one table; only the schema's columns are written.
fn write_table(path: &Path, table: &TableSpec, rows: &[Record]) -> Result<()> {
    let file = File::create(path).map_err(|e| CldfError::io(path, e))?;
    if table.columns().is_empty() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer.write_record(table.column_names())?;
    for row in rows {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|column| render_cell(row.get(&column.name), column.separator.as_deref()))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush().map_err(|e| CldfError::io(path, e))?;
    Ok(())
}

/// Text form of a cell. Lists are joined with the column separator.
pub(crate) fn render_cell(value: Option<&Value>, separator: Option<&str>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| render_cell(Some(item), None))
            .collect::<Vec<_>>()
            .join(separator.unwrap_or(" ")),
        Some(object @ Value::Object(_)) => object.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Module;
    use crate::schema::ColumnSpec;
    use serde_json::json;

    #[test]
    fn test_render_cell() {
        assert_eq!(render_cell(None, None), "");
        assert_eq!(render_cell(Some(&json!(null)), None), "");
        assert_eq!(render_cell(Some(&json!("yay")), None), "yay");
        assert_eq!(render_cell(Some(&json!(12.5)), None), "12.5");
        assert_eq!(render_cell(Some(&json!(true)), None), "true");
        assert_eq!(render_cell(Some(&json!(["a", "b"])), Some(";")), "a;b");
        assert_eq!(render_cell(Some(&json!(["y", "a", "y"])), None), "y a y");
    }

    #[test]
    fn test_finish_writes_schema_columns_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::new(dir.path(), "metadata.json", Module::Generic);
        let mut table = TableSpec::ad_hoc("things.csv");
        table.push_column(ColumnSpec::new("ID"));
        table.push_column(ColumnSpec::new("Tags").with_separator(";"));
        dataset.add_component(table).unwrap();

        let mut writer = DatasetWriter::new(dataset);
        let row: Record = serde_json::from_value(json!({
            "ID": "t-1", "Tags": ["x", "y"], "Unregistered": "dropped"
        }))
        .unwrap();
        writer.append_rows("things", vec![row]).unwrap();
        assert_eq!(writer.rows("things.csv").len(), 1);
        assert!(writer.append_rows("missing", Vec::new()).is_err());

        let dataset = writer.finish().unwrap();
        let written = fs::read_to_string(dir.path().join("things.csv")).unwrap();
        assert_eq!(written, "ID,Tags\nt-1,x;y\n");
        assert!(dataset.metadata_path().is_file());
        assert!(!dataset.bib_path().exists());
    }
}
