//! Tables with a handle the catalog does not know.

use crate::dataset::DatasetWriter;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::resolve::{capitalize, resolve_column};
use crate::schema::{ColumnSpec, TableSpec};

use super::{normalize_overrides, rename, ReconciledTable, Reconciler, TableInput};

impl Reconciler<'_> {
    /// Reconcile an ad hoc table, stored as `<handle>.csv`.
    ///
    /// Columns resolve against the general dictionary only. Unresolved
    /// columns take the name of a matching user override, or their
    /// capitalized input name. The table and its columns are created the
    /// first time the handle is seen; later calls only rename rows, which
    /// come out the same since resolution is deterministic.
    pub fn reconcile_foreign(
        &self,
        input: TableInput<'_>,
        writer: &mut DatasetWriter,
        diagnostics: &mut Diagnostics,
    ) -> Result<ReconciledTable> {
        let url = format!("{}.csv", input.handle);
        let overrides = normalize_overrides(input.columns);

        let mut rows = input.rows;
        let discovered: Vec<(String, ColumnSpec)> = rows
            .columns()
            .iter()
            .map(|raw| {
                let column = resolve_column(raw, self.catalog.general())
                    .or_else(|| overrides.get(raw))
                    .cloned()
                    .unwrap_or_else(|| ColumnSpec::new(capitalize(raw)));
                (raw.clone(), column)
            })
            .collect();

        let dataset = writer.dataset_mut();
        let create = !dataset.has_table_url(&url);
        if create {
            dataset.add_component(TableSpec::ad_hoc(&url))?;
            for (_, column) in &discovered {
                if dataset.table(&url).is_some_and(|t| t.has_column(&column.name)) {
                    continue;
                }
                let name = column.name.clone();
                dataset.add_columns(&url, [column.clone()])?;
                diagnostics.info(
                    DiagnosticKind::AddedColumn,
                    &url,
                    Some(name.as_str()),
                    format!("Adding unspecified column: {}", name),
                );
            }
        }

        for (raw, column) in &discovered {
            rename(&mut rows, raw, &column.name, input.handle);
        }

        if create {
            for (column, (table, referenced)) in input.foreign_keys {
                let column = overrides.get(column).map_or(column.as_str(), |c| c.name.as_str());
                let resource = self.resource_url(dataset, table);
                dataset.add_foreign_key(&url, column, &resource, referenced)?;
            }
        }

        Ok(ReconciledTable {
            table: url,
            rows: rows.into_records(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::dataset::{Dataset, Module};
    use crate::input::{Record, RowSet};
    use crate::reconcile::{ColumnOverrides, ForeignKeyDecls};
    use indexmap::{IndexMap, IndexSet};
    use serde_json::json;

    fn rows(value: serde_json::Value) -> RowSet {
        let records: Vec<Record> = serde_json::from_value(value).unwrap();
        RowSet::from_records(records)
    }

    fn reconcile(
        reconciler: &Reconciler<'_>,
        writer: &mut DatasetWriter,
        diagnostics: &mut Diagnostics,
        columns: &ColumnOverrides,
        foreign_keys: &ForeignKeyDecls,
        data: serde_json::Value,
    ) -> ReconciledTable {
        let remove = IndexSet::new();
        let input = TableInput {
            handle: "wordforms",
            rows: rows(data),
            columns,
            foreign_keys,
            remove_columns: &remove,
        };
        reconciler.reconcile_foreign(input, writer, diagnostics).unwrap()
    }

    #[test]
    fn test_creates_ad_hoc_table() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let reconciler = Reconciler::new(&catalog);
        let mut writer = DatasetWriter::new(Dataset::new("cldf", "metadata.json", Module::Generic));
        let mut diagnostics = Diagnostics::new();

        let reconciled = reconcile(
            &reconciler,
            &mut writer,
            &mut diagnostics,
            &IndexMap::new(),
            &IndexMap::new(),
            json!([{"id": "wf-1", "form": "yay", "parameter": "tree", "colour": "green"}]),
        );
        assert_eq!(reconciled.table, "wordforms.csv");
        assert_eq!(
            reconciled.rows[0].keys().collect::<Vec<_>>(),
            vec!["ID", "Form", "Parameter_ID", "Colour"]
        );

        let table = writer.dataset().table("wordforms.csv").unwrap();
        assert!(table.conforms_to.is_none());
        assert_eq!(table.column_names(), vec!["ID", "Form", "Parameter_ID", "Colour"]);
        assert!(diagnostics.has(DiagnosticKind::AddedColumn, "Colour"));
        assert_eq!(diagnostics.count(crate::diagnostics::Severity::Warning), 0);
    }

    #[test]
    fn test_repeated_handle_registers_once() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let reconciler = Reconciler::new(&catalog);
        let mut writer = DatasetWriter::new(Dataset::new("cldf", "metadata.json", Module::Generic));
        let mut diagnostics = Diagnostics::new();
        let data = json!([{"id": "wf-1", "language": "lg-1"}]);

        let first = reconcile(&reconciler, &mut writer, &mut diagnostics, &IndexMap::new(), &IndexMap::new(), data.clone());
        let second = reconcile(&reconciler, &mut writer, &mut diagnostics, &IndexMap::new(), &IndexMap::new(), data);

        assert_eq!(first, second);
        assert_eq!(writer.dataset().tables().len(), 1);
        assert_eq!(
            writer.dataset().table("wordforms").unwrap().column_names(),
            vec!["ID", "Language_ID"]
        );
        assert_eq!(diagnostics.of_kind(DiagnosticKind::AddedColumn).count(), 2);
    }

    #[test]
    fn test_overrides_and_foreign_keys() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let reconciler = Reconciler::new(&catalog);
        let mut writer = DatasetWriter::new(Dataset::new("cldf", "metadata.json", Module::Generic));
        let mut diagnostics = Diagnostics::new();
        let columns: ColumnOverrides =
            serde_json::from_value(json!({"speaker": {"name": "Speaker_ID"}})).unwrap();
        let foreign_keys: ForeignKeyDecls =
            serde_json::from_value(json!({"speaker": ["speakers", "ID"]})).unwrap();

        let reconciled = reconcile(
            &reconciler,
            &mut writer,
            &mut diagnostics,
            &columns,
            &foreign_keys,
            json!([{"id": "wf-1", "speaker": "s1"}]),
        );
        assert!(reconciled.rows[0].contains_key("Speaker_ID"));

        let table = writer.dataset().table("wordforms").unwrap();
        assert!(table.has_column("Speaker_ID"));
        assert_eq!(table.foreign_keys().len(), 1);
        assert_eq!(table.foreign_keys()[0].reference.resource, "speakers.csv");
    }
}
