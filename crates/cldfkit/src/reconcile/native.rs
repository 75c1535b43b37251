//! Tables whose handle names a catalog component.

use indexmap::IndexMap;

use crate::dataset::{Dataset, DatasetWriter};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{CldfError, Result};
use crate::resolve::{capitalize, resolve_column};
use crate::schema::ColumnSpec;

use super::{normalize_overrides, rename, ReconciledTable, Reconciler, TableInput, UndefinedColumnPolicy};

impl Reconciler<'_> {
    /// Reconcile a table whose handle is a catalog component.
    ///
    /// Input columns are matched against the component's own columns, then
    /// against the general dictionary, then against the user overrides;
    /// anything left is novel and named by capitalizing it. Columns found
    /// outside the component ("added" and novel columns) are handled by the
    /// [`UndefinedColumnPolicy`]. Overrides replace catalog definitions of
    /// the same name, and foreign keys are added once every column exists.
    pub fn reconcile_native(
        &self,
        input: TableInput<'_>,
        writer: &mut DatasetWriter,
        diagnostics: &mut Diagnostics,
    ) -> Result<ReconciledTable> {
        let handle = input.handle;
        let catalog = self.catalog;
        let (Some(component_id), Some(own), Some(definition)) = (
            catalog.component_id(handle),
            catalog.dictionary(handle),
            catalog.definition(handle),
        ) else {
            return Err(CldfError::Catalog(format!(
                "'{}' is not a catalog component",
                handle
            )));
        };
        let overrides = normalize_overrides(input.columns);

        let mut rows = input.rows;
        let mut added: IndexMap<String, ColumnSpec> = IndexMap::new();
        for raw in rows.columns().to_vec() {
            let canonical = if let Some(column) = resolve_column(&raw, own) {
                column.name.clone()
            } else if let Some(column) = resolve_column(&raw, catalog.general()) {
                added.insert(column.name.clone(), column.clone());
                column.name.clone()
            } else if let Some(column) = overrides.get(&raw) {
                column.name.clone()
            } else {
                let name = capitalize(&raw);
                added.insert(name.clone(), ColumnSpec::new(&name));
                name
            };
            rename(&mut rows, &raw, &canonical, handle);
        }

        let dataset = writer.dataset_mut();
        if dataset.has_table_with_prefix(handle) {
            diagnostics.error(
                DiagnosticKind::DuplicateComponent,
                handle,
                None,
                format!("Table {} already exists in dataset", handle),
            );
        } else {
            dataset.add_component(definition.clone())?;
        }

        // The table taking this component's rows: the component itself, or
        // whichever table claimed the handle first.
        let target = dataset
            .table_url(component_id)
            .or_else(|| {
                dataset
                    .tables()
                    .iter()
                    .find(|t| t.url.starts_with(handle))
                    .map(|t| t.url.as_str())
            })
            .ok_or_else(|| CldfError::Schema(format!("No table for component '{}'", component_id)))?
            .to_string();

        for column in input.remove_columns {
            if own.contains_key(column) {
                if dataset.remove_columns(&target, &[column.as_str()])? > 0 {
                    diagnostics.info(
                        DiagnosticKind::RemovedColumn,
                        handle,
                        Some(column.as_str()),
                        format!("Removing column {} from {}", column, handle),
                    );
                }
            } else {
                diagnostics.warn(
                    DiagnosticKind::MissingColumn,
                    handle,
                    Some(column.as_str()),
                    format!("Column {} not found in {}, cannot remove it", column, handle),
                );
            }
        }

        for (name, column) in added {
            if overrides.iter().any(|(key, o)| *key == name || o.name == name) {
                continue;
            }
            match self.policy {
                UndefinedColumnPolicy::Warn => diagnostics.warn(
                    DiagnosticKind::UndefinedColumn,
                    handle,
                    Some(name.as_str()),
                    format!("Undefined column {} in data", name),
                ),
                UndefinedColumnPolicy::Register => {
                    let exists = dataset.table(&target).is_some_and(|t| t.has_column(&name));
                    if !exists {
                        dataset.add_columns(&target, [column])?;
                        diagnostics.info(
                            DiagnosticKind::AddedColumn,
                            handle,
                            Some(name.as_str()),
                            format!("Adding unspecified column {} to {}", name, handle),
                        );
                    }
                }
            }
        }

        // Replaced in place: position and keys on the column are kept.
        for (key, column) in &overrides {
            let has = |dataset: &Dataset, name: &str| {
                dataset.table(&target).is_some_and(|t| t.has_column(name))
            };
            if has(dataset, key) {
                if column.name != *key && has(dataset, &column.name) {
                    dataset.remove_columns(&target, &[column.name.as_str()])?;
                }
                dataset.replace_column(&target, key, column.clone())?;
            } else if has(dataset, &column.name) {
                dataset.replace_column(&target, &column.name, column.clone())?;
            } else {
                dataset.add_columns(&target, [column.clone()])?;
            }
        }

        for (column, (table, referenced)) in input.foreign_keys {
            let column = overrides.get(column).map_or(column.as_str(), |c| c.name.as_str());
            let resource = self.resource_url(dataset, table);
            dataset.add_foreign_key(&target, column, &resource, referenced)?;
        }

        let table = if dataset.table_url(component_id).is_some() {
            component_id.to_string()
        } else {
            target
        };
        Ok(ReconciledTable {
            table,
            rows: rows.into_records(),
        })
    }
}
