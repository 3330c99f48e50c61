// enact-core/src/infrastructure/files/document.rs

use crate::domain::dataset::{CellValue, Dataset, Table};
use crate::domain::schema::TableCollection;
use crate::error::EnactError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// One JSON object per file: { "table": [ { "column": value, ... }, ... ] }.
// Cells travel by column name, so on the way back in the column order is
// normalized to the declared order (extra columns appended alphabetically).

pub(crate) fn read(path: &Path, tables: &TableCollection) -> Result<Dataset, EnactError> {
    let file = std::fs::File::open(path).map_err(InfrastructureError::Io)?;
    let document: BTreeMap<String, Vec<BTreeMap<String, CellValue>>> =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(InfrastructureError::from)?;

    let mut dataset = Dataset::new();
    for schema in tables.tables() {
        let rows = document.get(schema.name()).cloned().unwrap_or_default();

        let mut columns = schema.column_order();
        let mut extras: BTreeSet<String> = BTreeSet::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    extras.insert(key.clone());
                }
            }
        }
        columns.extend(extras);

        let mut table = Table::new(columns.clone());
        for row in rows {
            let cells: Vec<CellValue> = columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or(CellValue::Null))
                .collect();
            table.push_row(cells)?;
        }
        dataset.insert_table(schema.name(), table);
    }
    Ok(dataset)
}

pub(crate) fn write(
    path: &Path,
    _tables: &TableCollection,
    dataset: &Dataset,
    allow_overwrite: bool,
) -> Result<(), EnactError> {
    if !allow_overwrite && path.exists() {
        return Err(InfrastructureError::OverwriteRefused(path.display().to_string()).into());
    }

    let mut document: BTreeMap<&str, Vec<BTreeMap<&str, &CellValue>>> = BTreeMap::new();
    for (name, table) in dataset.tables() {
        let rows: Vec<BTreeMap<&str, &CellValue>> = table
            .rows()
            .iter()
            .map(|row| {
                table
                    .columns()
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .collect();
        document.insert(name.as_str(), rows);
    }

    let bytes = serde_json::to_vec_pretty(&document).map_err(InfrastructureError::from)?;
    fs::atomic_write(path, bytes)?;
    Ok(())
}
