// enact-core/src/infrastructure/files/csv_dir.rs

use crate::domain::dataset::{CellValue, Dataset, Table};
use crate::domain::schema::TableCollection;
use crate::error::EnactError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// Reads every declared table from `dir/<table>.csv`. A table whose file is
/// absent comes back empty with its declared columns, so an action can start
/// from a sparse input directory.
pub(crate) fn read(dir: &Path, tables: &TableCollection) -> Result<Dataset, EnactError> {
    let mut dataset = Dataset::new();
    for schema in tables.tables() {
        let path = dir.join(format!("{}.csv", schema.name()));
        let table = if path.is_file() {
            read_table(&path)?
        } else {
            Table::new(schema.column_order())
        };
        dataset.insert_table(schema.name(), table);
    }
    warn_stray_files(dir, tables);
    Ok(dataset)
}

// A typo'd file name silently yields an empty table; make the mismatch
// visible instead of guessing.
fn warn_stray_files(dir: &Path, tables: &TableCollection) {
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
    {
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }
        let declared = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| tables.table(stem).is_some());
        if !declared {
            warn!(file = %path.display(), "CSV file is not declared by the binding; ignored");
        }
    }
}

fn read_table(path: &Path) -> Result<Table, EnactError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(InfrastructureError::from)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(InfrastructureError::from)?
        .iter()
        .map(String::from)
        .collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(InfrastructureError::from)?;
        let row: Vec<CellValue> = record.iter().map(parse_cell).collect();
        table.push_row(row)?;
    }
    Ok(table)
}

// CSV carries no type information; cells are re-typed on the way in. This is
// as loose as the format itself: the text "007" reads back as the integer 7.
fn parse_cell(text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Null;
    }
    if text.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    if let Ok(whole) = text.parse::<i64>() {
        return CellValue::Integer(whole);
    }
    if let Ok(real) = text.parse::<f64>() {
        return CellValue::Float(real);
    }
    CellValue::Text(text.to_string())
}

pub(crate) fn write(
    dir: &Path,
    tables: &TableCollection,
    dataset: &Dataset,
    allow_overwrite: bool,
) -> Result<(), EnactError> {
    if !allow_overwrite {
        for schema in tables.tables() {
            let path = dir.join(format!("{}.csv", schema.name()));
            if path.exists() {
                return Err(
                    InfrastructureError::OverwriteRefused(path.display().to_string()).into(),
                );
            }
        }
    }

    std::fs::create_dir_all(dir).map_err(InfrastructureError::Io)?;
    for (name, table) in dataset.tables() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(table.columns())
            .map_err(InfrastructureError::from)?;
        for row in table.rows() {
            let rendered: Vec<String> = row.iter().map(CellValue::to_string).collect();
            writer
                .write_record(&rendered)
                .map_err(InfrastructureError::from)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| InfrastructureError::Io(std::io::Error::other(e.to_string())))?;

        fs::atomic_write(dir.join(format!("{}.csv", name)), bytes)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::schema::TableSchema;
    use anyhow::Result;
    use tempfile::tempdir;

    fn declared() -> TableCollection {
        TableCollection::new()
            .with_table(TableSchema::new("orders", ["id"], ["note", "qty", "ratio"]))
            .with_table(TableSchema::new("refunds", ["id"], ["amount"]))
    }

    #[test]
    fn test_round_trip_preserves_cells() -> Result<()> {
        let dir = tempdir()?;
        let mut orders = Table::new(vec![
            "id".into(),
            "note".into(),
            "qty".into(),
            "ratio".into(),
        ]);
        orders.push_row(vec![
            1i64.into(),
            "with, comma".into(),
            CellValue::Null,
            2.0.into(),
        ])?;
        orders.push_row(vec![2i64.into(), "plain".into(), 7i64.into(), 0.5.into()])?;
        let mut dataset = Dataset::new();
        dataset.insert_table("orders", orders);

        write(dir.path(), &declared(), &dataset, true)?;
        let back = read(dir.path(), &declared())?;

        assert_eq!(back.table("orders"), dataset.table("orders"));
        Ok(())
    }

    #[test]
    fn test_missing_file_reads_as_empty_declared_table() -> Result<()> {
        let dir = tempdir()?;
        let dataset = read(dir.path(), &declared())?;

        let refunds = dataset.table("refunds").unwrap();
        assert!(refunds.is_empty());
        assert_eq!(refunds.columns(), ["id", "amount"]);
        Ok(())
    }

    #[test]
    fn test_overwrite_refused_when_any_table_file_exists() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("orders.csv"), "id\n1\n")?;

        let err = write(dir.path(), &declared(), &Dataset::new(), false).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite"), "{err}");
        Ok(())
    }

    #[test]
    fn test_stray_csv_is_ignored() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("ordrs.csv"), "id\n1\n")?;

        let dataset = read(dir.path(), &declared())?;
        assert!(dataset.table("ordrs").is_none());
        assert_eq!(dataset.len(), 2);
        Ok(())
    }

    #[test]
    fn test_cell_parsing_is_typed() {
        assert_eq!(parse_cell(""), CellValue::Null);
        assert_eq!(parse_cell("TRUE"), CellValue::Bool(true));
        assert_eq!(parse_cell("-3"), CellValue::Integer(-3));
        assert_eq!(parse_cell("2.5"), CellValue::Float(2.5));
        assert_eq!(parse_cell("2.0"), CellValue::Float(2.0));
        assert_eq!(parse_cell("widget"), CellValue::Text("widget".into()));
    }
}
