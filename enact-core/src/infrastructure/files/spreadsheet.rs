// enact-core/src/infrastructure/files/spreadsheet.rs

use crate::domain::dataset::{CellValue, Dataset, Table};
use crate::domain::schema::TableCollection;
use crate::error::EnactError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs;
use calamine::{Data, Reader};
use rust_xlsxwriter::Workbook;
use std::path::Path;

// One worksheet per table, header row first. The xlsx cell model stores every
// number as a double, so whole numbers come back as integer cells after a
// round trip, including floats that happened to be whole.

pub(crate) fn read(path: &Path, tables: &TableCollection) -> Result<Dataset, EnactError> {
    let mut workbook = calamine::open_workbook_auto(path).map_err(InfrastructureError::from)?;
    let sheet_names = workbook.sheet_names();

    let mut dataset = Dataset::new();
    for schema in tables.tables() {
        if !sheet_names.iter().any(|s| s == schema.name()) {
            dataset.insert_table(schema.name(), Table::new(schema.column_order()));
            continue;
        }
        let range = workbook
            .worksheet_range(schema.name())
            .map_err(InfrastructureError::from)?;

        let mut rows = range.rows();
        let table = match rows.next() {
            None => Table::new(schema.column_order()),
            Some(header) => {
                let columns: Vec<String> = header.iter().map(header_text).collect();
                let mut table = Table::new(columns);
                for row in rows {
                    table.push_row(row.iter().map(import_cell).collect())?;
                }
                table
            }
        };
        dataset.insert_table(schema.name(), table);
    }
    Ok(dataset)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn import_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(x) => narrow_float(*x),
        Data::Bool(b) => CellValue::Bool(*b),
        // Serial date number; date semantics are not part of the cell model.
        Data::DateTime(dt) => narrow_float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn narrow_float(x: f64) -> CellValue {
    // 2^53: beyond this a double cannot represent every integer anyway.
    if x.fract() == 0.0 && x.abs() < 9_007_199_254_740_992.0 {
        CellValue::Integer(x as i64)
    } else {
        CellValue::Float(x)
    }
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

    let mut workbook = Workbook::new();
    for (name, table) in dataset.tables() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).map_err(InfrastructureError::from)?;

        for (c, column) in table.columns().iter().enumerate() {
            worksheet
                .write_string(0, c as u16, column)
                .map_err(InfrastructureError::from)?;
        }
        for (r, row) in table.rows().iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (row_idx, col_idx) = ((r + 1) as u32, c as u16);
                match cell {
                    CellValue::Null => {}
                    CellValue::Bool(b) => {
                        worksheet
                            .write_boolean(row_idx, col_idx, *b)
                            .map_err(InfrastructureError::from)?;
                    }
                    CellValue::Integer(i) => {
                        worksheet
                            .write_number(row_idx, col_idx, *i as f64)
                            .map_err(InfrastructureError::from)?;
                    }
                    CellValue::Float(x) => {
                        worksheet
                            .write_number(row_idx, col_idx, *x)
                            .map_err(InfrastructureError::from)?;
                    }
                    CellValue::Text(s) => {
                        worksheet
                            .write_string(row_idx, col_idx, s)
                            .map_err(InfrastructureError::from)?;
                    }
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().map_err(InfrastructureError::from)?;
    fs::atomic_write(path, bytes)?;
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
            .with_table(TableSchema::new("orders", ["id"], ["note", "ratio", "open"]))
            .with_table(TableSchema::new("refunds", ["id"], ["amount"]))
    }

    #[test]
    fn test_round_trip_with_whole_number_narrowing() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.xlsx");

        let mut orders = Table::new(vec![
            "id".into(),
            "note".into(),
            "ratio".into(),
            "open".into(),
        ]);
        orders.push_row(vec![
            1i64.into(),
            "plain".into(),
            0.5.into(),
            true.into(),
        ])?;
        orders.push_row(vec![2i64.into(), CellValue::Null, 2.0.into(), false.into()])?;
        let mut dataset = Dataset::new();
        dataset.insert_table("orders", orders);

        write(&target, &declared(), &dataset, true)?;
        let back = read(&target, &declared())?;
        let orders = back.table("orders").unwrap();

        assert_eq!(orders.columns(), ["id", "note", "ratio", "open"]);
        assert_eq!(orders.rows()[0][0], CellValue::Integer(1));
        assert_eq!(orders.rows()[0][2], CellValue::Float(0.5));
        assert_eq!(orders.rows()[0][3], CellValue::Bool(true));
        // Whole floats narrow to integers through the xlsx cell model.
        assert_eq!(orders.rows()[1][2], CellValue::Integer(2));
        assert_eq!(orders.rows()[1][1], CellValue::Null);
        Ok(())
    }

    #[test]
    fn test_missing_worksheet_reads_as_empty_declared_table() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.xlsx");
        write(&target, &declared(), &Dataset::new(), true)?;

        let back = read(&target, &declared())?;
        let refunds = back.table("refunds").unwrap();
        assert!(refunds.is_empty());
        assert_eq!(refunds.columns(), ["id", "amount"]);
        Ok(())
    }

    #[test]
    fn test_overwrite_refused_on_existing_workbook() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.xlsx");
        write(&target, &declared(), &Dataset::new(), true)?;

        let err = write(&target, &declared(), &Dataset::new(), false).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite"), "{err}");
        Ok(())
    }
}
