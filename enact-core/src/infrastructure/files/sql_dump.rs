// enact-core/src/infrastructure/files/sql_dump.rs

use crate::domain::dataset::{CellValue, Dataset, Table};
use crate::domain::schema::{FieldType, TableCollection, TableSchema};
use crate::error::EnactError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::types::ValueRef;
use std::fmt::Write as _;
use std::path::Path;

// Two flavours share this strategy: a `.db` SQLite container, and a `.sql`
// text dump that is replayed through an in-memory database on the way in.
// SQLite has no boolean storage class, so bool cells come back as integers
// after a round trip.

pub(crate) fn read(path: &Path, tables: &TableCollection) -> Result<Dataset, EnactError> {
    let conn = if is_text_dump(path) {
        let script = std::fs::read_to_string(path).map_err(InfrastructureError::Io)?;
        let conn = Connection::open_in_memory().map_err(InfrastructureError::from)?;
        conn.execute_batch(&script).map_err(InfrastructureError::from)?;
        conn
    } else {
        Connection::open(path).map_err(InfrastructureError::from)?
    };
    read_all(&conn, tables)
}

pub(crate) fn write(
    path: &Path,
    tables: &TableCollection,
    dataset: &Dataset,
    allow_overwrite: bool,
) -> Result<(), EnactError> {
    if path.exists() {
        if !allow_overwrite {
            return Err(InfrastructureError::OverwriteRefused(path.display().to_string()).into());
        }
        if !is_text_dump(path) {
            // Replace the container wholesale; appending to a stale one would
            // leave tables from an earlier shape behind.
            std::fs::remove_file(path).map_err(InfrastructureError::Io)?;
        }
    }

    if is_text_dump(path) {
        let script = render_dump(tables, dataset);
        fs::atomic_write(path, script)?;
        return Ok(());
    }

    fs::ensure_parent_dir(path)?;
    let conn = Connection::open(path).map_err(InfrastructureError::from)?;
    for (name, table) in dataset.tables() {
        conn.execute_batch(&create_table_sql(name, table, tables.table(name)))
            .map_err(InfrastructureError::from)?;
        insert_rows(&conn, name, table)?;
    }
    Ok(())
}

fn is_text_dump(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("sql"))
}

fn read_all(conn: &Connection, tables: &TableCollection) -> Result<Dataset, EnactError> {
    let mut dataset = Dataset::new();
    for schema in tables.tables() {
        let present: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [schema.name()],
                |row| row.get(0),
            )
            .optional()
            .map_err(InfrastructureError::from)?;

        let table = if present.is_some() {
            read_table(conn, schema.name())?
        } else {
            Table::new(schema.column_order())
        };
        dataset.insert_table(schema.name(), table);
    }
    Ok(dataset)
}

fn read_table(conn: &Connection, name: &str) -> Result<Table, EnactError> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_ident(name)))
        .map_err(InfrastructureError::from)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut table = Table::new(columns.clone());
    let mut rows = stmt.query([]).map_err(InfrastructureError::from)?;
    while let Some(row) = rows.next().map_err(InfrastructureError::from)? {
        let mut cells = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let value = row.get_ref(i).map_err(InfrastructureError::from)?;
            cells.push(match value {
                ValueRef::Null => CellValue::Null,
                ValueRef::Integer(v) => CellValue::Integer(v),
                ValueRef::Real(v) => CellValue::Float(v),
                ValueRef::Text(bytes) => {
                    CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
                }
                ValueRef::Blob(bytes) => {
                    CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            });
        }
        table.push_row(cells)?;
    }
    Ok(table)
}

fn insert_rows(conn: &Connection, name: &str, table: &Table) -> Result<(), EnactError> {
    if table.is_empty() {
        return Ok(());
    }
    let placeholders: Vec<String> = (1..=table.columns().len())
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        quote_idents(table.columns()),
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql).map_err(InfrastructureError::from)?;
    for row in table.rows() {
        let values = row.iter().map(cell_to_sql_value);
        stmt.execute(rusqlite::params_from_iter(values))
            .map_err(InfrastructureError::from)?;
    }
    Ok(())
}

fn cell_to_sql_value(cell: &CellValue) -> rusqlite::types::Value {
    use rusqlite::types::Value;
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Integer(i64::from(*b)),
        CellValue::Integer(i) => Value::Integer(*i),
        CellValue::Float(x) => Value::Real(*x),
        CellValue::Text(s) => Value::Text(s.clone()),
    }
}

fn render_dump(tables: &TableCollection, dataset: &Dataset) -> String {
    let mut script = String::new();
    for (name, table) in dataset.tables() {
        script.push_str(&create_table_sql(name, table, tables.table(name)));
        for row in table.rows() {
            let literals: Vec<String> = row.iter().map(cell_to_literal).collect();
            let _ = writeln!(
                script,
                "INSERT INTO {} ({}) VALUES ({});",
                quote_ident(name),
                quote_idents(table.columns()),
                literals.join(", ")
            );
        }
    }
    script
}

fn create_table_sql(name: &str, table: &Table, schema: Option<&TableSchema>) -> String {
    let mut defs: Vec<String> = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let sql_type = schema
            .map(|s| sqlite_type(s.field_spec(column).field_type))
            .unwrap_or("");
        if sql_type.is_empty() {
            defs.push(quote_ident(column));
        } else {
            defs.push(format!("{} {}", quote_ident(column), sql_type));
        }
    }
    if let Some(schema) = schema
        && !schema.key_fields().is_empty()
        && schema
            .key_fields()
            .iter()
            .all(|k| table.column_index(k).is_some())
    {
        defs.push(format!("PRIMARY KEY ({})", quote_idents(schema.key_fields())));
    }
    format!("CREATE TABLE {} ({});\n", quote_ident(name), defs.join(", "))
}

fn sqlite_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Any => "",
        FieldType::Text => "TEXT",
        FieldType::Integer | FieldType::Bool => "INTEGER",
        FieldType::Float => "REAL",
    }
}

fn cell_to_literal(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => "NULL".to_string(),
        CellValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Float(x) => format!("{:?}", x),
        CellValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_idents(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn declared() -> TableCollection {
        TableCollection::new().with_table(
            TableSchema::new("people", ["id"], ["name", "score", "select"])
                .with_field_spec("name", crate::domain::schema::FieldSpec::typed(FieldType::Text))
                .with_field_spec(
                    "score",
                    crate::domain::schema::FieldSpec::typed(FieldType::Float),
                ),
        )
    }

    fn sample() -> Dataset {
        let mut people = Table::new(vec![
            "id".into(),
            "name".into(),
            "score".into(),
            "select".into(),
        ]);
        people
            .push_row(vec![
                1i64.into(),
                "O'Brien".into(),
                2.5.into(),
                CellValue::Null,
            ])
            .unwrap();
        people
            .push_row(vec![2i64.into(), "plain".into(), 3.0.into(), "x".into()])
            .unwrap();
        let mut ds = Dataset::new();
        ds.insert_table("people", people);
        ds
    }

    #[test]
    fn test_db_container_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.db");

        write(&target, &declared(), &sample(), true)?;
        let back = read(&target, &declared())?;

        assert_eq!(back.table("people"), sample().table("people"));
        Ok(())
    }

    #[test]
    fn test_text_dump_round_trip_with_escaping() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.sql");

        write(&target, &declared(), &sample(), true)?;
        let script = std::fs::read_to_string(&target)?;
        assert!(script.contains("CREATE TABLE \"people\""));
        assert!(script.contains("'O''Brien'"));

        let back = read(&target, &declared())?;
        assert_eq!(back.table("people"), sample().table("people"));
        Ok(())
    }

    #[test]
    fn test_missing_table_reads_as_empty_declared_table() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.db");
        write(&target, &declared(), &Dataset::new(), true)?;

        let back = read(&target, &declared())?;
        let people = back.table("people").unwrap();
        assert!(people.is_empty());
        assert_eq!(people.columns(), ["id", "name", "score", "select"]);
        Ok(())
    }

    #[test]
    fn test_bool_narrows_to_integer() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.db");
        let tables =
            TableCollection::new().with_table(TableSchema::new("flags", ["id"], ["ok"]));

        let mut flags = Table::new(vec!["id".into(), "ok".into()]);
        flags.push_row(vec![1i64.into(), true.into()])?;
        let mut ds = Dataset::new();
        ds.insert_table("flags", flags);

        write(&target, &tables, &ds, true)?;
        let back = read(&target, &tables)?;
        assert_eq!(back.table("flags").unwrap().rows()[0][1], CellValue::Integer(1));
        Ok(())
    }

    #[test]
    fn test_overwrite_refused_on_existing_container() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("data.db");
        write(&target, &declared(), &sample(), true)?;

        let err = write(&target, &declared(), &sample(), false).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite"), "{err}");
        Ok(())
    }
}
