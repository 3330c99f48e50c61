// enact-postgres/src/store.rs

// PostgreSQL implementation of the DatabaseStore port. One blocking client
// per connection URL, kept for the life of the store, so the connection a
// hosted bootstrap opens is the one every later dispatch reuses.
//
// Typed fields map to typed columns (BIGINT, DOUBLE PRECISION, BOOLEAN);
// fields without a declared type are stored and read back as text.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use enact_core::EnactError;
use enact_core::domain::dataset::{CellValue, Dataset, Table};
use enact_core::domain::schema::{FieldType, TableCollection, TableSchema};
use enact_core::infrastructure::error::InfrastructureError;
use enact_core::ports::DatabaseStore;
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// Connection or statement failure reported by the backend.
    #[error("postgres backend error: {0}")]
    Backend(String),
    /// The connection map is unusable after a panic elsewhere.
    #[error("connection registry poisoned")]
    Poisoned,
    /// A cell the declared column type cannot hold.
    #[error("table '{table}' row {row}, field '{field}': {reason}")]
    CellMismatch {
        table: String,
        row: usize,
        field: String,
        reason: String,
    },
}

impl From<PostgresStoreError> for EnactError {
    fn from(err: PostgresStoreError) -> Self {
        InfrastructureError::Database(err.to_string()).into()
    }
}

fn backend(err: postgres::Error) -> PostgresStoreError {
    PostgresStoreError::Backend(err.to_string())
}

/// The PostgreSQL collaborator. Cheap to construct: no connection is made
/// until [`DatabaseStore::open`] or the first dispatched call.
#[derive(Default)]
pub struct PostgresStore {
    clients: Mutex<HashMap<String, Client>>,
}

impl PostgresStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` against the client for `url`, connecting first if this URL
    /// was never opened or its connection has since gone away.
    fn with_client<T>(
        &self,
        url: &str,
        op: impl FnOnce(&mut Client) -> Result<T, EnactError>,
    ) -> Result<T, EnactError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| PostgresStoreError::Poisoned)?;
        if clients.get(url).is_some_and(Client::is_closed) {
            debug!(url, "Dropping closed connection before reconnecting");
            clients.remove(url);
        }
        let client = match clients.entry(url.to_string()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let client = Client::connect(url, NoTls).map_err(backend)?;
                slot.insert(client)
            }
        };
        op(client)
    }
}

impl DatabaseStore for PostgresStore {
    fn open(&self, url: &str) -> Result<(), EnactError> {
        self.with_client(url, |_| Ok(()))
    }

    fn read(
        &self,
        url: &str,
        db_schema: &str,
        tables: &TableCollection,
    ) -> Result<Dataset, EnactError> {
        self.with_client(url, |client| {
            let mut dataset = Dataset::new();
            for schema in tables.tables() {
                dataset.insert_table(schema.name(), read_table(client, db_schema, schema)?);
            }
            Ok(dataset)
        })
    }

    fn write(
        &self,
        url: &str,
        db_schema: &str,
        tables: &TableCollection,
        dataset: &Dataset,
        allow_overwrite: bool,
    ) -> Result<(), EnactError> {
        for name in dataset.table_names() {
            if tables.table(name).is_none() {
                warn!(
                    table = name,
                    "Dataset table is not declared by the binding; skipped"
                );
            }
        }
        self.with_client(url, |client| {
            for schema in tables.tables() {
                let Some(table) = dataset.table(schema.name()) else {
                    continue;
                };
                write_table(client, db_schema, schema, table, allow_overwrite)?;
            }
            Ok(())
        })
    }

    fn ensure_tables(
        &self,
        url: &str,
        db_schema: &str,
        tables: &TableCollection,
    ) -> Result<(), EnactError> {
        let mut statements = vec![format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(db_schema)
        )];
        for schema in tables.tables() {
            statements.push(create_table_sql(db_schema, schema));
        }
        self.with_client(url, |client| {
            client
                .batch_execute(&statements.join(";\n"))
                .map_err(backend)?;
            Ok(())
        })
    }
}

fn read_table(
    client: &mut Client,
    db_schema: &str,
    schema: &TableSchema,
) -> Result<Table, EnactError> {
    let columns = schema.column_order();
    if !table_exists(client, db_schema, schema.name())? {
        // Declared but absent tables read back empty, like a missing file.
        return Ok(Table::new(columns));
    }

    let rows = client
        .query(&select_sql(db_schema, schema), &[])
        .map_err(backend)?;
    let mut table = Table::new(columns.clone());
    for row in rows {
        let mut cells = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            cells.push(decode_cell(
                &row,
                index,
                schema.field_spec(column).field_type,
            )?);
        }
        table.push_row(cells)?;
    }
    Ok(table)
}

fn write_table(
    client: &mut Client,
    db_schema: &str,
    schema: &TableSchema,
    table: &Table,
    allow_overwrite: bool,
) -> Result<(), EnactError> {
    if !allow_overwrite && row_count(client, db_schema, schema.name())? > 0 {
        return Err(InfrastructureError::OverwriteRefused(format!(
            "{}.{}",
            db_schema,
            schema.name()
        ))
        .into());
    }

    // Cells travel by column name; a declared column absent from the data
    // is written as NULL, columns the schema does not declare are dropped.
    let columns = schema.column_order();
    let indices: Vec<Option<usize>> = columns
        .iter()
        .map(|column| table.column_index(column))
        .collect();
    let insert = insert_sql(db_schema, schema);
    let null = CellValue::Null;

    let mut tx = client.transaction().map_err(backend)?;
    tx.execute(
        &format!(
            "DELETE FROM {}.{}",
            quote_ident(db_schema),
            quote_ident(schema.name())
        ),
        &[],
    )
    .map_err(backend)?;
    for (row_index, row) in table.rows().iter().enumerate() {
        let mut params: Vec<Box<dyn ToSql + Sync>> = Vec::with_capacity(columns.len());
        for (column, index) in columns.iter().zip(&indices) {
            let cell = index.and_then(|i| row.get(i)).unwrap_or(&null);
            let spec = schema.field_spec(column);
            let param = bind_cell(cell, spec.field_type).map_err(|reason| {
                PostgresStoreError::CellMismatch {
                    table: schema.name().to_string(),
                    row: row_index,
                    field: column.clone(),
                    reason,
                }
            })?;
            params.push(param);
        }
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(Box::as_ref).collect();
        tx.execute(&insert, &refs).map_err(backend)?;
    }
    tx.commit().map_err(backend)?;
    Ok(())
}

fn table_exists(
    client: &mut Client,
    db_schema: &str,
    table: &str,
) -> Result<bool, PostgresStoreError> {
    let row = client
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name = $2)",
            &[&db_schema, &table],
        )
        .map_err(backend)?;
    Ok(row.get(0))
}

fn row_count(client: &mut Client, db_schema: &str, table: &str) -> Result<i64, EnactError> {
    if !table_exists(client, db_schema, table)? {
        return Ok(0);
    }
    let row = client
        .query_one(
            &format!(
                "SELECT count(*) FROM {}.{}",
                quote_ident(db_schema),
                quote_ident(table)
            ),
            &[],
        )
        .map_err(backend)?;
    Ok(row.get(0))
}

// --- SQL GENERATION ---

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn pg_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Any | FieldType::Text => "TEXT",
        FieldType::Integer => "BIGINT",
        FieldType::Float => "DOUBLE PRECISION",
        FieldType::Bool => "BOOLEAN",
    }
}

fn create_table_sql(db_schema: &str, schema: &TableSchema) -> String {
    let mut parts: Vec<String> = schema
        .column_order()
        .iter()
        .map(|column| {
            let spec = schema.field_spec(column);
            let mut definition = format!("{} {}", quote_ident(column), pg_type(spec.field_type));
            if !spec.nullable {
                definition.push_str(" NOT NULL");
            }
            definition
        })
        .collect();
    if !schema.key_fields().is_empty() {
        let keys: Vec<String> = schema
            .key_fields()
            .iter()
            .map(|key| quote_ident(key))
            .collect();
        parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {}.{} ({})",
        quote_ident(db_schema),
        quote_ident(schema.name()),
        parts.join(", ")
    )
}

// Every selected column is cast to its declared wire type, so decoding does
// not depend on how a pre-existing table happens to be typed.
fn select_sql(db_schema: &str, schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .column_order()
        .iter()
        .map(|column| {
            format!(
                "{}::{}",
                quote_ident(column),
                pg_type(schema.field_spec(column).field_type)
            )
        })
        .collect();
    let mut sql = format!(
        "SELECT {} FROM {}.{}",
        columns.join(", "),
        quote_ident(db_schema),
        quote_ident(schema.name())
    );
    if !schema.key_fields().is_empty() {
        let keys: Vec<String> = schema
            .key_fields()
            .iter()
            .map(|key| quote_ident(key))
            .collect();
        sql.push_str(&format!(" ORDER BY {}", keys.join(", ")));
    }
    sql
}

fn insert_sql(db_schema: &str, schema: &TableSchema) -> String {
    let columns = schema.column_order();
    let names: Vec<String> = columns.iter().map(|column| quote_ident(column)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${}", n)).collect();
    format!(
        "INSERT INTO {}.{} ({}) VALUES ({})",
        quote_ident(db_schema),
        quote_ident(schema.name()),
        names.join(", "),
        placeholders.join(", ")
    )
}

fn decode_cell(
    row: &Row,
    index: usize,
    field_type: FieldType,
) -> Result<CellValue, PostgresStoreError> {
    let cell = match field_type {
        FieldType::Integer => row
            .try_get::<_, Option<i64>>(index)
            .map_err(backend)?
            .map(CellValue::Integer),
        FieldType::Float => row
            .try_get::<_, Option<f64>>(index)
            .map_err(backend)?
            .map(CellValue::Float),
        FieldType::Bool => row
            .try_get::<_, Option<bool>>(index)
            .map_err(backend)?
            .map(CellValue::Bool),
        FieldType::Any | FieldType::Text => row
            .try_get::<_, Option<String>>(index)
            .map_err(backend)?
            .map(CellValue::Text),
    };
    Ok(cell.unwrap_or(CellValue::Null))
}

/// Boxes a cell as a statement parameter, enforcing the same type discipline
/// the schema checker applies: floats widen integers, untyped columns take
/// anything (rendered as text), everything else must match exactly.
fn bind_cell(cell: &CellValue, field_type: FieldType) -> Result<Box<dyn ToSql + Sync>, String> {
    match (field_type, cell) {
        (FieldType::Integer, CellValue::Integer(v)) => Ok(Box::new(*v)),
        (FieldType::Integer, CellValue::Null) => Ok(Box::new(Option::<i64>::None)),
        (FieldType::Float, CellValue::Float(v)) => Ok(Box::new(*v)),
        (FieldType::Float, CellValue::Integer(v)) => Ok(Box::new(*v as f64)),
        (FieldType::Float, CellValue::Null) => Ok(Box::new(Option::<f64>::None)),
        (FieldType::Bool, CellValue::Bool(v)) => Ok(Box::new(*v)),
        (FieldType::Bool, CellValue::Null) => Ok(Box::new(Option::<bool>::None)),
        (FieldType::Text, CellValue::Text(v)) => Ok(Box::new(v.clone())),
        (FieldType::Text | FieldType::Any, CellValue::Null) => {
            Ok(Box::new(Option::<String>::None))
        }
        (FieldType::Any, value) => Ok(Box::new(value.to_string())),
        (expected, got) => Err(format!(
            "{} column cannot hold a {} cell",
            expected.as_str(),
            got.type_name()
        )),
    }
}
