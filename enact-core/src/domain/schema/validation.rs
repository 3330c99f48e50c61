// enact-core/src/domain/schema/validation.rs

use crate::domain::dataset::{CellValue, Dataset, Table};
use crate::domain::schema::collection::{ForeignKey, TableCollection};
use crate::domain::schema::table::{RowView, TableSchema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateKey,
    ForeignKey,
    FieldType,
    RowCheck,
    MissingField,
    UndeclaredTable,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateKey => "duplicate_key",
            Self::ForeignKey => "foreign_key",
            Self::FieldType => "field_type",
            Self::RowCheck => "row_check",
            Self::MissingField => "missing_field",
            Self::UndeclaredTable => "undeclared_table",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub table: String,
    pub kind: ViolationKind,
    /// Zero-based row index, when the violation points at one row.
    pub row: Option<usize>,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    violations: Vec<Violation>,
}

impl ViolationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn count_of(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "no violations");
        }
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for v in &self.violations {
            *counts.entry(v.kind.as_str()).or_insert(0) += 1;
        }
        write!(f, "{} violation(s) [", self.violations.len())?;
        for (i, (kind, n)) in counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", kind, n)?;
        }
        write!(f, "]")
    }
}

/// The default schema validator: checks a dataset against a declared
/// `TableCollection` and reports every deviation it can find. It never
/// fails itself; an unreadable situation is a violation, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaChecker;

impl SchemaChecker {
    pub fn check(tables: &TableCollection, dataset: &Dataset) -> ViolationReport {
        let mut report = ViolationReport::new();

        for name in dataset.table_names() {
            if tables.table(name).is_none() {
                report.push(Violation {
                    table: name.to_string(),
                    kind: ViolationKind::UndeclaredTable,
                    row: None,
                    detail: "table is not declared by the binding".to_string(),
                });
            }
        }

        for schema in tables.tables() {
            let Some(data) = dataset.table(schema.name()) else {
                continue;
            };
            check_missing_fields(schema, data, &mut report);
            check_duplicate_keys(schema, data, &mut report);
            check_field_types(schema, data, &mut report);
            check_row_predicates(schema, data, &mut report);
        }

        for fk in tables.foreign_keys() {
            check_foreign_key(fk, dataset, &mut report);
        }

        report
    }
}

fn check_missing_fields(schema: &TableSchema, data: &Table, report: &mut ViolationReport) {
    for field in schema.key_fields().iter().chain(schema.data_fields()) {
        if data.column_index(field).is_none() {
            report.push(Violation {
                table: schema.name().to_string(),
                kind: ViolationKind::MissingField,
                row: None,
                detail: format!("declared field '{}' is absent from the data", field),
            });
        }
    }
}

fn check_duplicate_keys(schema: &TableSchema, data: &Table, report: &mut ViolationReport) {
    if schema.key_fields().is_empty() {
        return;
    }
    let Some(indices) = column_indices(data, schema.key_fields()) else {
        // A missing key column is already reported; duplicates are moot.
        return;
    };

    let mut occurrences: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    let mut display: BTreeMap<Vec<String>, String> = BTreeMap::new();
    for row in data.rows() {
        let token: Vec<String> = indices.iter().map(|&i| key_token(&row[i])).collect();
        display
            .entry(token.clone())
            .or_insert_with(|| join_cells(&indices, row));
        *occurrences.entry(token).or_insert(0) += 1;
    }

    for (token, count) in occurrences {
        if count > 1 {
            report.push(Violation {
                table: schema.name().to_string(),
                kind: ViolationKind::DuplicateKey,
                row: None,
                detail: format!(
                    "key ({}) appears {} times",
                    display.get(&token).map(String::as_str).unwrap_or("?"),
                    count
                ),
            });
        }
    }
}

fn check_field_types(schema: &TableSchema, data: &Table, report: &mut ViolationReport) {
    for (field, spec) in schema.field_specs() {
        let Some(idx) = data.column_index(field) else {
            continue;
        };
        for (row_idx, row) in data.rows().iter().enumerate() {
            let cell = &row[idx];
            if spec.accepts(cell) {
                continue;
            }
            let detail = if cell.is_null() {
                format!("field '{}' must not be null", field)
            } else {
                format!(
                    "field '{}' expects {}, got {} ({})",
                    field,
                    spec.field_type,
                    cell.type_name(),
                    cell
                )
            };
            report.push(Violation {
                table: schema.name().to_string(),
                kind: ViolationKind::FieldType,
                row: Some(row_idx),
                detail,
            });
        }
    }
}

fn check_row_predicates(schema: &TableSchema, data: &Table, report: &mut ViolationReport) {
    for check in schema.row_checks() {
        for (row_idx, row) in data.rows().iter().enumerate() {
            let view = RowView::new(data.columns(), row);
            if !check.passes(&view) {
                report.push(Violation {
                    table: schema.name().to_string(),
                    kind: ViolationKind::RowCheck,
                    row: Some(row_idx),
                    detail: format!("row check '{}' failed", check.name()),
                });
            }
        }
    }
}

fn check_foreign_key(fk: &ForeignKey, dataset: &Dataset, report: &mut ViolationReport) {
    let Some(native) = dataset.table(fk.native_table()) else {
        return;
    };
    let native_fields: Vec<&String> = fk.field_pairs().iter().map(|(n, _)| n).collect();
    let Some(native_indices) = column_indices_ref(native, &native_fields) else {
        return;
    };

    // An absent foreign table behaves like an empty one: every reference dangles.
    let referenced: BTreeSet<Vec<String>> = match dataset.table(fk.foreign_table()) {
        Some(foreign) => {
            let foreign_fields: Vec<&String> = fk.field_pairs().iter().map(|(_, f)| f).collect();
            let Some(foreign_indices) = column_indices_ref(foreign, &foreign_fields) else {
                return;
            };
            foreign
                .rows()
                .iter()
                .map(|row| foreign_indices.iter().map(|&i| key_token(&row[i])).collect())
                .collect()
        }
        None => BTreeSet::new(),
    };

    for (row_idx, row) in native.rows().iter().enumerate() {
        // Null references are treated as intentionally unset, not dangling.
        if native_indices.iter().any(|&i| row[i].is_null()) {
            continue;
        }
        let token: Vec<String> = native_indices.iter().map(|&i| key_token(&row[i])).collect();
        if !referenced.contains(&token) {
            report.push(Violation {
                table: fk.native_table().to_string(),
                kind: ViolationKind::ForeignKey,
                row: Some(row_idx),
                detail: format!(
                    "({}) has no match in '{}'",
                    join_cells(&native_indices, row),
                    fk.foreign_table()
                ),
            });
        }
    }
}

fn column_indices(data: &Table, fields: &[String]) -> Option<Vec<usize>> {
    fields.iter().map(|f| data.column_index(f)).collect()
}

fn column_indices_ref(data: &Table, fields: &[&String]) -> Option<Vec<usize>> {
    fields.iter().map(|f| data.column_index(f)).collect()
}

// Type-tagged rendering so e.g. the text "1" and the integer 1 never compare
// equal when grouping key tuples.
fn key_token(cell: &CellValue) -> String {
    format!("{}|{}", cell.type_name(), cell)
}

fn join_cells(indices: &[usize], row: &[CellValue]) -> String {
    indices
        .iter()
        .map(|&i| row[i].to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
