// enact-core/src/domain/dataset.rs

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// The variant order matters for `untagged` deserialization: an integer literal
// must be tried as i64 before falling through to f64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            // {:?} keeps the decimal point ("2.0"), so a float cell written to
            // a text format reads back as a float and not an integer.
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A single named table: ordered columns plus rows of cells.
/// Row width is enforced at insertion, never after.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), DomainError> {
        if row.len() != self.columns.len() {
            return Err(DomainError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A set of tables keyed by name. This is what collaborators read and write;
/// it carries no information about where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    tables: BTreeMap<String, Table>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, name: impl Into<String>, table: Table) {
        self.tables.insert(name.into(), table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn tables(&self) -> &BTreeMap<String, Table> {
        &self.tables
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Table::len).sum()
    }
}

/// A dataset tagged with the schema binding it was read under (or should be
/// written under). Replaces guessing the shape from the data alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundDataset {
    binding: String,
    data: Dataset,
}

impl BoundDataset {
    pub fn new(binding: impl Into<String>, data: Dataset) -> Self {
        Self {
            binding: binding.into(),
            data,
        }
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Dataset {
        &mut self.data
    }

    pub fn into_data(self) -> Dataset {
        self.data
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_cell_round_trip() -> anyhow::Result<()> {
        let cells = vec![
            CellValue::Null,
            CellValue::Bool(true),
            CellValue::Integer(42),
            CellValue::Float(2.5),
            CellValue::Text("hello".into()),
        ];
        let json = serde_json::to_string(&cells)?;
        assert_eq!(json, r#"[null,true,42,2.5,"hello"]"#);

        let back: Vec<CellValue> = serde_json::from_str(&json)?;
        assert_eq!(back, cells);
        Ok(())
    }

    #[test]
    fn test_float_display_keeps_decimal_point() {
        assert_eq!(CellValue::Float(2.0).to_string(), "2.0");
        assert_eq!(CellValue::Integer(2).to_string(), "2");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn test_push_row_enforces_width() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        assert!(table.push_row(vec![1i64.into(), 2i64.into()]).is_ok());

        let err = table.push_row(vec![1i64.into()]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::RowWidth {
                expected: 2,
                got: 1
            }
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_dataset_accounting() -> anyhow::Result<()> {
        let mut ds = Dataset::new();
        let mut t = Table::new(vec!["x".into()]);
        t.push_row(vec!["one".into()])?;
        t.push_row(vec!["two".into()])?;
        ds.insert_table("letters", t);
        ds.insert_table("empty", Table::new(vec!["y".into()]));

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.total_rows(), 2);
        assert_eq!(
            ds.table_names().collect::<Vec<_>>(),
            vec!["empty", "letters"]
        );
        Ok(())
    }

    #[test]
    fn test_bound_dataset_carries_binding() {
        let bound = BoundDataset::new("orders", Dataset::new());
        assert_eq!(bound.binding(), "orders");
        assert!(bound.data().is_empty());
    }
}
