// enact-core/src/domain/schema/table.rs

use crate::domain::dataset::CellValue;
use crate::domain::schema::field::FieldSpec;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Read-only view over one row, addressed by field name instead of position.
/// Row checks receive this so they stay independent of column order.
pub struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> RowView<'a> {
    pub fn new(columns: &'a [String], cells: &'a [CellValue]) -> Self {
        Self { columns, cells }
    }

    pub fn get(&self, field: &str) -> Option<&'a CellValue> {
        let idx = self.columns.iter().position(|c| c == field)?;
        self.cells.get(idx)
    }
}

/// A named predicate over a whole row. `true` means the row passes.
#[derive(Clone)]
pub struct RowCheck {
    name: String,
    predicate: Arc<dyn Fn(&RowView<'_>) -> bool + Send + Sync>,
}

impl RowCheck {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&RowView<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passes(&self, row: &RowView<'_>) -> bool {
        (self.predicate)(row)
    }
}

impl fmt::Debug for RowCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowCheck({})", self.name)
    }
}

/// Declared shape of one table: primary key fields, data fields, optional
/// per-field specs and row checks.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    name: String,
    key_fields: Vec<String>,
    data_fields: Vec<String>,
    field_specs: BTreeMap<String, FieldSpec>,
    row_checks: Vec<RowCheck>,
}

impl TableSchema {
    pub fn new<K, D>(name: impl Into<String>, key_fields: K, data_fields: D) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            name: name.into(),
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            data_fields: data_fields.into_iter().map(Into::into).collect(),
            field_specs: BTreeMap::new(),
            row_checks: Vec::new(),
        }
    }

    pub fn with_field_spec(mut self, field: impl Into<String>, spec: FieldSpec) -> Self {
        self.field_specs.insert(field.into(), spec);
        self
    }

    pub fn with_row_check(mut self, check: RowCheck) -> Self {
        self.row_checks.push(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn data_fields(&self) -> &[String] {
        &self.data_fields
    }

    /// Key fields first, then data fields. This is the column order used when
    /// a table has to be materialized from scratch.
    pub fn column_order(&self) -> Vec<String> {
        self.key_fields
            .iter()
            .chain(self.data_fields.iter())
            .cloned()
            .collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.key_fields.iter().any(|f| f == field) || self.data_fields.iter().any(|f| f == field)
    }

    /// Fields without an explicit spec fall back to the permissive default.
    pub fn field_spec(&self, field: &str) -> FieldSpec {
        self.field_specs.get(field).copied().unwrap_or_default()
    }

    pub fn field_specs(&self) -> &BTreeMap<String, FieldSpec> {
        &self.field_specs
    }

    pub fn set_field_spec(&mut self, field: impl Into<String>, spec: FieldSpec) {
        self.field_specs.insert(field.into(), spec);
    }

    pub fn row_checks(&self) -> &[RowCheck] {
        &self.row_checks
    }

    pub(crate) fn force_text_fields(&mut self) {
        for field in self.key_fields.iter().chain(self.data_fields.iter()) {
            let spec = self.field_specs.entry(field.clone()).or_default();
            spec.field_type = super::field::FieldType::Text;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::schema::field::FieldType;

    #[test]
    fn test_column_order_keys_first() {
        let schema = TableSchema::new("orders", ["id"], ["qty", "price"]);
        assert_eq!(schema.column_order(), vec!["id", "qty", "price"]);
        assert!(schema.has_field("qty"));
        assert!(!schema.has_field("missing"));
    }

    #[test]
    fn test_unspecced_field_defaults_to_any() {
        let schema = TableSchema::new("t", ["k"], ["v"])
            .with_field_spec("v", FieldSpec::required(FieldType::Integer));
        assert_eq!(schema.field_spec("k"), FieldSpec::default());
        assert_eq!(schema.field_spec("v").field_type, FieldType::Integer);
    }

    #[test]
    fn test_row_check_sees_fields_by_name() {
        let check = RowCheck::new("qty_positive", |row| {
            matches!(row.get("qty"), Some(CellValue::Integer(q)) if *q > 0)
        });
        let columns = vec!["id".to_string(), "qty".to_string()];

        let good = vec![CellValue::Integer(1), CellValue::Integer(5)];
        assert!(check.passes(&RowView::new(&columns, &good)));

        let bad = vec![CellValue::Integer(2), CellValue::Integer(0)];
        assert!(!check.passes(&RowView::new(&columns, &bad)));
    }

    #[test]
    fn test_force_text_fields_overrides_types() {
        let mut schema = TableSchema::new("config", ["key"], ["value"])
            .with_field_spec("value", FieldSpec::required(FieldType::Float));
        schema.force_text_fields();

        assert_eq!(schema.field_spec("key").field_type, FieldType::Text);
        assert_eq!(schema.field_spec("value").field_type, FieldType::Text);
        // Nullability declared before the coercion is preserved.
        assert!(!schema.field_spec("value").nullable);
    }
}
