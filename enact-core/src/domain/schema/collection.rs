// enact-core/src/domain/schema/collection.rs

use crate::domain::schema::table::TableSchema;
use std::collections::{BTreeMap, BTreeSet};

/// Declares that values in `native_table` reference rows of `foreign_table`.
/// Each pair is (native field, foreign key field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    native_table: String,
    foreign_table: String,
    field_pairs: Vec<(String, String)>,
}

impl ForeignKey {
    pub fn new<P, N, F>(
        native_table: impl Into<String>,
        foreign_table: impl Into<String>,
        field_pairs: P,
    ) -> Self
    where
        P: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Into<String>,
    {
        Self {
            native_table: native_table.into(),
            foreign_table: foreign_table.into(),
            field_pairs: field_pairs
                .into_iter()
                .map(|(n, f)| (n.into(), f.into()))
                .collect(),
        }
    }

    pub fn native_table(&self) -> &str {
        &self.native_table
    }

    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    pub fn field_pairs(&self) -> &[(String, String)] {
        &self.field_pairs
    }
}

/// The full declared shape of one schema binding: a named set of tables plus
/// the foreign keys between them.
#[derive(Debug, Clone, Default)]
pub struct TableCollection {
    tables: BTreeMap<String, TableSchema>,
    foreign_keys: Vec<ForeignKey>,
}

impl TableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.add_table(schema);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.add_foreign_key(fk);
        self
    }

    pub fn add_table(&mut self, schema: TableSchema) {
        self.tables.insert(schema.name().to_string(), schema);
    }

    pub fn add_foreign_key(&mut self, fk: ForeignKey) {
        self.foreign_keys.push(fk);
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableSchema> {
        self.tables.get_mut(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// True when `names` is exactly the set of declared table names.
    /// Used to infer which binding an untagged dataset belongs to.
    pub fn matches_table_set<'a>(&self, names: impl Iterator<Item = &'a str>) -> bool {
        let offered: BTreeSet<&str> = names.collect();
        let declared: BTreeSet<&str> = self.table_names().collect();
        offered == declared
    }

    pub(crate) fn force_text_fields(&mut self) {
        for schema in self.tables.values_mut() {
            schema.force_text_fields();
        }
    }

    /// Structural soundness of the declaration itself, independent of any
    /// dataset. Returns the first problem found.
    pub fn verify(&self) -> Result<(), String> {
        for (name, schema) in &self.tables {
            if name.is_empty() {
                return Err("table names must be non-empty".to_string());
            }
            if name.contains('.') {
                return Err(format!(
                    "table name '{}' must not contain '.' (reserved for source paths)",
                    name
                ));
            }

            let mut seen = BTreeSet::new();
            for field in schema.key_fields().iter().chain(schema.data_fields()) {
                if field.is_empty() {
                    return Err(format!("table '{}' declares an empty field name", name));
                }
                if !seen.insert(field.as_str()) {
                    return Err(format!(
                        "table '{}' declares field '{}' more than once",
                        name, field
                    ));
                }
            }

            for field in schema.field_specs().keys() {
                if !schema.has_field(field) {
                    return Err(format!(
                        "table '{}' has a field spec for unknown field '{}'",
                        name, field
                    ));
                }
            }
        }

        for fk in &self.foreign_keys {
            let native = self.tables.get(fk.native_table()).ok_or_else(|| {
                format!(
                    "foreign key references unknown native table '{}'",
                    fk.native_table()
                )
            })?;
            let foreign = self.tables.get(fk.foreign_table()).ok_or_else(|| {
                format!(
                    "foreign key references unknown foreign table '{}'",
                    fk.foreign_table()
                )
            })?;

            if fk.field_pairs().is_empty() {
                return Err(format!(
                    "foreign key from '{}' to '{}' declares no field pairs",
                    fk.native_table(),
                    fk.foreign_table()
                ));
            }
            for (native_field, foreign_field) in fk.field_pairs() {
                if !native.has_field(native_field) {
                    return Err(format!(
                        "foreign key field '{}' is not a field of table '{}'",
                        native_field,
                        fk.native_table()
                    ));
                }
                if !foreign.key_fields().iter().any(|f| f == foreign_field) {
                    return Err(format!(
                        "foreign key target '{}' is not a key field of table '{}'",
                        foreign_field,
                        fk.foreign_table()
                    ));
                }
            }
        }

        Ok(())
    }
}
