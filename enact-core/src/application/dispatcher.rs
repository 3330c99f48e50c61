// enact-core/src/application/dispatcher.rs

// Dispatch: resolve a binding name against the current partition, then route
// the call to the file or database collaborator. Nothing here touches the
// registry; resolution stays read-only.

use std::collections::BTreeMap;

use crate::application::runtime::{ActionRuntime, CONFIG_BINDING};
use crate::domain::dataset::{BoundDataset, Dataset};
use crate::domain::error::DomainError;
use crate::domain::source::{DatabaseLocation, SourceLocation, SourcePath};
use crate::error::EnactError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::files::{AccessIntent, split_target};
use crate::ports::DatabaseStore;
use tracing::{debug, info};

/// Knobs for a dispatched write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace existing table contents. When false, an occupied target is
    /// refused and left untouched.
    pub allow_overwrite: bool,
    /// Provision missing database schemas and tables before writing. File
    /// targets create their containers regardless.
    pub create_tables: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            allow_overwrite: true,
            create_tables: false,
        }
    }
}

impl ActionRuntime {
    /// Reads every table of `binding` from its resolved source and returns
    /// the dataset tagged with the binding name.
    pub fn read(&self, binding: &str) -> Result<BoundDataset, EnactError> {
        let schema = read_target(binding)?;
        let tables = self.binding(&schema)?;
        let resolved = self
            .registry
            .resolve(self.context, &SourcePath::Schema(schema.clone()))?;
        debug!(binding, source = %resolved.matched, "Reading binding");

        let dataset = match &resolved.location {
            SourceLocation::FileOrDir { path } => {
                let (target, format) = split_target(path, AccessIntent::Read)?;
                self.file_store.read(&target, format, tables)?
            }
            SourceLocation::Database(db) => {
                let (url, db_schema) = database_parameters(&schema, db)?;
                let store = self.require_database_store()?;
                store.read(url, db_schema, tables)?
            }
        };
        Ok(BoundDataset::new(schema, dataset))
    }

    /// Reads several bindings; the result is keyed by binding name.
    pub fn read_many(&self, bindings: &[&str]) -> Result<BTreeMap<String, BoundDataset>, EnactError> {
        let mut datasets = BTreeMap::new();
        for name in bindings {
            datasets.insert((*name).to_string(), self.read(name)?);
        }
        Ok(datasets)
    }

    /// Writes a bound dataset back to wherever its binding resolves, with
    /// default [`WriteOptions`].
    pub fn write(&self, bound: &BoundDataset) -> Result<(), EnactError> {
        self.write_with(bound, WriteOptions::default())
    }

    pub fn write_with(
        &self,
        bound: &BoundDataset,
        options: WriteOptions,
    ) -> Result<(), EnactError> {
        self.dispatch_write(bound.binding(), bound.data(), options)
    }

    /// Writes an unbound dataset by inferring its binding from the table-name
    /// set; zero or several candidate bindings are an error.
    pub fn write_dataset(&self, dataset: &Dataset) -> Result<(), EnactError> {
        self.write_dataset_with(dataset, WriteOptions::default())
    }

    pub fn write_dataset_with(
        &self,
        dataset: &Dataset,
        options: WriteOptions,
    ) -> Result<(), EnactError> {
        let binding = self.infer_binding(dataset)?;
        self.dispatch_write(binding, dataset, options)
    }

    pub fn write_all(&self, bounds: &[BoundDataset]) -> Result<(), EnactError> {
        for bound in bounds {
            self.write(bound)?;
        }
        Ok(())
    }

    /// Validates a bound dataset against its declared tables. Any violation
    /// at all fails with the full report attached.
    pub fn check(&self, bound: &BoundDataset) -> Result<(), EnactError> {
        self.checked_report(bound.binding(), bound.data())
    }

    pub fn check_dataset(&self, dataset: &Dataset) -> Result<(), EnactError> {
        let binding = self.infer_binding(dataset)?;
        self.checked_report(binding, dataset)
    }

    /// Writes the declared config defaults to wherever the config binding
    /// resolves, provisioning tables first. A runtime without a config
    /// binding has nothing to seed and says so.
    pub fn seed_config_defaults(&self) -> Result<(), EnactError> {
        self.binding(CONFIG_BINDING)?;
        let Some(defaults) = self.config_defaults.as_ref() else {
            debug!("No config defaults declared; nothing to seed");
            return Ok(());
        };
        self.dispatch_write(
            CONFIG_BINDING,
            defaults,
            WriteOptions {
                allow_overwrite: true,
                create_tables: true,
            },
        )
    }

    /// Finds the unique binding whose declared table set equals the
    /// dataset's table names.
    pub fn infer_binding(&self, dataset: &Dataset) -> Result<&str, DomainError> {
        let candidates: Vec<&str> = self
            .bindings()
            .filter(|(_, tables)| tables.matches_table_set(dataset.table_names()))
            .map(|(name, _)| name)
            .collect();
        match candidates.as_slice() {
            [single] => Ok(single),
            [] => Err(DomainError::UnknownSchema(table_set_label(dataset))),
            several => Err(DomainError::UnknownSchema(format!(
                "{} (ambiguous: {})",
                table_set_label(dataset),
                several.join(", ")
            ))),
        }
    }

    fn dispatch_write(
        &self,
        binding: &str,
        dataset: &Dataset,
        options: WriteOptions,
    ) -> Result<(), EnactError> {
        let tables = self.binding(binding)?;
        let resolved = self
            .registry
            .resolve(self.context, &SourcePath::Schema(binding.to_string()))?;
        info!(
            binding,
            source = %resolved.matched,
            rows = dataset.total_rows(),
            "Writing binding"
        );

        match &resolved.location {
            SourceLocation::FileOrDir { path } => {
                let (target, format) = split_target(path, AccessIntent::Write)?;
                self.file_store
                    .write(&target, format, tables, dataset, options.allow_overwrite)
            }
            SourceLocation::Database(db) => {
                let (url, db_schema) = database_parameters(binding, db)?;
                let store = self.require_database_store()?;
                if options.create_tables {
                    store.ensure_tables(url, db_schema, tables)?;
                }
                store.write(url, db_schema, tables, dataset, options.allow_overwrite)
            }
        }
    }

    fn checked_report(&self, binding: &str, dataset: &Dataset) -> Result<(), EnactError> {
        let tables = self.binding(binding)?;
        let report = self.validator.validate(tables, dataset);
        if report.is_empty() {
            return Ok(());
        }
        Err(DomainError::Validation {
            binding: binding.to_string(),
            report,
        }
        .into())
    }

    fn require_database_store(&self) -> Result<&dyn DatabaseStore, EnactError> {
        match &self.database_store {
            Some(store) => Ok(store.as_ref()),
            None => Err(InfrastructureError::ConfigError(
                "the resolved source is a database but no database collaborator is wired in"
                    .to_string(),
            )
            .into()),
        }
    }
}

// Dispatch works at schema granularity only; a dotted path is how the
// original API surfaced single-table reads, which were never supported.
fn read_target(binding: &str) -> Result<String, DomainError> {
    match SourcePath::parse(binding)? {
        SourcePath::Schema(schema) => Ok(schema),
        SourcePath::Root => Err(DomainError::InvalidPath {
            path: binding.to_string(),
            reason: "a schema binding name is required".to_string(),
        }),
        SourcePath::Table { .. } => Err(DomainError::InvalidPath {
            path: binding.to_string(),
            reason: "reading a single table is not supported; read the whole schema".to_string(),
        }),
    }
}

fn database_parameters<'a>(
    binding: &str,
    db: &'a DatabaseLocation,
) -> Result<(&'a str, &'a str), DomainError> {
    let url = db
        .connection_string
        .as_deref()
        .ok_or_else(|| missing(binding, "connection_string"))?;
    let schema = db
        .schema_name
        .as_deref()
        .ok_or_else(|| missing(binding, "schema_name"))?;
    Ok((url, schema))
}

fn missing(binding: &str, parameter: &str) -> DomainError {
    DomainError::MissingParameter {
        path: binding.to_string(),
        parameter: parameter.to_string(),
    }
}

fn table_set_label(dataset: &Dataset) -> String {
    let names: Vec<&str> = dataset.table_names().collect();
    format!("{{{}}}", names.join(", "))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::dataset::Table;
    use crate::domain::schema::{
        FieldSpec, FieldType, TableCollection, TableSchema, ViolationKind,
    };
    use crate::domain::source::ExecutionContext;
    use anyhow::Result;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    // --- MOCK DATABASE STORE ---
    #[derive(Default)]
    struct MockDatabaseStore {
        calls: Mutex<Vec<String>>,
        canned: Dataset,
    }

    impl MockDatabaseStore {
        fn with_canned(canned: Dataset) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                canned,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl crate::ports::DatabaseStore for MockDatabaseStore {
        fn open(&self, url: &str) -> Result<(), EnactError> {
            self.calls.lock().unwrap().push(format!("open {url}"));
            Ok(())
        }

        fn read(
            &self,
            url: &str,
            db_schema: &str,
            _tables: &TableCollection,
        ) -> Result<Dataset, EnactError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("read {url} {db_schema}"));
            Ok(self.canned.clone())
        }

        fn write(
            &self,
            url: &str,
            db_schema: &str,
            _tables: &TableCollection,
            dataset: &Dataset,
            allow_overwrite: bool,
        ) -> Result<(), EnactError> {
            self.calls.lock().unwrap().push(format!(
                "write {url} {db_schema} rows={} overwrite={allow_overwrite}",
                dataset.total_rows()
            ));
            Ok(())
        }

        fn ensure_tables(
            &self,
            url: &str,
            db_schema: &str,
            tables: &TableCollection,
        ) -> Result<(), EnactError> {
            self.calls.lock().unwrap().push(format!(
                "ensure {url} {db_schema} tables={}",
                tables.len()
            ));
            Ok(())
        }
    }

    fn sales_tables() -> TableCollection {
        TableCollection::new().with_table(TableSchema::new("orders", ["id"], ["item", "qty"]))
    }

    fn billing_tables() -> TableCollection {
        TableCollection::new().with_table(TableSchema::new("invoices", ["id"], ["total"]))
    }

    fn orders_dataset() -> Dataset {
        let mut orders = Table::new(vec!["id".into(), "item".into(), "qty".into()]);
        orders
            .push_row(vec![1_i64.into(), "widget".into(), 3_i64.into()])
            .unwrap();
        let mut dataset = Dataset::new();
        dataset.insert_table("orders", orders);
        dataset
    }

    fn file_runtime(dir: &Path) -> Result<ActionRuntime> {
        Ok(ActionRuntime::builder("demo")
            .with_binding("sales", sales_tables())
            .with_binding("billing", billing_tables())
            .with_local_root(dir)
            .build()?)
    }

    fn database_runtime(store: Arc<MockDatabaseStore>) -> Result<ActionRuntime> {
        let mut runtime = ActionRuntime::builder("demo")
            .with_binding("sales", sales_tables())
            .with_database_store(store)
            .build()?;
        runtime.set_source(
            ExecutionContext::Local,
            "",
            DatabaseLocation::new()
                .with_connection_string("postgres://db.internal/app")
                .with_schema_name("scenario_7"),
        )?;
        Ok(runtime)
    }

    #[test]
    fn test_local_csv_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;

        let bound = BoundDataset::new("sales", orders_dataset());
        runtime.write(&bound)?;

        let back = runtime.read("sales")?;
        assert_eq!(back.binding(), "sales");
        assert_eq!(back.data().table("orders"), bound.data().table("orders"));
        Ok(())
    }

    #[test]
    fn test_read_rejects_table_granularity() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;

        let err = runtime.read("sales.orders").unwrap_err();
        assert!(
            matches!(err, EnactError::Domain(DomainError::InvalidPath { .. })),
            "{err}"
        );
        assert!(err.to_string().contains("single table"), "{err}");
        Ok(())
    }

    #[test]
    fn test_read_unknown_binding() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;

        let err = runtime.read("marketing").unwrap_err();
        assert!(
            matches!(err, EnactError::Domain(DomainError::UnknownSchema(_))),
            "{err}"
        );
        Ok(())
    }

    #[test]
    fn test_read_many_is_keyed_by_binding() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;

        let datasets = runtime.read_many(&["sales", "billing"])?;
        assert_eq!(datasets.len(), 2);
        assert!(datasets.contains_key("sales"));
        assert!(datasets.contains_key("billing"));
        Ok(())
    }

    #[test]
    fn test_database_read_uses_resolved_parameters() -> Result<()> {
        let store = Arc::new(MockDatabaseStore::with_canned(orders_dataset()));
        let runtime = database_runtime(store.clone())?;

        let bound = runtime.read("sales")?;
        assert_eq!(bound.data(), &orders_dataset());
        assert_eq!(
            store.calls(),
            vec!["read postgres://db.internal/app scenario_7".to_string()]
        );
        Ok(())
    }

    #[test]
    fn test_database_write_can_provision_tables_first() -> Result<()> {
        let store = Arc::new(MockDatabaseStore::default());
        let runtime = database_runtime(store.clone())?;

        let bound = BoundDataset::new("sales", orders_dataset());
        runtime.write_with(
            &bound,
            WriteOptions {
                allow_overwrite: false,
                create_tables: true,
            },
        )?;
        assert_eq!(
            store.calls(),
            vec![
                "ensure postgres://db.internal/app scenario_7 tables=1".to_string(),
                "write postgres://db.internal/app scenario_7 rows=1 overwrite=false".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_missing_database_parameters_are_named() -> Result<()> {
        // The root default is a directory; a schema-level record with only a
        // schema name inherits nothing from it.
        let dir = tempdir()?;
        let mut runtime = file_runtime(dir.path())?;
        runtime.set_source(
            ExecutionContext::Local,
            "sales",
            DatabaseLocation::new().with_schema_name("s1"),
        )?;

        let err = runtime.read("sales").unwrap_err();
        match err {
            EnactError::Domain(DomainError::MissingParameter { path, parameter }) => {
                assert_eq!(path, "sales");
                assert_eq!(parameter, "connection_string");
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_database_dispatch_without_collaborator() -> Result<()> {
        let dir = tempdir()?;
        let mut runtime = file_runtime(dir.path())?;
        runtime.set_source(
            ExecutionContext::Local,
            "sales",
            DatabaseLocation::new()
                .with_connection_string("postgres://db.internal/app")
                .with_schema_name("s1"),
        )?;

        let err = runtime.read("sales").unwrap_err();
        assert!(err.to_string().contains("no database collaborator"), "{err}");
        Ok(())
    }

    #[test]
    fn test_unbound_write_infers_unique_binding() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;

        runtime.write_dataset(&orders_dataset())?;
        let back = runtime.read("sales")?;
        assert_eq!(back.data().table("orders").unwrap().len(), 1);
        Ok(())
    }

    #[test]
    fn test_inference_rejects_zero_matches() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;

        let mut stray = Dataset::new();
        stray.insert_table("mystery", Table::new(vec!["id".into()]));
        let err = runtime.write_dataset(&stray).unwrap_err();
        assert!(
            matches!(err, EnactError::Domain(DomainError::UnknownSchema(_))),
            "{err}"
        );
        Ok(())
    }

    #[test]
    fn test_inference_rejects_ambiguous_matches() -> Result<()> {
        let dir = tempdir()?;
        let runtime = ActionRuntime::builder("demo")
            .with_binding("sales", sales_tables())
            .with_binding("sales_backup", sales_tables())
            .with_local_root(dir.path())
            .build()?;

        let err = runtime.write_dataset(&orders_dataset()).unwrap_err();
        assert!(err.to_string().contains("ambiguous"), "{err}");
        Ok(())
    }

    #[test]
    fn test_check_flags_type_violation() -> Result<()> {
        let typed = TableCollection::new().with_table(
            TableSchema::new("orders", ["id"], ["item", "qty"])
                .with_field_spec("qty", FieldSpec::required(FieldType::Integer)),
        );
        let dir = tempdir()?;
        let runtime = ActionRuntime::builder("demo")
            .with_binding("sales", typed)
            .with_local_root(dir.path())
            .build()?;

        let mut orders = Table::new(vec!["id".into(), "item".into(), "qty".into()]);
        orders.push_row(vec![1_i64.into(), "widget".into(), "many".into()])?;
        let mut dataset = Dataset::new();
        dataset.insert_table("orders", orders);

        let err = runtime
            .check(&BoundDataset::new("sales", dataset))
            .unwrap_err();
        match err {
            EnactError::Domain(DomainError::Validation { binding, report }) => {
                assert_eq!(binding, "sales");
                assert_eq!(report.count_of(ViolationKind::FieldType), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_check_dataset_accepts_clean_data() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;
        runtime.check_dataset(&orders_dataset())?;
        Ok(())
    }

    #[test]
    fn test_seed_config_defaults_provisions_and_writes() -> Result<()> {
        let mut parameters = Table::new(vec!["name".into(), "value".into()]);
        parameters.push_row(vec!["horizon".into(), "14".into()])?;
        let mut defaults = Dataset::new();
        defaults.insert_table("parameters", parameters);

        let store = Arc::new(MockDatabaseStore::default());
        let mut runtime = ActionRuntime::builder("demo")
            .with_config(
                TableCollection::new()
                    .with_table(TableSchema::new("parameters", ["name"], ["value"])),
                Some(defaults),
            )
            .with_database_store(store.clone())
            .build()?;
        runtime.set_source(
            ExecutionContext::Local,
            "",
            DatabaseLocation::new()
                .with_connection_string("postgres://db.internal/app")
                .with_schema_name("scenario_7"),
        )?;

        runtime.seed_config_defaults()?;
        assert_eq!(
            store.calls(),
            vec![
                "ensure postgres://db.internal/app scenario_7 tables=1".to_string(),
                "write postgres://db.internal/app scenario_7 rows=1 overwrite=true".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_seed_without_config_binding_is_unknown_schema() -> Result<()> {
        let dir = tempdir()?;
        let runtime = file_runtime(dir.path())?;
        let err = runtime.seed_config_defaults().unwrap_err();
        assert!(
            matches!(err, EnactError::Domain(DomainError::UnknownSchema(_))),
            "{err}"
        );
        Ok(())
    }

    #[test]
    fn test_seed_without_defaults_is_a_no_op() -> Result<()> {
        let dir = tempdir()?;
        let runtime = ActionRuntime::builder("demo")
            .with_config(
                TableCollection::new()
                    .with_table(TableSchema::new("parameters", ["name"], ["value"])),
                None,
            )
            .with_local_root(dir.path())
            .build()?;

        runtime.seed_config_defaults()?;
        assert!(!dir.path().join("parameters.csv").exists());
        Ok(())
    }
}
