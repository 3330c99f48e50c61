// enact-core/src/ports/validator.rs

use crate::domain::dataset::Dataset;
use crate::domain::schema::{SchemaChecker, TableCollection, ViolationReport};

/// Contract for the schema-validation collaborator. Infallible on purpose:
/// whatever is wrong with the data belongs in the report, not in an error.
pub trait DatasetValidator: Send + Sync {
    fn validate(&self, tables: &TableCollection, dataset: &Dataset) -> ViolationReport;
}

impl DatasetValidator for SchemaChecker {
    fn validate(&self, tables: &TableCollection, dataset: &Dataset) -> ViolationReport {
        SchemaChecker::check(tables, dataset)
    }
}
