// enact-core/src/ports/database_store.rs

use crate::domain::dataset::Dataset;
use crate::domain::schema::TableCollection;
use crate::error::EnactError;

/// Contract for the database collaborator. Implementations are expected to
/// keep one long-lived connection per URL, so that opening a connection at
/// bootstrap and dispatching to the same URL later reuses it instead of
/// reconnecting.
pub trait DatabaseStore: Send + Sync {
    /// Opens (or re-validates) the connection for `url`.
    fn open(&self, url: &str) -> Result<(), EnactError>;

    /// Reads every table declared by `tables` from `db_schema`.
    fn read(
        &self,
        url: &str,
        db_schema: &str,
        tables: &TableCollection,
    ) -> Result<Dataset, EnactError>;

    /// Replaces table contents in `db_schema` with `dataset`. With
    /// `allow_overwrite` false, a target table that already holds rows must
    /// be left untouched and reported.
    fn write(
        &self,
        url: &str,
        db_schema: &str,
        tables: &TableCollection,
        dataset: &Dataset,
        allow_overwrite: bool,
    ) -> Result<(), EnactError>;

    /// Idempotent provisioning: create the schema and the declared tables
    /// when absent, leave existing ones alone.
    fn ensure_tables(
        &self,
        url: &str,
        db_schema: &str,
        tables: &TableCollection,
    ) -> Result<(), EnactError>;
}
