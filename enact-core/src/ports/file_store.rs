// enact-core/src/ports/file_store.rs

// This file defines what the dispatcher needs from a file collaborator,
// without knowing how it's done. The runtime only ever says "read these
// declared tables from that target, in that format".

use crate::domain::dataset::Dataset;
use crate::domain::schema::TableCollection;
use crate::error::EnactError;
use std::fmt;
use std::path::Path;

/// The storage strategy for a filesystem target. Picked by the dispatcher
/// from the target itself (directory vs. extension), never by the
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// One `<table>.csv` per declared table inside a directory.
    CsvDirectory,
    /// One worksheet per declared table in a single workbook.
    Spreadsheet,
    /// A SQLite container: a `.db` file or a `.sql` text dump.
    SqlDump,
    /// A single JSON document holding every table.
    Document,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CsvDirectory => "csv_directory",
            Self::Spreadsheet => "spreadsheet",
            Self::SqlDump => "sql_dump",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub trait FileStore: Send + Sync {
    /// Reads every table declared by `tables` from `target`. Tables with no
    /// backing file come back empty, not missing.
    fn read(
        &self,
        target: &Path,
        format: FileFormat,
        tables: &TableCollection,
    ) -> Result<Dataset, EnactError>;

    /// Writes `dataset` to `target`. With `allow_overwrite` false, an
    /// existing non-empty target must be left untouched and reported.
    fn write(
        &self,
        target: &Path,
        format: FileFormat,
        tables: &TableCollection,
        dataset: &Dataset,
        allow_overwrite: bool,
    ) -> Result<(), EnactError>;
}
