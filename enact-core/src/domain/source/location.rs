// enact-core/src/domain/source/location.rs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The database half of a source location. Any field may be left unset and
/// inherited from an enclosing level at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

impl DatabaseLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection_string(mut self, url: impl Into<String>) -> Self {
        self.connection_string = Some(url.into());
        self
    }

    pub fn with_schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    pub fn is_unset(&self) -> bool {
        self.connection_string.is_none() && self.schema_name.is_none() && self.table_name.is_none()
    }
}

/// Where a table (or a whole schema, or everything) lives: a filesystem
/// target or a database record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceLocation {
    FileOrDir { path: PathBuf },
    Database(DatabaseLocation),
}

impl SourceLocation {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::FileOrDir { path: path.into() }
    }

    pub fn database(location: DatabaseLocation) -> Self {
        Self::Database(location)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::FileOrDir { .. } => "file_or_dir",
            Self::Database(_) => "database",
        }
    }

    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    pub fn as_database(&self) -> Option<&DatabaseLocation> {
        match self {
            Self::Database(db) => Some(db),
            Self::FileOrDir { .. } => None,
        }
    }

    pub fn as_file(&self) -> Option<&Path> {
        match self {
            Self::FileOrDir { path } => Some(path),
            Self::Database(_) => None,
        }
    }
}

impl From<&str> for SourceLocation {
    fn from(path: &str) -> Self {
        Self::file(path)
    }
}

impl From<String> for SourceLocation {
    fn from(path: String) -> Self {
        Self::file(path)
    }
}

impl From<&Path> for SourceLocation {
    fn from(path: &Path) -> Self {
        Self::file(path)
    }
}

impl From<PathBuf> for SourceLocation {
    fn from(path: PathBuf) -> Self {
        Self::file(path)
    }
}

impl From<DatabaseLocation> for SourceLocation {
    fn from(location: DatabaseLocation) -> Self {
        Self::Database(location)
    }
}
