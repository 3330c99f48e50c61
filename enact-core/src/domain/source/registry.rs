// enact-core/src/domain/source/registry.rs

use crate::domain::error::DomainError;
use crate::domain::source::location::{DatabaseLocation, SourceLocation};
use crate::domain::source::path::SourcePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
    #[default]
    Local,
    Hosted,
}

impl ExecutionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Hosted => "hosted",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One schema's slot in a partition: its own optional source plus per-table
/// overrides. A node may exist purely because a table under it was
/// registered; its own source stays unset then.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    source: Option<SourceLocation>,
    tables: BTreeMap<String, SourceLocation>,
}

impl SchemaNode {
    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    pub fn table(&self, name: &str) -> Option<&SourceLocation> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> &BTreeMap<String, SourceLocation> {
        &self.tables
    }
}

/// The source tree of one execution context: an optional default source plus
/// schema nodes.
#[derive(Debug, Clone, Default)]
pub struct PartitionTree {
    source: Option<SourceLocation>,
    schemas: BTreeMap<String, SchemaNode>,
}

impl PartitionTree {
    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> &BTreeMap<String, SchemaNode> {
        &self.schemas
    }
}

/// Both partitions. Built once per runtime, mutated only through
/// [`SourceRegistry::set_source`], read by the resolver.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    local: PartitionTree,
    hosted: PartitionTree,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self, context: ExecutionContext) -> &PartitionTree {
        match context {
            ExecutionContext::Local => &self.local,
            ExecutionContext::Hosted => &self.hosted,
        }
    }

    fn tree_mut(&mut self, context: ExecutionContext) -> &mut PartitionTree {
        match context {
            ExecutionContext::Local => &mut self.local,
            ExecutionContext::Hosted => &mut self.hosted,
        }
    }

    /// Exact node lookup, no fallback. Mostly useful to inspect what was
    /// registered; resolution goes through [`SourceRegistry::resolve`].
    pub fn get(&self, context: ExecutionContext, path: &SourcePath) -> Option<&SourceLocation> {
        let tree = self.tree(context);
        match path {
            SourcePath::Root => tree.source.as_ref(),
            SourcePath::Schema(schema) => tree.schemas.get(schema)?.source.as_ref(),
            SourcePath::Table { schema, table } => tree.schemas.get(schema)?.tables.get(table),
        }
    }

    /// Registers (or replaces) the source at exactly `path`. Sibling and
    /// ancestor entries are never touched.
    pub fn set_source(
        &mut self,
        context: ExecutionContext,
        path: &SourcePath,
        location: SourceLocation,
    ) -> Result<(), DomainError> {
        check_location(path, &location)?;

        let tree = self.tree_mut(context);
        match path {
            SourcePath::Root => tree.source = Some(location),
            SourcePath::Schema(schema) => {
                tree.schemas.entry(schema.clone()).or_default().source = Some(location);
            }
            SourcePath::Table { schema, table } => {
                tree.schemas
                    .entry(schema.clone())
                    .or_default()
                    .tables
                    .insert(table.clone(), location);
            }
        }
        Ok(())
    }
}

fn check_location(path: &SourcePath, location: &SourceLocation) -> Result<(), DomainError> {
    let invalid = |reason: String| DomainError::InvalidLocation {
        path: path.to_string(),
        reason,
    };

    match location {
        SourceLocation::FileOrDir { path: target } => {
            // A URL offered where a filesystem path belongs is almost always
            // a misplaced connection string.
            if target.to_string_lossy().contains("://") {
                return Err(invalid(format!(
                    "'{}' looks like a URL, not a file path; use a database record instead",
                    target.display()
                )));
            }
            Ok(())
        }
        SourceLocation::Database(db) => check_database_location(path, db, invalid),
    }
}

fn check_database_location(
    path: &SourcePath,
    db: &DatabaseLocation,
    invalid: impl Fn(String) -> DomainError,
) -> Result<(), DomainError> {
    if db.is_unset() {
        return Err(invalid("database record has no fields set".to_string()));
    }
    if db.connection_string.is_some() && db.schema_name.is_none() {
        return Err(invalid(
            "connection_string requires schema_name to be set as well".to_string(),
        ));
    }
    if let Some(url) = &db.connection_string {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "postgres" | "postgresql") => {}
            Ok(parsed) => {
                return Err(invalid(format!(
                    "unsupported connection scheme '{}'; expected postgres:// or postgresql://",
                    parsed.scheme()
                )));
            }
            Err(_) => {
                return Err(invalid("connection_string is not a valid URL".to_string()));
            }
        }
    }

    match path {
        SourcePath::Root | SourcePath::Schema(_) => {
            if db.table_name.is_some() {
                return Err(invalid(format!(
                    "table_name is not allowed at {} granularity",
                    if path.is_root() { "root" } else { "schema" }
                )));
            }
            if db.schema_name.is_none() {
                return Err(invalid(
                    "schema_name is required for a database source at this granularity"
                        .to_string(),
                ));
            }
        }
        SourcePath::Table { .. } => {
            if db.table_name.is_none() {
                return Err(invalid(
                    "table_name is required for a table-level database source".to_string(),
                ));
            }
        }
    }
    Ok(())
}
