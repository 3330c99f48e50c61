// enact-core/src/domain/source/resolver.rs

use crate::domain::error::DomainError;
use crate::domain::source::location::{DatabaseLocation, SourceLocation};
use crate::domain::source::path::SourcePath;
use crate::domain::source::registry::{ExecutionContext, SchemaNode, SourceRegistry};

/// Outcome of a resolution: the effective location, plus the node that
/// supplied its base value (handy in logs when a table inherits everything).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub location: SourceLocation,
    pub matched: SourcePath,
}

impl SourceRegistry {
    /// Walks the partition for `context` from the node named by `path`
    /// towards the partition default, returning a detached copy of the
    /// effective location.
    ///
    /// Database locations inherit `connection_string` and `schema_name`
    /// field by field from the nearest enclosing level that has them; a
    /// table-level result additionally gets `table_name` defaulted to the
    /// requested table. The registry itself is never modified, so resolving
    /// the same path twice gives the same answer.
    pub fn resolve(
        &self,
        context: ExecutionContext,
        path: &SourcePath,
    ) -> Result<ResolvedSource, DomainError> {
        let tree = self.tree(context);
        let root = tree.source();
        let no_default = || DomainError::NoDefaultSource(context);

        let (base, matched, ancestors): (&SourceLocation, SourcePath, Vec<&SourceLocation>) =
            match path {
                SourcePath::Root => (root.ok_or_else(no_default)?, SourcePath::Root, Vec::new()),

                SourcePath::Schema(schema) => {
                    match tree.schema(schema).and_then(SchemaNode::source) {
                        Some(source) => (source, path.clone(), root.into_iter().collect()),
                        // A schema that was never registered, or that only
                        // exists to hold table overrides, falls through.
                        None => (root.ok_or_else(no_default)?, SourcePath::Root, Vec::new()),
                    }
                }

                SourcePath::Table { schema, table } => {
                    let node = tree.schema(schema);
                    let schema_source = node.and_then(SchemaNode::source);
                    if let Some(source) = node.and_then(|n| n.table(table)) {
                        let mut ancestors = Vec::new();
                        ancestors.extend(schema_source);
                        ancestors.extend(root);
                        (source, path.clone(), ancestors)
                    } else if let Some(source) = schema_source {
                        (
                            source,
                            SourcePath::Schema(schema.clone()),
                            root.into_iter().collect(),
                        )
                    } else {
                        (root.ok_or_else(no_default)?, SourcePath::Root, Vec::new())
                    }
                }
            };

        let mut location = base.clone();
        if let SourceLocation::Database(db) = &mut location {
            backfill(db, &ancestors);
            if let SourcePath::Table { table, .. } = path
                && db.table_name.is_none()
            {
                db.table_name = Some(table.clone());
            }
        }

        Ok(ResolvedSource { location, matched })
    }
}

/// Fills `connection_string` and `schema_name` independently from the
/// nearest ancestor that carries them. File ancestors contribute nothing,
/// and `table_name` is never inherited.
fn backfill(db: &mut DatabaseLocation, ancestors: &[&SourceLocation]) {
    for ancestor in ancestors {
        let Some(up) = ancestor.as_database() else {
            continue;
        };
        if db.connection_string.is_none() {
            db.connection_string = up.connection_string.clone();
        }
        if db.schema_name.is_none() {
            db.schema_name = up.schema_name.clone();
        }
        if db.connection_string.is_some() && db.schema_name.is_some() {
            break;
        }
    }
}
