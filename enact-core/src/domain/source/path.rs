// enact-core/src/domain/source/path.rs

use crate::domain::error::DomainError;
use std::fmt;
use std::str::FromStr;

/// Addresses one node of a source tree: the partition root (`""`), a schema
/// (`"sales"`), or a single table (`"sales.orders"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourcePath {
    Root,
    Schema(String),
    Table { schema: String, table: String },
}

impl SourcePath {
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        if path.is_empty() {
            return Ok(Self::Root);
        }

        let invalid = |reason: &str| DomainError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = path.split('.');
        let schema = segments.next().unwrap_or_default();
        let table = segments.next();
        if segments.next().is_some() {
            return Err(invalid("at most one '.' separator is allowed"));
        }
        if schema.is_empty() {
            return Err(invalid("schema segment is empty"));
        }
        match table {
            None => Ok(Self::Schema(schema.to_string())),
            Some("") => Err(invalid("table segment is empty")),
            Some(table) => Ok(Self::Table {
                schema: schema.to_string(),
                table: table.to_string(),
            }),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn schema(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Schema(s) => Some(s),
            Self::Table { schema, .. } => Some(schema),
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Table { table, .. } => Some(table),
            _ => None,
        }
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => Ok(()),
            Self::Schema(s) => write!(f, "{}", s),
            Self::Table { schema, table } => write!(f, "{}.{}", schema, table),
        }
    }
}

impl FromStr for SourcePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_granularities() -> anyhow::Result<()> {
        assert_eq!(SourcePath::parse("")?, SourcePath::Root);
        assert_eq!(
            SourcePath::parse("sales")?,
            SourcePath::Schema("sales".into())
        );
        assert_eq!(
            SourcePath::parse("sales.orders")?,
            SourcePath::Table {
                schema: "sales".into(),
                table: "orders".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for bad in ["a.b.c", ".orders", "sales.", "."] {
            let err = SourcePath::parse(bad).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidPath { .. }),
                "expected InvalidPath for {bad:?}"
            );
        }
    }

    #[test]
    fn test_display_round_trips() -> anyhow::Result<()> {
        for text in ["", "sales", "sales.orders"] {
            assert_eq!(SourcePath::parse(text)?.to_string(), text);
        }
        Ok(())
    }
}
