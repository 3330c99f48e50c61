// enact-core/src/domain/schema/mod.rs

pub mod collection;
pub mod field;
pub mod table;
pub mod validation;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use collection::{ForeignKey, TableCollection};
pub use field::{FieldSpec, FieldType};
pub use table::{RowCheck, RowView, TableSchema};
pub use validation::{SchemaChecker, Violation, ViolationKind, ViolationReport};
