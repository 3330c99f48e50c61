// enact-core/src/domain/mod.rs

pub mod dataset;
pub mod error;
pub mod schema;
pub mod source;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use dataset::{BoundDataset, CellValue, Dataset, Table};
pub use error::DomainError;
