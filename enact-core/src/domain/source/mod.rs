// enact-core/src/domain/source/mod.rs

pub mod location;
pub mod path;
pub mod registry;
pub mod resolver;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use location::{DatabaseLocation, SourceLocation};
pub use path::SourcePath;
pub use registry::{ExecutionContext, PartitionTree, SchemaNode, SourceRegistry};
pub use resolver::ResolvedSource;
