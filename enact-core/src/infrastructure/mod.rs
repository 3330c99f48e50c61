// enact-core/src/infrastructure/mod.rs

pub mod error;
pub mod files;
pub mod fs;
pub mod hosted;

// Optional: Re-export the default collaborator if you want cleaner imports elsewhere
pub use files::TabularFileStore;
