// enact-core/src/ports/mod.rs

pub mod database_store;
pub mod file_store;
pub mod validator;

pub use database_store::DatabaseStore;
pub use file_store::{FileFormat, FileStore};
pub use validator::DatasetValidator;
