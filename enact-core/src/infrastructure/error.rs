// enact-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum FileFormatError {
    #[error("CSV Error: {0}")]
    #[diagnostic(
        code(enact::infra::format::csv),
        help("Check the delimiter and row widths in the offending file.")
    )]
    Csv(#[from] csv::Error),

    #[error("SQLite Engine Error: {0}")]
    #[diagnostic(
        code(enact::infra::format::sqlite),
        help("An error occurred inside the embedded SQL engine.")
    )]
    Sqlite(#[from] rusqlite::Error),

    #[error("Spreadsheet Read Error: {0}")]
    #[diagnostic(code(enact::infra::format::spreadsheet_read))]
    SpreadsheetRead(#[from] calamine::Error),

    #[error("Spreadsheet Write Error: {0}")]
    #[diagnostic(code(enact::infra::format::spreadsheet_write))]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILE FORMATS (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FileFormatError),

    // --- DATABASE COLLABORATOR ---
    #[error("Database Store Error: {0}")]
    #[diagnostic(
        code(enact::infra::database),
        help("Check the connection string and that the server is reachable.")
    )]
    Database(String),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(enact::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("Refusing to overwrite existing data at '{0}'")]
    #[diagnostic(
        code(enact::infra::overwrite),
        help("Pass allow_overwrite = true to replace existing data.")
    )]
    OverwriteRefused(String),

    // --- CONFIG / JSON ---
    #[error("JSON Parsing Error: {0}")]
    #[diagnostic(
        code(enact::infra::json),
        help("Check the JSON syntax of the hosted configuration file.")
    )]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Hosted configuration not found at '{0}'")]
    #[diagnostic(code(enact::infra::config_missing))]
    ConfigNotFound(String),
}

// Manual implementations for shortcuts (e.g. `?` operator on csv/rusqlite calls)
impl From<csv::Error> for InfrastructureError {
    fn from(err: csv::Error) -> Self {
        InfrastructureError::Format(FileFormatError::Csv(err))
    }
}

impl From<rusqlite::Error> for InfrastructureError {
    fn from(err: rusqlite::Error) -> Self {
        InfrastructureError::Format(FileFormatError::Sqlite(err))
    }
}

impl From<calamine::Error> for InfrastructureError {
    fn from(err: calamine::Error) -> Self {
        InfrastructureError::Format(FileFormatError::SpreadsheetRead(err))
    }
}

impl From<rust_xlsxwriter::XlsxError> for InfrastructureError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        InfrastructureError::Format(FileFormatError::SpreadsheetWrite(err))
    }
}
