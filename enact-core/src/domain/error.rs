// enact-core/src/domain/error.rs

use crate::domain::schema::ViolationReport;
use crate::domain::source::ExecutionContext;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid source path '{path}': {reason}")]
    #[diagnostic(
        code(enact::domain::invalid_path),
        help("Valid paths are \"\", \"<schema>\" or \"<schema>.<table>\".")
    )]
    InvalidPath { path: String, reason: String },

    #[error("No default source configured for the {0} context")]
    #[diagnostic(
        code(enact::domain::no_default_source),
        help("Register a root source with set_source(\"\", ...) first.")
    )]
    NoDefaultSource(ExecutionContext),

    #[error("Invalid source location for '{path}': {reason}")]
    #[diagnostic(code(enact::domain::invalid_location))]
    InvalidLocation { path: String, reason: String },

    #[error("Missing parameter '{parameter}' for database source '{path}'")]
    #[diagnostic(
        code(enact::domain::missing_parameter),
        help("Set the parameter on the source itself or on an enclosing level.")
    )]
    MissingParameter { path: String, parameter: String },

    #[error("Unknown schema binding '{0}'")]
    #[diagnostic(
        code(enact::domain::unknown_schema),
        help("Declare the binding when building the runtime.")
    )]
    UnknownSchema(String),

    #[error("Unsupported file type for '{0}'")]
    #[diagnostic(
        code(enact::domain::unsupported_file_type),
        help("Supported targets: directories, .csv, .xls, .xlsx, .sql, .db, .json.")
    )]
    UnsupportedFileType(String),

    #[error("Invalid schema binding '{name}': {reason}")]
    #[diagnostic(code(enact::domain::invalid_binding))]
    InvalidBinding { name: String, reason: String },

    #[error("Row width mismatch: expected {expected} cells, got {got}")]
    #[diagnostic(code(enact::domain::row_width))]
    RowWidth { expected: usize, got: usize },

    #[error("Data validation failed for '{binding}': {report}")]
    #[diagnostic(
        code(enact::domain::validation),
        help("Inspect the violation report for per-table details.")
    )]
    Validation {
        binding: String,
        report: ViolationReport,
    },
}
