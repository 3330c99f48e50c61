// enact-core/src/infrastructure/files/mod.rs

pub mod csv_dir;
pub mod document;
pub mod spreadsheet;
pub mod sql_dump;

use crate::domain::dataset::Dataset;
use crate::domain::error::DomainError;
use crate::domain::schema::TableCollection;
use crate::error::EnactError;
use crate::ports::file_store::{FileFormat, FileStore};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessIntent {
    Read,
    Write,
}

/// Decides which strategy serves `target`, and which path that strategy
/// actually operates on.
///
/// An existing directory is a CSV directory. A `.csv` file addresses its
/// whole parent directory, where sibling tables of the same dataset live.
/// On write, a fresh extensionless target becomes a CSV directory that the
/// strategy creates on demand; on read it is unsupported, since there is
/// nothing on disk to tell us what it was meant to be.
pub fn split_target(
    target: &Path,
    intent: AccessIntent,
) -> Result<(PathBuf, FileFormat), DomainError> {
    if target.is_dir() {
        return Ok((target.to_path_buf(), FileFormat::CsvDirectory));
    }

    let extension = target
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => Ok((parent_of(target), FileFormat::CsvDirectory)),
        Some("xls" | "xlsx") => Ok((target.to_path_buf(), FileFormat::Spreadsheet)),
        Some("sql" | "db") => Ok((target.to_path_buf(), FileFormat::SqlDump)),
        Some("json") => Ok((target.to_path_buf(), FileFormat::Document)),
        None if intent == AccessIntent::Write => {
            Ok((target.to_path_buf(), FileFormat::CsvDirectory))
        }
        _ => Err(DomainError::UnsupportedFileType(
            target.display().to_string(),
        )),
    }
}

fn parent_of(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The default file collaborator: plain-file implementations of all four
/// format strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularFileStore;

impl TabularFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for TabularFileStore {
    fn read(
        &self,
        target: &Path,
        format: FileFormat,
        tables: &TableCollection,
    ) -> Result<Dataset, EnactError> {
        match format {
            FileFormat::CsvDirectory => csv_dir::read(target, tables),
            FileFormat::Spreadsheet => spreadsheet::read(target, tables),
            FileFormat::SqlDump => sql_dump::read(target, tables),
            FileFormat::Document => document::read(target, tables),
        }
    }

    fn write(
        &self,
        target: &Path,
        format: FileFormat,
        tables: &TableCollection,
        dataset: &Dataset,
        allow_overwrite: bool,
    ) -> Result<(), EnactError> {
        match format {
            FileFormat::CsvDirectory => csv_dir::write(target, tables, dataset, allow_overwrite),
            FileFormat::Spreadsheet => {
                spreadsheet::write(target, tables, dataset, allow_overwrite)
            }
            FileFormat::SqlDump => sql_dump::write(target, tables, dataset, allow_overwrite),
            FileFormat::Document => document::write(target, tables, dataset, allow_overwrite),
        }
    }
}
