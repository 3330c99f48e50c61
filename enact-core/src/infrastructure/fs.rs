// enact-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Creates the parent directory of `path` when it does not exist yet, so a
/// write to a fresh output location does not fail on the first run.
pub fn ensure_parent_dir(path: &Path) -> Result<(), InfrastructureError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(InfrastructureError::Io)?;
    }
    Ok(())
}

/// Writes `content` to `path` atomically: the bytes land in a temporary file
/// next to the target first and are renamed over it afterwards. A crashed or
/// interrupted write therefore never leaves a half-written data file behind.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    // The temp file must live in the target directory: rename is only atomic
    // within one filesystem.
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;
    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}
