use std::io::Write;
use std::path::Path;

use crate::errors::{CoreError, Result};

/// Write a file atomically with restrictive permissions (0o600 on Unix).
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target path, so a crash mid-write never leaves a truncated file.
pub(crate) fn write_secure_file(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        CoreError::InvalidInput(format!("no parent directory for '{}'", path.display()))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|source| {
        CoreError::WriteFile {
            path: path.to_path_buf(),
            source,
        }
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|source| CoreError::WriteFile {
                path: path.to_path_buf(),
                source,
            })?;
    }

    tmp.write_all(content).map_err(|source| CoreError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;

    tmp.persist(path).map_err(|e| CoreError::WriteFile {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
