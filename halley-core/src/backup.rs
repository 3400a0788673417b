//! Backup-before-mutate discipline for the persisted configuration files.
//!
//! Every mutation of a persisted file is preceded by a timestamped copy, so
//! an interrupted run never loses the last-known-good configuration.
//! Backups are strictly additive and never deleted by this crate.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::errors::{CoreError, Result};

/// Sortable second-resolution timestamp used in backup file names.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Backup destination for `path` at the given stamp: `<path>.bak.<stamp>`.
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".bak.{stamp}"));
    PathBuf::from(name)
}

/// Copy `path` byte-for-byte to `<path>.bak.<timestamp>`.
///
/// Returns `None` when the source does not exist: there is nothing to
/// preserve and the overall operation must not fail. An existing backup
/// for the same second is returned untouched rather than overwritten, so
/// at most one backup per second per file exists.
pub fn backup_file(path: &Path) -> Result<Option<PathBuf>> {
    backup_file_at(path, &timestamp())
}

/// Same as [`backup_file`] with a caller-supplied stamp.
pub fn backup_file_at(path: &Path, stamp: &str) -> Result<Option<PathBuf>> {
    if !path.exists() {
        debug!("No backup taken, {} does not exist yet", path.display());
        return Ok(None);
    }

    let dest = backup_path(path, stamp);
    if dest.exists() {
        debug!("Backup {} already exists, keeping it", dest.display());
        return Ok(Some(dest));
    }

    std::fs::copy(path, &dest).map_err(|source| CoreError::WriteFile {
        path: dest.clone(),
        source,
    })?;

    info!("Backed up {} -> {}", path.display(), dest.display());
    Ok(Some(dest))
}

/// Move `path` aside to `<path>.bak.<timestamp>`.
///
/// Used for wholly-regenerated artifacts (the manifest), where the old
/// file is replaced rather than patched. Same no-op and no-overwrite
/// rules as [`backup_file`]; on a same-second collision the source is
/// removed so the caller's fresh write does not race the old content.
pub fn backup_rename(path: &Path) -> Result<Option<PathBuf>> {
    backup_rename_at(path, &timestamp())
}

/// Same as [`backup_rename`] with a caller-supplied stamp.
pub fn backup_rename_at(path: &Path, stamp: &str) -> Result<Option<PathBuf>> {
    if !path.exists() {
        debug!("No backup taken, {} does not exist yet", path.display());
        return Ok(None);
    }

    let dest = backup_path(path, stamp);
    if dest.exists() {
        debug!("Backup {} already exists, keeping it", dest.display());
        std::fs::remove_file(path).map_err(|source| CoreError::WriteFile {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(Some(dest));
    }

    std::fs::rename(path, &dest).map_err(|source| CoreError::WriteFile {
        path: dest.clone(),
        source,
    })?;

    info!("Moved {} -> {}", path.display(), dest.display());
    Ok(Some(dest))
}

/// Positional line diff between two file snapshots, for operator
/// visibility after a mutation. Informational only: never affects
/// control flow.
pub fn diff_lines(old: &str, new: &str) -> Vec<String> {
    let old: Vec<&str> = old.lines().collect();
    let new: Vec<&str> = new.lines().collect();

    let mut out = Vec::new();
    for index in 0..old.len().max(new.len()) {
        match (old.get(index), new.get(index)) {
            (Some(o), Some(n)) if o == n => {}
            (Some(o), Some(n)) => {
                out.push(format!("- {o}"));
                out.push(format!("+ {n}"));
            }
            (Some(o), None) => out.push(format!("- {o}")),
            (None, Some(n)) => out.push(format!("+ {n}")),
            (None, None) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_missing_source_is_noop() {
        let dir = TempDir::new().unwrap();
        let result = backup_file(&dir.path().join("absent.env")).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_backup_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "KEY=value\n").unwrap();

        let backup = backup_file_at(&path, "20260101-120000").unwrap().unwrap();

        assert_eq!(
            backup,
            dir.path().join(".env.bak.20260101-120000")
        );
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "KEY=value\n");
        // Source untouched.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "KEY=value\n");
    }

    #[test]
    fn test_backup_never_overwrites_same_second() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "KEY=first\n").unwrap();

        let first = backup_file_at(&path, "20260101-120000").unwrap().unwrap();
        std::fs::write(&path, "KEY=second\n").unwrap();
        let second = backup_file_at(&path, "20260101-120000").unwrap().unwrap();

        assert_eq!(first, second);
        // The original backup content survives.
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "KEY=first\n");
    }

    #[test]
    fn test_backup_rename_moves_source_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docker-compose.yml");
        std::fs::write(&path, "services: {}\n").unwrap();

        let backup = backup_rename_at(&path, "20260101-120000").unwrap().unwrap();

        assert!(!path.exists());
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "services: {}\n");
    }

    #[test]
    fn test_diff_reports_changed_added_removed() {
        let old = "A=1\nB=2\nC=3\n";
        let new = "A=1\nB=9\n";

        let diff = diff_lines(old, new);
        assert_eq!(diff, vec!["- B=2", "+ B=9", "- C=3"]);
    }

    #[test]
    fn test_diff_identical_is_empty() {
        assert!(diff_lines("A=1\n", "A=1\n").is_empty());
    }
}
