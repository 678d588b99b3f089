//! Write-if-changed output.

use std::path::Path;

use crate::{BuildError, Result};

/// What [`write_if_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Wrote,
    Unchanged,
}

/// Replace `path` with `contents` unless it already holds exactly those
/// bytes. Parent directories are created as needed.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome> {
    match std::fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => return Ok(WriteOutcome::Unchanged),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(BuildError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WriteOutcome::Wrote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_new_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("managed/Kind.g.cs");

        assert_eq!(write_if_changed(&path, "a").unwrap(), WriteOutcome::Wrote);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a");
    }

    #[test]
    fn test_identical_content_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinds.g.h");
        std::fs::write(&path, "same").unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert_eq!(write_if_changed(&path, "same").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn test_changed_content_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinds.g.h");
        std::fs::write(&path, "old").unwrap();

        assert_eq!(write_if_changed(&path, "new").unwrap(), WriteOutcome::Wrote);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
