//! Locating the project root and its headers.

use std::path::{Path, PathBuf};

use typegen_emit::Artifact;

use crate::{BuildError, Config, Result};

/// Directory whose presence marks the project root.
pub const MARKER: &str = "tools/typegen";

/// Walk upward from `start` to the first directory containing [`MARKER`].
pub fn find_root(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MARKER).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| BuildError::RootNotFound {
            start: start.to_path_buf(),
            marker: MARKER,
        })
}

/// Headers to parse: `*.h` directly inside each configured directory,
/// sorted by name within a directory. Generated headers and configured
/// outputs are excluded.
pub fn discover_headers(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let outputs: Vec<PathBuf> = Artifact::ALL
        .iter()
        .map(|a| config.output_path(root, *a))
        .collect();

    let mut headers = Vec::new();
    for dir in &config.header_dirs {
        let dir = root.join(dir);
        let entries = std::fs::read_dir(&dir).map_err(|source| BuildError::Read {
            path: dir.clone(),
            source,
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| BuildError::Read {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".h") || name.ends_with(".g.h") || !path.is_file() {
                continue;
            }
            if outputs.contains(&path) {
                tracing::debug!(path = %path.display(), "skipping generated header");
                continue;
            }
            found.push(path);
        }
        found.sort();
        tracing::debug!(dir = %dir.display(), count = found.len(), "discovered headers");
        headers.extend(found);
    }
    Ok(headers)
}
