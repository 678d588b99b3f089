//! Error types for typegen-build.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type for typegen-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while locating inputs or writing outputs.
#[derive(Error, Debug, Diagnostic)]
pub enum BuildError {
    /// Failed to read a file or directory.
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(typegen::build::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a generated file.
    #[error("failed to write {}", path.display())]
    #[diagnostic(code(typegen::build::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse {}", path.display())]
    #[diagnostic(code(typegen::build::config))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No ancestor of the start directory contains the layout marker.
    #[error("could not find the project root above {}", start.display())]
    #[diagnostic(
        code(typegen::build::root_not_found),
        help("the generator must run from a binary inside a tree containing '{marker}'")
    )]
    RootNotFound { start: PathBuf, marker: &'static str },
}
