//! Project layout for the generator.
//!
//! This crate provides:
//! - The optional `typegen.toml` configuration file
//! - Root discovery from the running binary
//! - Header discovery
//! - The write-if-changed output writer
//!
//! # Example
//!
//! ```toml
//! # typegen.toml
//! header_dirs = ["src", "src/asf"]
//! skip_identifiers = ["MOON_API"]
//! library = "moon"
//!
//! [output]
//! bridge = "plugin/bridge.g.cpp"
//! ```

mod config;
mod error;
mod layout;
mod writer;

pub use config::{Config, OutputPaths, CONFIG_FILE};
pub use error::{BuildError, Result};
pub use layout::{discover_headers, find_root, MARKER};
pub use writer::{write_if_changed, WriteOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_config() {
        let toml = r#"
header_dirs = ["src"]
library = "moonplugin"
        "#;

        let config: Config = toml::from_str(toml).expect("Failed to parse config");
        assert_eq!(config.header_dirs.len(), 1);
        assert_eq!(config.library, "moonplugin");
    }
}
