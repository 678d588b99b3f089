//! Generator configuration (`typegen.toml` format).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use typegen_emit::{Artifact, EmitOptions};

use crate::{BuildError, Result};

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE: &str = "typegen.toml";

/// Root configuration. Every field has a default, so an empty or absent file
/// describes the standard layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directories scanned for headers, relative to the root.
    pub header_dirs: Vec<PathBuf>,

    /// Macro-like identifiers the parser ignores.
    pub skip_identifiers: Vec<String>,

    /// Shared library named in foreign-function declarations.
    pub library: String,

    /// Root of the hand-written managed sources.
    pub managed_source_dir: PathBuf,

    /// Where each artifact is written.
    pub output: OutputPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_dirs: vec![PathBuf::from("src")],
            skip_identifiers: vec!["MOON_API".to_string(), "G_GNUC_INTERNAL".to_string()],
            library: "moon".to_string(),
            managed_source_dir: PathBuf::from("managed"),
            output: OutputPaths::default(),
        }
    }
}

/// Output path per artifact, relative to the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputPaths {
    pub native_kinds: PathBuf,
    pub type_table: PathBuf,
    pub registration: PathBuf,
    pub cbinding_header: PathBuf,
    pub cbinding_source: PathBuf,
    pub native_events: PathBuf,
    pub native_methods: PathBuf,
    pub wrappers: PathBuf,
    pub managed_events: PathBuf,
    pub managed_kinds: PathBuf,
    pub bridge: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            native_kinds: "src/kinds.g.h".into(),
            type_table: "src/type.g.cpp".into(),
            registration: "src/dependencyproperty.g.cpp".into(),
            cbinding_header: "src/cbinding.h".into(),
            cbinding_source: "src/cbinding.cpp".into(),
            native_events: "src/events.g.cpp".into(),
            native_methods: "managed/NativeMethods.g.cs".into(),
            wrappers: "managed/Wrappers.g.cs".into(),
            managed_events: "managed/Events.g.cs".into(),
            managed_kinds: "managed/Kind.g.cs".into(),
            bridge: "plugin/bridge.g.cpp".into(),
        }
    }
}

impl OutputPaths {
    /// The configured path of `artifact`.
    pub fn get(&self, artifact: Artifact) -> &Path {
        match artifact {
            Artifact::NativeKinds => &self.native_kinds,
            Artifact::TypeTable => &self.type_table,
            Artifact::Registration => &self.registration,
            Artifact::CBindingHeader => &self.cbinding_header,
            Artifact::CBindingSource => &self.cbinding_source,
            Artifact::NativeEvents => &self.native_events,
            Artifact::NativeMethods => &self.native_methods,
            Artifact::Wrappers => &self.wrappers,
            Artifact::ManagedEvents => &self.managed_events,
            Artifact::ManagedKinds => &self.managed_kinds,
            Artifact::Bridge => &self.bridge,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BuildError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `typegen.toml` from `root`, or the defaults when there is none.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading configuration");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Absolute output path of `artifact` under `root`.
    pub fn output_path(&self, root: &Path, artifact: Artifact) -> PathBuf {
        root.join(self.output.get(artifact))
    }

    pub fn emit_options(&self, root: &Path) -> EmitOptions {
        EmitOptions {
            library: self.library.clone(),
            managed_root: root.join(&self.managed_source_dir),
        }
    }
}
