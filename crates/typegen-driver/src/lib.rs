use miette::{Result, WrapErr};
use std::path::{Path, PathBuf};
use typegen_build::{discover_headers, find_root, write_if_changed, Config, WriteOutcome};
use typegen_common::{Diagnostic, Diagnostics, SourceMap};
use typegen_emit::{emit_all, Artifact, Model};
use typegen_header::parse_header;
use typegen_model::{finish, sort_properties, Graph};

/// Generator driver that orchestrates parse, resolve, emit and write.
pub struct Driver {
    root: PathBuf,
    config: Config,
}

/// One generated artifact, not yet written.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub artifact: Artifact,
    pub path: PathBuf,
    pub contents: String,
}

/// Result of [`Driver::generate`].
#[derive(Debug)]
pub struct Generated {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

/// What happened to one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub artifact: Artifact,
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Result of [`Driver::run`].
#[derive(Debug)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Driver {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Use `root` with its `typegen.toml`, if any.
    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load(&root)?;
        Ok(Self::new(root, config))
    }

    /// Find the project root above the running binary.
    pub fn locate() -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| miette::miette!("Failed to locate the running binary: {}", e))?;
        let start = exe.parent().unwrap_or(Path::new("."));
        let root = find_root(start)?;
        tracing::debug!(root = %root.display(), "found project root");
        Self::with_root(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse every header and render every artifact without touching disk.
    pub fn generate(&self) -> Result<Generated> {
        let mut sources = SourceMap::new();
        let mut graph = Graph::new();
        let mut typedefs = Vec::new();
        let mut diagnostics = Diagnostics::new();

        for path in discover_headers(&self.root, &self.config)? {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;
            let relative = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
            let id = sources.add_file(&relative, content);
            let source = sources
                .get(id)
                .ok_or_else(|| miette::miette!("Source file not found"))?;

            tracing::debug!(file = %relative.display(), "parsing header");
            let output = parse_header(&mut graph, source, &self.config.skip_identifiers)
                .wrap_err_with(|| format!("while parsing {}", relative.display()))?;
            typedefs.extend(output.typedefs);
        }

        tracing::debug!(files = sources.len(), typedefs = typedefs.len(), "parsed headers");
        finish(&mut graph, &mut diagnostics).wrap_err("while resolving the type graph")?;
        let sorted = sort_properties(&graph).wrap_err("while ordering property registration")?;
        tracing::debug!(
            types = sorted.types.len(),
            properties = sorted.fields.len(),
            "sorted dependency properties"
        );

        let model = Model {
            graph: &graph,
            sorted: &sorted,
            sources: &sources,
            typedefs: &typedefs,
        };
        let options = self.config.emit_options(&self.root);
        let files = emit_all(&model, &options, &mut diagnostics)
            .into_iter()
            .map(|(artifact, contents)| GeneratedFile {
                artifact,
                path: self.config.output_path(&self.root, artifact),
                contents,
            })
            .collect();

        tracing::debug!(warnings = diagnostics.len(), "emitted artifacts");
        Ok(Generated {
            files,
            diagnostics: diagnostics.into_vec(),
        })
    }

    /// Generate and write every artifact whose content changed.
    pub fn run(&self) -> Result<RunReport> {
        let generated = self.generate()?;
        let mut files = Vec::with_capacity(generated.files.len());
        for file in generated.files {
            let outcome = write_if_changed(&file.path, &file.contents)?;
            tracing::debug!(artifact = file.artifact.key(), ?outcome, "wrote artifact");
            files.push(FileReport {
                artifact: file.artifact,
                path: file.path,
                outcome,
            });
        }
        Ok(RunReport {
            files,
            diagnostics: generated.diagnostics,
        })
    }
}
