use crate::mock::MockExtractor;
use crate::process::{run, ProcessSpec};
use crate::RuntimeError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Format identifiers understood by extraction collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    /// A directory tree of Markdown documents.
    MarkdownDirectory,
    /// A single consolidated RDF Turtle file.
    Turtle,
}

impl DataFormat {
    pub fn id(self) -> &'static str {
        match self {
            Self::MarkdownDirectory => "markdown-directory",
            Self::Turtle => "turtle",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub input: PathBuf,
    pub input_format: DataFormat,
    pub output: PathBuf,
    pub output_format: DataFormat,
    pub cache_dir: Option<PathBuf>,
    pub debug: bool,
}

/// The data-extraction collaborator.
///
/// A black box: it either leaves an artifact at `request.output` and returns
/// `Ok`, or returns an error carrying its own diagnostic.
pub trait Extractor {
    fn name(&self) -> &str;

    fn extract(&self, request: &ExtractRequest) -> Result<(), RuntimeError>;
}

/// Runs an external extraction program:
///
/// `<program> extract --input-format <id> --input <dir> --output-format <id>
/// --output <file> [--cache <dir>] [--debug]`
pub struct CommandExtractor {
    program: String,
    env: BTreeMap<OsString, OsString>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, env: BTreeMap<OsString, OsString>) -> Self {
        Self {
            program: program.into(),
            env,
        }
    }

    pub fn spec(&self, request: &ExtractRequest) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.program)
            .arg("extract")
            .args(["--input-format", request.input_format.id()])
            .arg("--input")
            .arg(request.input.to_string_lossy())
            .args(["--output-format", request.output_format.id()])
            .arg("--output")
            .arg(request.output.to_string_lossy())
            .env(self.env.clone());
        if let Some(cache) = &request.cache_dir {
            spec = spec.arg("--cache").arg(cache.to_string_lossy());
        }
        if request.debug {
            spec = spec.arg("--debug");
        }
        spec
    }
}

impl Extractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.program
    }

    fn extract(&self, request: &ExtractRequest) -> Result<(), RuntimeError> {
        info!(
            "extracting {} ({}) -> {} ({})",
            request.input.display(),
            request.input_format,
            request.output.display(),
            request.output_format
        );
        run(&self.spec(request)).map_err(|e| RuntimeError::ExtractFailed {
            extractor: self.program.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// `mock` selects the in-process mock; anything else names a program.
pub fn select_extractor(name: &str, env: BTreeMap<OsString, OsString>) -> Box<dyn Extractor> {
    match name {
        "mock" => Box::new(MockExtractor::new()),
        program => Box::new(CommandExtractor::new(program, env)),
    }
}
