//! Pipeline orchestration for pagewright.
//!
//! This crate ties the schema layer and the runtime layer together: the
//! invocation lifecycle (`lifecycle`), the per-run scratch context
//! (`context`), projection of the child-process environment
//! (`environment`), orchestrator settings (`settings`), and the
//! `StageRunner` that sequences extraction and the external app build.

pub mod concurrency;
pub mod context;
pub mod environment;
pub mod lifecycle;
pub mod logging;
pub mod runner;
pub mod settings;

pub use concurrency::{install_signal_handler, shutdown_requested};
pub use context::{StageContext, ARTIFACT_FILE_NAME};
pub use environment::{project, Artifacts, DerivedEnvironment};
pub use lifecycle::{validate_transition, Invocation, PipelineState};
pub use logging::{LogContext, Verbosity};
pub use runner::{RunReport, StageRunner};
pub use settings::RunnerSettings;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Schema(#[from] pagewright_schema::SchemaError),
    #[error("extraction failed: {0}")]
    Extraction(#[source] pagewright_runtime::RuntimeError),
    #[error("build failed: {0}")]
    Build(#[source] pagewright_runtime::RuntimeError),
    #[error("app directory not found; looked in: {}", format_candidates(.candidates))]
    LocationNotFound { candidates: Vec<PathBuf> },
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("interrupted")]
    Interrupted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Raised before any stage ran, from the inputs alone.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Settings(_))
    }
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return "(no candidates)".to_owned();
    }
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
