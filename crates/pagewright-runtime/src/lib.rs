//! Execution layer for pagewright pipelines.
//!
//! This crate owns everything that leaves the process: the single
//! cross-platform process primitive (`process::run`), the extraction
//! collaborator trait with its command-line and mock implementations, and
//! the probing of candidate directories on disk.

pub mod extract;
pub mod locate;
pub mod mock;
pub mod process;

pub use extract::{select_extractor, CommandExtractor, DataFormat, ExtractRequest, Extractor};
pub use locate::first_existing_dir;
pub use mock::MockExtractor;
pub use process::{kill_running, run, terminate_running, ProcessOutput, ProcessSpec};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}")]
    NonZeroExit { program: String, status: String },
    #[error("'{program}' did not finish within {}s", .after.as_secs())]
    Timeout { program: String, after: Duration },
    #[error("extractor '{extractor}' failed: {message}")]
    ExtractFailed { extractor: String, message: String },
    #[error("extractor '{extractor}' reported success but wrote no artifact at {}", .path.display())]
    ArtifactMissing { extractor: String, path: PathBuf },
}

impl RuntimeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
