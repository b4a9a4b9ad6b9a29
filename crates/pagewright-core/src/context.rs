use pagewright_schema::ResolvedConfig;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Name of the canonical intermediate artifact inside the scratch directory.
pub const ARTIFACT_FILE_NAME: &str = "data.ttl";

/// Scratch directories of every live context. A forced exit skips
/// destructors, so the signal handler removes these itself.
static LIVE_SCRATCH: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Remove every live scratch directory.
pub(crate) fn remove_live_scratch() {
    let live = LIVE_SCRATCH.lock().unwrap_or_else(PoisonError::into_inner);
    for path in live.iter() {
        let _ = std::fs::remove_dir_all(path);
    }
}

/// Entry in `LIVE_SCRATCH` for as long as it is alive.
struct Registration(PathBuf);

impl Registration {
    fn new(path: &Path) -> Self {
        LIVE_SCRATCH
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
        Self(path.to_path_buf())
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut live = LIVE_SCRATCH.lock().unwrap_or_else(PoisonError::into_inner);
        live.retain(|path| path != &self.0);
    }
}

/// Per-invocation working state, owned by the stage runner.
///
/// The scratch directory lives exactly as long as this value: it is removed
/// when the context is dropped, whichever way the invocation ends.
pub struct StageContext<'a> {
    pub config: &'a ResolvedConfig,
    scratch: TempDir,
    data_file: Option<PathBuf>,
    _registration: Registration,
}

impl<'a> StageContext<'a> {
    /// Create a fresh scratch directory, under `root` if given, otherwise in
    /// the system temp directory.
    pub fn create(config: &'a ResolvedConfig, root: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pagewright-");
        let scratch = match root {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        };
        debug!("scratch directory: {}", scratch.path().display());
        Ok(Self {
            config,
            _registration: Registration::new(scratch.path()),
            scratch,
            data_file: None,
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Fixed location the extraction stage writes to.
    pub fn artifact_target(&self) -> PathBuf {
        self.scratch.path().join(ARTIFACT_FILE_NAME)
    }

    pub fn record_data_file(&mut self, path: PathBuf) {
        self.data_file = Some(path);
    }

    /// The intermediate artifact, once extraction has produced it.
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    /// Remove the scratch directory now, reporting (but not failing on)
    /// removal errors. Dropping the context does the same silently.
    pub fn close(self) {
        let path = self.scratch.path().to_path_buf();
        if let Err(e) = self.scratch.close() {
            warn!("failed to remove scratch directory {}: {e}", path.display());
        }
    }
}
