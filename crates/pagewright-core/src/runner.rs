use crate::concurrency::shutdown_requested;
use crate::context::StageContext;
use crate::environment::{absolute_path, project, Artifacts, DATA_FILE_KEY, OUTPUT_DIR_KEY};
use crate::lifecycle::{Invocation, PipelineState};
use crate::logging::LogContext;
use crate::settings::RunnerSettings;
use crate::CoreError;
use pagewright_runtime::{
    first_existing_dir, run, DataFormat, ExtractRequest, Extractor, ProcessSpec, RuntimeError,
};
use pagewright_schema::{Environment, ResolvedConfig, Variant};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a completed invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub variant: Variant,
    pub states: Vec<PipelineState>,
    pub warnings: Vec<String>,
    /// blake3 of the intermediate artifact.
    pub artifact_digest: String,
    pub app_dir: PathBuf,
    pub output_dir: PathBuf,
    pub timed_out: bool,
    pub started_at: String,
    pub finished_at: String,
}

/// Sequences the extraction and app build stages for one validated
/// configuration.
pub struct StageRunner<'a> {
    settings: &'a RunnerSettings,
    extractor: &'a dyn Extractor,
    ambient: &'a Environment,
    cwd: PathBuf,
    log: LogContext,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        settings: &'a RunnerSettings,
        extractor: &'a dyn Extractor,
        ambient: &'a Environment,
        cwd: impl Into<PathBuf>,
        log: LogContext,
    ) -> Self {
        Self {
            settings,
            extractor,
            ambient,
            cwd: cwd.into(),
            log,
        }
    }

    /// Run every stage. `invocation` must be in `Validating`, as left by
    /// `Invocation::resolve`. Any error moves it to `Failed`; the scratch
    /// directory is gone by the time this returns either way.
    pub fn run(
        &self,
        invocation: &mut Invocation,
        config: &ResolvedConfig,
    ) -> Result<RunReport, CoreError> {
        let started_at = chrono::Utc::now().to_rfc3339();
        match self.run_stages(invocation, config) {
            Ok(outcome) => Ok(RunReport {
                variant: config.variant,
                states: invocation.history().to_vec(),
                warnings: outcome.warnings,
                artifact_digest: outcome.artifact_digest,
                app_dir: outcome.app_dir,
                output_dir: outcome.output_dir,
                timed_out: outcome.timed_out,
                started_at,
                finished_at: chrono::Utc::now().to_rfc3339(),
            }),
            Err(e) => Err(invocation.fail(e)),
        }
    }

    fn run_stages(
        &self,
        invocation: &mut Invocation,
        config: &ResolvedConfig,
    ) -> Result<StageOutcome, CoreError> {
        let mut ctx = StageContext::create(config, self.settings.scratch_root.as_deref())?;

        check_shutdown()?;
        invocation.advance(PipelineState::Extracting)?;
        let artifact_digest = self.extract(&mut ctx)?;

        check_shutdown()?;
        invocation.advance(PipelineState::Building)?;
        let outcome = self.build(&ctx, artifact_digest)?;

        invocation.advance(PipelineState::Done)?;
        ctx.close();
        Ok(outcome)
    }

    fn extract(&self, ctx: &mut StageContext<'_>) -> Result<String, CoreError> {
        let config = ctx.config;
        let request = ExtractRequest {
            input: self.absolute(config.text("input").unwrap_or_default()),
            input_format: DataFormat::MarkdownDirectory,
            output: ctx.artifact_target(),
            output_format: DataFormat::Turtle,
            cache_dir: config.non_blank("cache").map(|c| self.absolute(c)),
            debug: config.flag("debug"),
        };

        info!(
            "extraction: {} -> {} ({})",
            request.input.display(),
            request.output.display(),
            self.extractor.name()
        );
        if let Err(e) = self.extractor.extract(&request) {
            return Err(stage_error(e, CoreError::Extraction));
        }
        if !request.output.is_file() {
            return Err(CoreError::Extraction(RuntimeError::ArtifactMissing {
                extractor: self.extractor.name().to_owned(),
                path: request.output,
            }));
        }

        let digest = artifact_digest(&request.output)?;
        debug!("artifact {} digest {digest}", request.output.display());
        ctx.record_data_file(request.output);
        Ok(digest)
    }

    fn build(
        &self,
        ctx: &StageContext<'_>,
        artifact_digest: String,
    ) -> Result<StageOutcome, CoreError> {
        let candidates = &self.settings.app_dir_candidates;
        let app_dir = first_existing_dir(candidates)
            .map(Path::to_path_buf)
            .ok_or_else(|| CoreError::LocationNotFound {
                candidates: candidates.clone(),
            })?;

        let data_file = ctx
            .data_file()
            .map_or_else(|| ctx.artifact_target(), Path::to_path_buf);
        let env = project(
            self.ambient,
            ctx.config,
            &Artifacts { data_file },
            &self.cwd,
        );
        if self.log.is_debug() {
            for key in [DATA_FILE_KEY, OUTPUT_DIR_KEY] {
                debug!("{key}={}", env.get(key).unwrap_or_default());
            }
        }

        let dev = ctx.config.flag("dev");
        let (program, args) = self
            .settings
            .command(dev)
            .split_first()
            .ok_or_else(|| CoreError::Settings("app build command is empty".to_owned()))?;
        let spec = ProcessSpec::new(program)
            .args(args)
            .env(env.into_map())
            .current_dir(&app_dir)
            .timeout(self.settings.build_timeout);

        info!(
            "{}: {} in {}",
            if dev { "dev server" } else { "build" },
            spec.command_line(),
            app_dir.display()
        );

        let mut warnings = Vec::new();
        let mut timed_out = false;
        match run(&spec) {
            Ok(output) => info!("build finished in {:.1}s", output.elapsed.as_secs_f64()),
            Err(e @ RuntimeError::Timeout { .. }) => {
                warn!("{e}; continuing");
                warnings.push(e.to_string());
                timed_out = true;
            }
            Err(e) => return Err(stage_error(e, CoreError::Build)),
        }

        Ok(StageOutcome {
            warnings,
            artifact_digest,
            app_dir,
            output_dir: self.absolute(ctx.config.text("output").unwrap_or_default()),
            timed_out,
        })
    }

    fn absolute(&self, path: &str) -> PathBuf {
        absolute_path(&self.cwd, Path::new(path))
    }
}

/// blake3 of the artifact. A read failure here is still the extraction
/// stage failing.
fn artifact_digest(path: &Path) -> Result<String, CoreError> {
    let bytes = std::fs::read(path).map_err(|e| CoreError::Extraction(RuntimeError::Io(e)))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn check_shutdown() -> Result<(), CoreError> {
    if shutdown_requested() {
        return Err(CoreError::Interrupted);
    }
    Ok(())
}

/// A collaborator failing because it was signalled is reported as an
/// interruption, not as its own failure.
fn stage_error(err: RuntimeError, wrap: fn(RuntimeError) -> CoreError) -> CoreError {
    if shutdown_requested() {
        debug!("collaborator error after shutdown request: {err}");
        return CoreError::Interrupted;
    }
    wrap(err)
}

struct StageOutcome {
    warnings: Vec<String>,
    artifact_digest: String,
    app_dir: PathBuf,
    output_dir: PathBuf,
    timed_out: bool,
}
