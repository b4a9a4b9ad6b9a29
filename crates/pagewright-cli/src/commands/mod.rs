pub mod action;
pub mod build;
pub mod completions;
pub mod man_pages;
pub mod resolve;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pagewright_core::{LogContext, Verbosity};
use pagewright_schema::{CliInputs, Origin};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_STAGE_ERROR: u8 = 3;

/// Field flags shared by every variant.
#[derive(Debug, Clone, Default, Args)]
pub struct FieldArgs {
    /// Directory of Markdown sources.
    #[arg(long, allow_hyphen_values = true)]
    pub input: Option<String>,
    /// Directory the built site is written to.
    #[arg(long, allow_hyphen_values = true)]
    pub output: Option<String>,
    /// Cache directory handed to the extractor.
    #[arg(long, allow_hyphen_values = true)]
    pub cache: Option<String>,
    /// Site configuration file made available to the app build.
    #[arg(long, allow_hyphen_values = true)]
    pub configuration: Option<String>,
    /// Enable debug logging for every stage.
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl FieldArgs {
    pub fn to_inputs(&self) -> CliInputs {
        CliInputs::new()
            .maybe_value("input", self.input.as_deref())
            .maybe_value("output", self.output.as_deref())
            .maybe_value("cache", self.cache.as_deref())
            .maybe_value("configuration", self.configuration.as_deref())
            .flag("debug", self.debug)
    }
}

/// Install the global subscriber. Only the first call in a process takes
/// effect; `PAGEWRIGHT_LOG` overrides the level chosen from `verbosity`.
pub fn init_logging(verbosity: Verbosity) -> LogContext {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PAGEWRIGHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.to_string())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
    LogContext::new(verbosity)
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✗ {msg}"));
}

fn finish(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

pub fn colorize_origin(origin: Origin) -> String {
    use console::Style;
    let label = origin.to_string();
    match origin {
        Origin::Cli => Style::new().green().apply_to(label).to_string(),
        Origin::Env => Style::new().cyan().apply_to(label).to_string(),
        Origin::File => Style::new().blue().apply_to(label).to_string(),
        Origin::Default => Style::new().dim().apply_to(label).to_string(),
    }
}

pub fn warning(msg: &str) -> String {
    console::Style::new()
        .yellow()
        .apply_to(format!("warning: {msg}"))
        .to_string()
}
