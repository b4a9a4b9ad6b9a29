use super::{init_logging, FieldArgs};
use pagewright_core::{Invocation, Verbosity};
use pagewright_schema::{Environment, ResolvedConfig, Variant};
use tracing::info;

/// Resolve the action inputs and return the argv that re-enters the CLI as
/// `build`.
pub fn run(fields: &FieldArgs, ambient: &Environment) -> Result<Vec<String>, String> {
    let mut invocation = Invocation::new();
    let config = invocation
        .resolve(Variant::Action, &fields.to_inputs(), ambient, None)
        .map_err(|e| e.to_string())?;
    init_logging(Verbosity::from(config.flag("debug")));

    let argv = forward_args(&config);
    info!("running: pagewright {}", argv.join(" "));
    Ok(argv)
}

/// `build [--cache c] [--configuration f] [--debug] --input i --output o`,
/// with blank optional values left out.
pub fn forward_args(config: &ResolvedConfig) -> Vec<String> {
    let mut argv = vec!["build".to_owned()];
    for field in ["cache", "configuration"] {
        if let Some(value) = config.non_blank(field) {
            argv.push(format!("--{field}"));
            argv.push(value.to_owned());
        }
    }
    if config.flag("debug") {
        argv.push("--debug".to_owned());
    }
    for field in ["input", "output"] {
        argv.push(format!("--{field}"));
        argv.push(config.text(field).unwrap_or_default().to_owned());
    }
    argv
}
