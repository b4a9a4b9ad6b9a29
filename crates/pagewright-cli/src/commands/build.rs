use super::{
    init_logging, json_pretty, spin_fail, spin_ok, spinner, warning, FieldArgs, EXIT_SUCCESS,
};
use pagewright_core::{CoreError, Invocation, RunnerSettings, StageRunner, Verbosity};
use pagewright_runtime::select_extractor;
use pagewright_schema::{ConfigFile, Environment, Variant};
use std::path::Path;

pub fn run(
    fields: &FieldArgs,
    dev: bool,
    config_file: Option<&Path>,
    ambient: &Environment,
    json: bool,
) -> Result<u8, String> {
    let settings = RunnerSettings::from_env(ambient).map_err(|e| e.to_string())?;
    let file = config_file
        .map(|path| ConfigFile::load(path, Variant::Build))
        .transpose()
        .map_err(|e| CoreError::from(e).to_string())?;

    let mut invocation = Invocation::new();
    let inputs = fields.to_inputs().flag("dev", dev);
    let config = invocation
        .resolve(Variant::Build, &inputs, ambient, file.as_ref())
        .map_err(|e| e.to_string())?;
    let log = init_logging(Verbosity::from(config.flag("debug")));

    let cwd = std::env::current_dir().map_err(|e| format!("I/O error: {e}"))?;
    let extractor = select_extractor(&settings.extractor, ambient.to_map());
    let runner = StageRunner::new(&settings, &*extractor, ambient, cwd, log);

    let pb = if json || log.is_debug() {
        None
    } else {
        Some(spinner("building site..."))
    };
    let report = match runner.run(&mut invocation, &config) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "site built");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for w in &report.warnings {
            eprintln!("{}", warning(w));
        }
        println!("output: {}", report.output_dir.display());
        println!("data digest: {}", report.artifact_digest);
    }
    Ok(EXIT_SUCCESS)
}
