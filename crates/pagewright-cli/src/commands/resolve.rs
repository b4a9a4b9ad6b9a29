use super::{colorize_origin, init_logging, json_pretty, FieldArgs, EXIT_SUCCESS};
use pagewright_core::{CoreError, Invocation, Verbosity};
use pagewright_schema::{ConfigFile, Environment, Variant};
use std::path::Path;

pub fn run(
    variant: Variant,
    fields: &FieldArgs,
    dev: bool,
    config_file: Option<&Path>,
    ambient: &Environment,
    json: bool,
) -> Result<u8, String> {
    if config_file.is_some() && !variant.accepts_config_file() {
        return Err(format!(
            "configuration error: the {variant} variant does not read a config file"
        ));
    }
    if dev && !variant.fields().iter().any(|f| f.name == "dev") {
        return Err(format!(
            "configuration error: the {variant} variant has no dev flag"
        ));
    }
    let file = config_file
        .map(|path| ConfigFile::load(path, variant))
        .transpose()
        .map_err(|e| CoreError::from(e).to_string())?;

    let mut invocation = Invocation::new();
    let config = invocation
        .resolve(variant, &fields.to_inputs().flag("dev", dev), ambient, file.as_ref())
        .map_err(|e| e.to_string())?;
    init_logging(Verbosity::from(config.flag("debug")));

    if json {
        println!("{}", json_pretty(&config)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("variant: {variant}");
    for (name, resolved) in config.iter() {
        println!(
            "  {name:<14} {:<40} {}",
            format!("'{}'", resolved.value),
            colorize_origin(resolved.origin)
        );
    }
    Ok(EXIT_SUCCESS)
}
