mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::{FieldArgs, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_STAGE_ERROR};
use pagewright_core::install_signal_handler;
use pagewright_schema::{Environment, Variant};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pagewright",
    version,
    about = "Turn a directory of Markdown into a built site"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve inputs from flags and INPUT_* variables, then run `build`.
    Action(FieldArgs),
    /// Extract the sources and run the app build.
    Build {
        #[command(flatten)]
        fields: FieldArgs,
        /// Run the app's development server instead of a production build.
        #[arg(long, default_value_t = false)]
        dev: bool,
        /// TOML file supplying field values below flags and environment.
        #[arg(short = 'c', long = "config-file")]
        config_file: Option<PathBuf>,
    },
    /// Resolve and validate inputs without running any stage.
    Resolve {
        /// Variant whose fields are resolved.
        variant: VariantArg,
        #[command(flatten)]
        fields: FieldArgs,
        #[arg(long, default_value_t = false)]
        dev: bool,
        #[arg(short = 'c', long = "config-file")]
        config_file: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Action,
    Build,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Action => Self::Action,
            VariantArg::Build => Self::Build,
        }
    }
}

/// `println!` panics once the reader of our stdout has gone away
/// (`pagewright resolve build | head -1`); that is a normal way to stop.
fn exit_quietly_on_closed_stdout() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if stdout_was_closed(&info.to_string()) {
            std::process::exit(i32::from(commands::EXIT_SUCCESS));
        }
        previous(info);
    }));
}

fn stdout_was_closed(panic_message: &str) -> bool {
    let lower = panic_message.to_ascii_lowercase();
    lower.contains("failed printing to stdout")
        && (lower.contains("broken pipe") || lower.contains("os error 32"))
}

fn main() -> ExitCode {
    exit_quietly_on_closed_stdout();

    let cli = Cli::parse();
    install_signal_handler();

    let ambient = Environment::from_process();
    match dispatch(cli.command, cli.json, &ambient) {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn dispatch(command: Commands, json: bool, ambient: &Environment) -> Result<u8, String> {
    match command {
        Commands::Action(fields) => {
            let argv = commands::action::run(&fields, ambient)?;
            let forwarded = Cli::try_parse_from(
                std::iter::once("pagewright".to_owned()).chain(argv),
            )
            .map_err(|e| format!("failed to forward to build: {e}"))?;
            dispatch(forwarded.command, json, ambient)
        }
        Commands::Build {
            fields,
            dev,
            config_file,
        } => commands::build::run(&fields, dev, config_file.as_deref(), ambient, json),
        Commands::Resolve {
            variant,
            fields,
            dev,
            config_file,
        } => commands::resolve::run(
            variant.into(),
            &fields,
            dev,
            config_file.as_deref(),
            ambient,
            json,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("configuration error:") || msg.starts_with("invalid settings:") {
        EXIT_CONFIG_ERROR
    } else if msg.starts_with("extraction failed:")
        || msg.starts_with("build failed:")
        || msg.starts_with("app directory not found")
        || msg.starts_with("interrupted")
    {
        EXIT_STAGE_ERROR
    } else {
        EXIT_FAILURE
    }
}
