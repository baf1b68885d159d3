//! inkpress CLI - Main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::build::BuildArgs;

/// Render documents of a workspace through template projects.
#[derive(Parser, Debug)]
#[command(name = "inkpress")]
#[command(version = inkpress_util::cli_version())]
#[command(about = "Build documents from a workspace and template projects", long_about = None)]
struct Cli {
    /// The input format type for the file of --in [default: json]
    #[arg(long)]
    format: Option<String>,

    /// The input markup file, as defined by --format
    #[arg(long = "in", value_name = "FILE")]
    input: Option<PathBuf>,

    /// The folder to place the generated files
    #[arg(long = "out", value_name = "DIR")]
    output: Option<PathBuf>,

    /// The id of the subtree to use for generation
    #[arg(long, default_value = "")]
    id: String,

    /// The local folder or remote git repository containing the template
    #[arg(long)]
    template: Option<String>,

    /// The subfolder name in --out to place the generated output
    #[arg(long, default_value = "")]
    name: String,

    /// Build configuration file (default: nearest inkpress.yml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep cloned templates and staging directories here between runs
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Log build steps in detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(commands::build::Stage::InvalidParameters.exit_code());
        }
        Err(e) => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    // Initialize logging
    let default_filter = if cli.verbose { "inkpress=debug" } else { "inkpress=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    tracing::debug!(version = inkpress_util::cli_version(), "inkpress starting");

    let args = BuildArgs {
        format: cli.format,
        input: cli.input,
        output: cli.output,
        id: cli.id,
        template: cli.template,
        name: cli.name,
        config: cli.config,
        cache_dir: cli.cache_dir,
    };

    match commands::build::execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.stage.exit_code())
        }
    }
}
