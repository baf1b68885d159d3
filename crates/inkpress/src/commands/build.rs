/*
 * build.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build command implementation
 */

//! Build command implementation.
//!
//! Rules come either from the command line (`--in` with `--template`, one
//! rule) or from a build configuration file, given with `--config` or found
//! by searching the current directory and its parents for `inkpress.yml`.
//! Command-line `--format`, `--out` and `--cache-dir` override the
//! configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info};

use inkpress_core::{Build, BuildConfig, BuildRule, InputFormat};

/// Arguments for the build command
#[derive(Debug, Default)]
pub struct BuildArgs {
    pub format: Option<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub id: String,
    pub template: Option<String>,
    pub name: String,
    pub config: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// Stage at which the command failed. Each maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InvalidParameters,
    Format,
    Parse,
    Setup,
    Apply,
}

impl Stage {
    pub fn exit_code(self) -> u8 {
        match self {
            Stage::Format => 1,
            Stage::Parse => 2,
            Stage::Setup => 3,
            Stage::Apply => 4,
            Stage::InvalidParameters => 5,
        }
    }
}

/// A failure together with the stage it happened in.
#[derive(Debug)]
pub struct CommandError {
    pub stage: Stage,
    pub error: anyhow::Error,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, CommandError>;
}

impl<T, E: Into<anyhow::Error>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, CommandError> {
        self.map_err(|e| CommandError {
            stage,
            error: e.into(),
        })
    }
}

/// Everything needed to run a build, however it was specified.
#[derive(Debug, PartialEq, Eq)]
struct Plan {
    format: InputFormat,
    input: PathBuf,
    output: PathBuf,
    cache_dir: Option<PathBuf>,
    rules: Vec<BuildRule>,
}

/// Execute the build command
pub fn execute(args: BuildArgs) -> Result<(), CommandError> {
    let cwd = std::env::current_dir()
        .context("Failed to get current directory")
        .at(Stage::InvalidParameters)?;
    let plan = plan(args, &cwd)?;
    debug!(?plan, "build plan");

    let workspace = plan
        .format
        .load(&plan.input)
        .with_context(|| format!("cannot parse markup of '{}'", plan.input.display()))
        .at(Stage::Parse)?;
    info!(title = %workspace.title, input = %plan.input.display(), "Loaded workspace");

    let mut build = match plan.cache_dir {
        Some(dir) => Build::with_scratch_dir(workspace, plan.output, dir),
        None => Build::new(workspace, plan.output)
            .context("cannot create build")
            .at(Stage::Setup)?,
    };
    for rule in plan.rules {
        build.add_rule(rule);
    }

    let outputs = build
        .apply()
        .context("cannot apply build transformation")
        .at(Stage::Apply)?;
    for output in &outputs {
        info!("Wrote {}", output.display());
    }
    Ok(())
}

fn plan(args: BuildArgs, cwd: &Path) -> Result<Plan, CommandError> {
    match (args.input, args.template) {
        (Some(input), Some(template)) => Ok(Plan {
            format: parse_format(args.format.as_deref())?.unwrap_or(InputFormat::Json),
            input,
            output: args.output.unwrap_or_else(|| PathBuf::from(".")),
            cache_dir: args.cache_dir,
            rules: vec![BuildRule::new(args.id, template, args.name)],
        }),
        (None, None) => {
            let path = args
                .config
                .or_else(|| BuildConfig::discover(cwd))
                .ok_or_else(|| {
                    anyhow!("either --in and --template or a build configuration file are required")
                })
                .at(Stage::InvalidParameters)?;
            let config = BuildConfig::load(&path).at(Stage::InvalidParameters)?;
            Ok(Plan {
                format: parse_format(args.format.as_deref())?.unwrap_or(config.format),
                input: config.input,
                output: args.output.unwrap_or(config.output),
                cache_dir: args.cache_dir.or(config.cache_dir),
                rules: config.rules,
            })
        }
        (Some(_), None) => {
            Err(anyhow!("--in requires --template")).at(Stage::InvalidParameters)
        }
        (None, Some(_)) => {
            Err(anyhow!("--template requires --in")).at(Stage::InvalidParameters)
        }
    }
}

fn parse_format(format: Option<&str>) -> Result<Option<InputFormat>, CommandError> {
    format.map(str::parse::<InputFormat>).transpose().at(Stage::Format)
}
