/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for inkpress-core

use std::io;
use std::path::PathBuf;

use inkpress_system_runtime::RuntimeError;
use inkpress_template::TemplateError;
use thiserror::Error;

/// Errors raised while reading or building a template project.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("failed to list template files in {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to parse template {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("failed to apply template {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {tool} in {dir}: {source}")]
    AutobuildRuntime {
        tool: String,
        dir: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error("{tool} failed in {dir} (exit code {code}):\n{output}")]
    Autobuild {
        tool: String,
        dir: PathBuf,
        code: i32,
        output: String,
    },
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the build orchestrator.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("template not found: {reference}")]
    TemplateNotFound { reference: String },

    #[error("{tool} failed in {dir} (exit code {code}):\n{output}")]
    ToolFailed {
        tool: String,
        dir: PathBuf,
        code: i32,
        output: String,
    },

    #[error("failed to run {tool}: {source}")]
    Runtime {
        tool: String,
        #[source]
        source: RuntimeError,
    },

    #[error("no document with id '{id}' in workspace")]
    SubtreeNotFound { id: String },

    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Any failure while applying one rule, tagged with that rule.
    #[error("rule '{id}' with template {template}: {source}")]
    Rule {
        id: String,
        template: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The failure itself, without the rule it happened in.
    pub fn cause(&self) -> &BuildError {
        match self {
            BuildError::Rule { source, .. } => source.cause(),
            other => other,
        }
    }
}

/// Errors raised while loading build configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported input format '{0}' (supported: json)")]
    UnsupportedFormat(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid build configuration {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid build configuration {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

pub type ProjectResult<T> = std::result::Result<T, ProjectError>;
pub type BuildResult<T> = std::result::Result<T, BuildError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
