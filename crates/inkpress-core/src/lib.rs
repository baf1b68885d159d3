/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Core build infrastructure for inkpress
//!
//! This crate turns a document model into output folders by running it
//! through template projects.
//!
//! # Architecture
//!
//! - [`TemplateProject`] - A template directory parsed and ready to render
//! - [`FileTransform`] - How one project file becomes staged output
//! - [`ToTemplateValue`] - Conversion of model nodes to template values
//! - [`Build`] - Ordered [`BuildRule`]s applied to a workspace
//! - [`BuildConfig`] - The `inkpress.yml` build configuration
//!
//! # Example
//!
//! ```ignore
//! use inkpress_core::{Build, BuildRule};
//! use inkpress_model::unmarshal_file;
//!
//! let workspace = unmarshal_file("workspace.json")?;
//! let mut build = Build::new(workspace, "dist")?;
//! build.add_rule(BuildRule::new("manual", "./templates/book", "manual"));
//! build.apply()?;
//! ```

pub mod build;
pub mod cache;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod functions;
pub mod model_value;
pub mod project;
pub mod provision;
pub mod transform;

// Re-export commonly used types
pub use build::{Build, BuildRule};
pub use cache::{CacheLayout, CacheLock, content_hash};
pub use config::{BuildConfig, InputFormat};
pub use error::{BuildError, BuildResult, ConfigError, ConfigResult, ProjectError, ProjectResult};
pub use functions::{escape_latex, register_domain_functions};
pub use model_value::ToTemplateValue;
pub use project::{AutobuildHook, FileDescriptor, TemplateProject};
pub use provision::{ProvisionedTemplate, Provisioner, TemplateSource};
pub use transform::{CopyTransform, FileTransform, TemplateTransform, TransformKind};
