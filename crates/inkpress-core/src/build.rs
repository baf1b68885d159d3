/*
 * build.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build orchestration: rules mapping document subtrees through template
 * projects into output folders.
 */

//! Build orchestration.
//!
//! A [`Build`] owns a workspace and an ordered list of [`BuildRule`]s. Each
//! rule selects a document by id, renders it through a template project and
//! copies the resulting artifacts into `<output_dir>/<rule name>`.
//!
//! # Example
//!
//! ```ignore
//! use inkpress_core::{Build, BuildRule};
//!
//! let mut build = Build::new(workspace, "dist")?;
//! build.add_rule(BuildRule::new("manual", "https://github.com/acme/latex-book.git", "manual"));
//! build.apply()?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inkpress_model::Workspace;
use inkpress_system_runtime::{NativeRuntime, SystemRuntime};
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::cache::{CacheLayout, CacheLock};
use crate::error::{BuildError, BuildResult};
use crate::fsutil::copy_into;
use crate::project::TemplateProject;
use crate::provision::Provisioner;

/// One subtree rendered through one template into one output folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildRule {
    /// Id of the document to render
    pub id: String,
    /// Template reference: a local directory or an http(s) git URL
    pub template: String,
    /// Name of the folder below the output directory
    pub name: String,
}

impl BuildRule {
    pub fn new(id: impl Into<String>, template: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template: template.into(),
            name: name.into(),
        }
    }
}

/// Scratch space for cloned templates and staging directories.
#[derive(Debug)]
enum Scratch {
    /// Process-private, removed on drop
    Temporary(TempDir),
    /// Caller-chosen, survives the build
    Persistent(PathBuf),
}

impl Scratch {
    fn path(&self) -> &Path {
        match self {
            Scratch::Temporary(dir) => dir.path(),
            Scratch::Persistent(path) => path,
        }
    }
}

/// A workspace together with the rules to build from it.
pub struct Build {
    workspace: Workspace,
    output_dir: PathBuf,
    rules: Vec<BuildRule>,
    scratch: Scratch,
    runtime: Arc<dyn SystemRuntime>,
}

impl Build {
    /// Create a build with a fresh temporary scratch directory.
    pub fn new(workspace: Workspace, output_dir: impl Into<PathBuf>) -> BuildResult<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("inkpress")
            .tempdir()
            .map_err(|e| BuildError::io(std::env::temp_dir(), e))?;
        debug!(scratch = %scratch.path().display(), "created scratch directory");
        Ok(Self::from_parts(workspace, output_dir.into(), Scratch::Temporary(scratch)))
    }

    /// Create a build that keeps its clones and staging directories in
    /// `scratch_dir`, so later builds can reuse them.
    pub fn with_scratch_dir(
        workspace: Workspace,
        output_dir: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::from_parts(
            workspace,
            output_dir.into(),
            Scratch::Persistent(scratch_dir.into()),
        )
    }

    fn from_parts(workspace: Workspace, output_dir: PathBuf, scratch: Scratch) -> Self {
        Self {
            workspace,
            output_dir,
            rules: Vec::new(),
            scratch,
            runtime: Arc::new(NativeRuntime::new()),
        }
    }

    /// Run external tools through `runtime` instead of the native one.
    pub fn with_runtime(mut self, runtime: Arc<dyn SystemRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Append a rule. Rules are applied in the order they were added.
    pub fn add_rule(&mut self, rule: BuildRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[BuildRule] {
        &self.rules
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Apply every rule in order, stopping at the first failure.
    ///
    /// Returns the output folder of each rule. Errors are
    /// [`BuildError::Rule`], naming the rule that failed.
    pub fn apply(&self) -> BuildResult<Vec<PathBuf>> {
        let layout = CacheLayout::new(self.scratch.path());
        let provisioner = Provisioner::new(&layout, self.runtime.as_ref());

        let mut outputs = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let output = self
                .apply_rule(rule, &layout, &provisioner)
                .map_err(|source| BuildError::Rule {
                    id: rule.id.clone(),
                    template: rule.template.clone(),
                    source: Box::new(source),
                })?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    fn apply_rule(
        &self,
        rule: &BuildRule,
        layout: &CacheLayout,
        provisioner: &Provisioner<'_>,
    ) -> BuildResult<PathBuf> {
        info!(id = %rule.id, template = %rule.template, name = %rule.name, "Applying build rule");

        // Held until the artifacts have been copied out.
        let staging = layout.transform_dir(&rule.id, &rule.template);
        let _staging_lock =
            CacheLock::acquire(&staging).map_err(|e| BuildError::io(&staging, e))?;

        let template = provisioner.provision(&rule.template)?;
        let root = self
            .workspace
            .by_id(&rule.id)
            .ok_or_else(|| BuildError::SubtreeNotFound {
                id: rule.id.clone(),
            })?;

        let project = TemplateProject::read(template.dir(), &staging)?;
        let artifacts = project.build(root, self.runtime.as_ref())?;

        let target = self.output_dir.join(&rule.name);
        fs::create_dir_all(&target).map_err(|e| BuildError::io(&target, e))?;
        for artifact in &artifacts {
            debug!(artifact = %artifact.display(), target = %target.display(), "copying artifact");
            copy_into(artifact, &target).map_err(|e| BuildError::io(artifact, e))?;
        }
        info!(name = %rule.name, artifacts = artifacts.len(), "Build rule finished");
        Ok(target)
    }
}

impl std::fmt::Debug for Build {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Build")
            .field("workspace", &self.workspace.title)
            .field("output_dir", &self.output_dir)
            .field("rules", &self.rules)
            .field("scratch", &self.scratch)
            .field("runtime", &self.runtime.name())
            .finish()
    }
}
