/*
 * project.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Template projects: a directory of templates and assets rendered
 * against a document model into a staging directory.
 */

//! Template project reading and building.
//!
//! A template project is a plain directory. Files ending in `.gohtml` are
//! HTML-flavor templates, files ending in `.tmpl` are text-flavor templates,
//! and everything else is copied. The staged file name drops the template
//! suffix, so `main.tex.tmpl` stages as `main.tex`.
//!
//! After all files are staged, an optional [`AutobuildHook`] runs an external
//! tool when a marker file is present in the staging directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inkpress_system_runtime::SystemRuntime;
use inkpress_template::{Flavor, TemplateSet};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ProjectError, ProjectResult};
use crate::functions::register_domain_functions;
use crate::model_value::ToTemplateValue;
use crate::transform::{CopyTransform, FileTransform, TemplateTransform, TransformKind};

/// Suffix of HTML-flavor templates.
pub const HTML_TEMPLATE_SUFFIX: &str = ".gohtml";

/// Suffix of text-flavor templates.
pub const TEXT_TEMPLATE_SUFFIX: &str = ".tmpl";

/// Post-render step triggered by a marker file in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutobuildHook {
    /// File name whose presence in the staging root triggers the hook
    pub marker: String,
    /// Program to run, with the staging directory as working directory
    pub tool: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Extension (without dot) of the top-level files reported as artifacts
    pub artifact_extension: String,
}

impl Default for AutobuildHook {
    fn default() -> Self {
        Self {
            marker: "latexmkrc".to_string(),
            tool: "latexmk".to_string(),
            args: Vec::new(),
            artifact_extension: "pdf".to_string(),
        }
    }
}

/// One file of a template project.
pub struct FileDescriptor {
    /// Directory of the source file, relative to the project root
    relative_dir: PathBuf,
    /// File name in the staging directory
    destination: String,
    transform: Box<dyn FileTransform>,
}

impl FileDescriptor {
    pub fn source(&self) -> &Path {
        self.transform.source()
    }

    pub fn relative_dir(&self) -> &Path {
        &self.relative_dir
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn kind(&self) -> TransformKind {
        self.transform.kind()
    }

    /// Where this file is written inside `staging_dir`.
    pub fn staged_path(&self, staging_dir: &Path) -> PathBuf {
        staging_dir.join(&self.relative_dir).join(&self.destination)
    }
}

impl std::fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("source", &self.source())
            .field("relative_dir", &self.relative_dir)
            .field("destination", &self.destination)
            .field("kind", &self.kind())
            .finish()
    }
}

/// A parsed template directory ready to render.
#[derive(Debug)]
pub struct TemplateProject {
    source_dir: PathBuf,
    staging_dir: PathBuf,
    files: Vec<FileDescriptor>,
    autobuild: Option<AutobuildHook>,
}

/// Pending file, before the template sets are frozen.
struct ScannedFile {
    source: PathBuf,
    relative_dir: PathBuf,
    destination: String,
    template: Option<(Flavor, String)>,
}

impl TemplateProject {
    /// Read a template project from `source_dir`.
    ///
    /// Files are visited in file-name order. Hidden directories and
    /// `.DS_Store` files are skipped, as is `staging_dir` when it lies inside
    /// the source tree. Templates are parsed immediately, so a syntax error
    /// fails here, naming the file.
    pub fn read(source_dir: impl AsRef<Path>, staging_dir: impl AsRef<Path>) -> ProjectResult<Self> {
        let source_dir = source_dir.as_ref().to_path_buf();
        let staging_dir = staging_dir.as_ref().to_path_buf();
        let staging_canonical = fs::canonicalize(&staging_dir).ok();

        let mut html = TemplateSet::new(Flavor::Html);
        let mut text = TemplateSet::new(Flavor::Text);
        register_domain_functions(&mut text);

        let mut scanned = Vec::new();
        let walker = WalkDir::new(&source_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(e, &staging_dir, staging_canonical.as_deref()));

        for entry in walker {
            let entry = entry.map_err(|source| ProjectError::Walk {
                path: source_dir.clone(),
                source,
            })?;
            if entry.file_type().is_dir() || entry.file_name() == ".DS_Store" {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&source_dir).unwrap_or(path);
            let relative_dir = relative.parent().map(Path::to_path_buf).unwrap_or_default();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            let (destination, flavor) = match split_template_suffix(&file_name) {
                Some((stem, flavor)) => (stem.to_string(), Some(flavor)),
                None => (file_name.clone(), None),
            };

            let template = match flavor {
                Some(flavor) => {
                    let name = template_name(relative);
                    let source =
                        fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
                    let set = match flavor {
                        Flavor::Html => &mut html,
                        Flavor::Text => &mut text,
                    };
                    set.parse(&name, &source).map_err(|source| ProjectError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                    Some((flavor, name))
                }
                None => None,
            };

            debug!(file = %relative.display(), destination = %destination, "scanned template file");
            scanned.push(ScannedFile {
                source: path.to_path_buf(),
                relative_dir,
                destination,
                template,
            });
        }

        let html = Arc::new(html);
        let text = Arc::new(text);
        let files = scanned
            .into_iter()
            .map(|file| {
                let transform: Box<dyn FileTransform> = match file.template {
                    Some((Flavor::Html, name)) => {
                        Box::new(TemplateTransform::new(Arc::clone(&html), name, &file.source))
                    }
                    Some((Flavor::Text, name)) => {
                        Box::new(TemplateTransform::new(Arc::clone(&text), name, &file.source))
                    }
                    None => Box::new(CopyTransform::new(&file.source)),
                };
                FileDescriptor {
                    relative_dir: file.relative_dir,
                    destination: file.destination,
                    transform,
                }
            })
            .collect();

        Ok(Self {
            source_dir,
            staging_dir,
            files,
            autobuild: Some(AutobuildHook::default()),
        })
    }

    /// Replace the autobuild hook, or disable it with `None`.
    pub fn with_autobuild(mut self, hook: Option<AutobuildHook>) -> Self {
        self.autobuild = hook;
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Files in walk order.
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn autobuild(&self) -> Option<&AutobuildHook> {
        self.autobuild.as_ref()
    }

    /// Render every file against `model` into a fresh staging directory.
    ///
    /// Returns the artifacts: the autobuild outputs if the hook fired,
    /// otherwise every top-level entry of the staging directory.
    pub fn build<M>(&self, model: &M, runtime: &dyn SystemRuntime) -> ProjectResult<Vec<PathBuf>>
    where
        M: ToTemplateValue + ?Sized,
    {
        let staging = &self.staging_dir;
        if staging.exists() {
            fs::remove_dir_all(staging).map_err(|e| ProjectError::io(staging, e))?;
        }
        fs::create_dir_all(staging).map_err(|e| ProjectError::io(staging, e))?;

        let model = model.to_template_value();
        for file in &self.files {
            let dest = file.staged_path(staging);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ProjectError::io(parent, e))?;
            }
            debug!(source = %file.source().display(), dest = %dest.display(), kind = ?file.kind(), "applying file");

            let out = File::create(&dest).map_err(|e| ProjectError::io(&dest, e))?;
            let mut out = BufWriter::new(out);
            file.transform.transform(&model, &mut out)?;
            out.flush().map_err(|e| ProjectError::io(&dest, e))?;
        }

        self.run_autobuild(runtime)
    }

    fn run_autobuild(&self, runtime: &dyn SystemRuntime) -> ProjectResult<Vec<PathBuf>> {
        let staging = &self.staging_dir;
        let Some(hook) = self
            .autobuild
            .as_ref()
            .filter(|hook| staging.join(&hook.marker).exists())
        else {
            debug!(dir = %staging.display(), "no autobuild marker");
            return list_root_entries(staging);
        };

        info!(tool = %hook.tool, dir = %staging.display(), runtime = runtime.name(), "running autobuild");
        let args: Vec<&str> = hook.args.iter().map(String::as_str).collect();
        let output = runtime
            .exec_command(&hook.tool, &args, Some(staging))
            .map_err(|source| ProjectError::AutobuildRuntime {
                tool: hook.tool.clone(),
                dir: staging.clone(),
                source,
            })?;
        debug!(output = %output.combined_output(), "autobuild output");

        if !output.success() {
            return Err(ProjectError::Autobuild {
                tool: hook.tool.clone(),
                dir: staging.clone(),
                code: output.code,
                output: output.combined_output(),
            });
        }

        let artifacts = list_root_entries(staging)?
            .into_iter()
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == hook.artifact_extension.as_str())
            })
            .collect();
        Ok(artifacts)
    }
}

/// Split a recognized template suffix (case-insensitive) off a file name.
///
/// A name that is nothing but the suffix is not a template.
fn split_template_suffix(file_name: &str) -> Option<(&str, Flavor)> {
    [
        (HTML_TEMPLATE_SUFFIX, Flavor::Html),
        (TEXT_TEMPLATE_SUFFIX, Flavor::Text),
    ]
    .into_iter()
    .find_map(|(suffix, flavor)| {
        let split = file_name.len().checked_sub(suffix.len()).filter(|&n| n > 0)?;
        let tail = file_name.get(split..)?;
        tail.eq_ignore_ascii_case(suffix)
            .then(|| (&file_name[..split], flavor))
    })
}

/// Template key: the project-relative path with `/` separators.
fn template_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_skipped(entry: &DirEntry, staging: &Path, staging_canonical: Option<&Path>) -> bool {
    // Never filter the root directory
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    entry.path() == staging
        || staging_canonical
            .is_some_and(|s| fs::canonicalize(entry.path()).is_ok_and(|p| p == s))
}

/// Top-level entries of `dir`, sorted by name.
fn list_root_entries(dir: &Path) -> ProjectResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| ProjectError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ProjectError::io(dir, e))?;
    entries.sort();
    Ok(entries)
}
