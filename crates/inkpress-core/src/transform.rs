/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Per-file transforms of a template project.
 */

//! Per-file transforms of a template project.
//!
//! Each file of a template project is paired with a [`FileTransform`] that
//! turns the model into the file's staged content:
//!
//! - [`TemplateTransform`] renders a parsed template (text or HTML flavor)
//! - [`CopyTransform`] streams the source bytes through unchanged

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inkpress_template::{Flavor, TemplateSet, TemplateValue};

use crate::error::{ProjectError, ProjectResult};

/// How a project file is turned into staged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Rendered as an HTML-flavor template.
    Html,
    /// Rendered as a text-flavor template.
    Text,
    /// Copied byte for byte.
    Copy,
}

/// Trait for file transforms.
///
/// Given the model and an output sink, a transform writes the file's content
/// or fails with an error naming the offending source file.
pub trait FileTransform: Send + Sync {
    /// The kind of transform, for logging and inspection.
    fn kind(&self) -> TransformKind;

    /// Source file this transform reads.
    fn source(&self) -> &Path;

    /// Write the transformed content.
    fn transform(&self, model: &TemplateValue, out: &mut dyn Write) -> ProjectResult<()>;
}

/// Renders one template out of a shared [`TemplateSet`].
pub struct TemplateTransform {
    set: Arc<TemplateSet>,
    name: String,
    source: PathBuf,
}

impl TemplateTransform {
    /// `name` is the key the file's template was parsed under in `set`.
    pub fn new(set: Arc<TemplateSet>, name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            set,
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FileTransform for TemplateTransform {
    fn kind(&self) -> TransformKind {
        match self.set.flavor() {
            Flavor::Html => TransformKind::Html,
            Flavor::Text => TransformKind::Text,
        }
    }

    fn source(&self) -> &Path {
        &self.source
    }

    fn transform(&self, model: &TemplateValue, out: &mut dyn Write) -> ProjectResult<()> {
        self.set
            .render_to(&self.name, model, out)
            .map_err(|source| ProjectError::Render {
                path: self.source.clone(),
                source,
            })
    }
}

/// Pipes an existing file through.
pub struct CopyTransform {
    source: PathBuf,
}

impl CopyTransform {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl FileTransform for CopyTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::Copy
    }

    fn source(&self) -> &Path {
        &self.source
    }

    fn transform(&self, _model: &TemplateValue, out: &mut dyn Write) -> ProjectResult<()> {
        let mut input = File::open(&self.source).map_err(|e| ProjectError::io(&self.source, e))?;
        io::copy(&mut input, out).map_err(|e| ProjectError::io(&self.source, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_transform_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("logo.png");
        let bytes: Vec<u8> = (0..=255u8).collect();
        std::fs::write(&src, &bytes).unwrap();

        let transform = CopyTransform::new(&src);
        let mut out = Vec::new();
        transform.transform(&TemplateValue::Null, &mut out).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(transform.kind(), TransformKind::Copy);
    }

    #[test]
    fn test_copy_transform_missing_source() {
        let transform = CopyTransform::new("/nonexistent/inkpress/file.bin");
        let err = transform
            .transform(&TemplateValue::Null, &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("file.bin"));
    }

    #[test]
    fn test_template_transform_names_file_on_error() {
        let mut set = TemplateSet::new(Flavor::Html);
        set.parse("page.gohtml", "{{.Title.Inner}}").unwrap();
        let transform = TemplateTransform::new(Arc::new(set), "page.gohtml", "/tpl/page.gohtml");
        assert_eq!(transform.kind(), TransformKind::Html);

        let data = TemplateValue::map([("Title", TemplateValue::from("x"))]);
        let err = transform.transform(&data, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ProjectError::Render { .. }));
        assert!(err.to_string().contains("/tpl/page.gohtml"));
    }

    #[test]
    fn test_template_transform_escapes_html() {
        let mut set = TemplateSet::new(Flavor::Html);
        set.parse("page.gohtml", "<h1>{{.Title}}</h1>").unwrap();
        let transform = TemplateTransform::new(Arc::new(set), "page.gohtml", "page.gohtml");

        let data = TemplateValue::map([("Title", TemplateValue::from("A & B"))]);
        let mut out = Vec::new();
        transform.transform(&data, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<h1>A &amp; B</h1>");
    }
}
