/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for encoding and decoding workspaces.

use std::path::PathBuf;

use thiserror::Error;

use crate::kind::NodeKind;

/// Errors that can occur while decoding a serialized workspace.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The markup file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A decoded markup file failed to decode.
    #[error("cannot parse {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<CodecError>,
    },

    /// The `type` attribute names no registered node kind.
    #[error("unknown node type '{discriminator}'")]
    UnknownVariant { discriminator: String },

    /// An object has no `type` attribute at all.
    #[error("object has no '{key}' attribute")]
    MissingDiscriminator { key: &'static str },

    /// A registered node kind appeared where another one was required.
    #[error("expected node of type '{expected}', found '{found}'")]
    UnexpectedVariant { expected: NodeKind, found: NodeKind },

    /// An attribute has the wrong JSON shape.
    #[error("invalid '{key}' attribute: {message}")]
    InvalidAttribute { key: String, message: String },
}

impl CodecError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        CodecError::InvalidAttribute {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
