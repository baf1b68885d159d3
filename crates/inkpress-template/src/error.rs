/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and evaluation.

use thiserror::Error;

/// Errors that can occur during template operations.
///
/// Parse and evaluation errors name the template and the 1-based line of
/// the offending action.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Error parsing the template syntax.
    #[error("{name}:{line}: parse error: {message}")]
    ParseError {
        name: String,
        line: usize,
        message: String,
    },

    /// Error evaluating the template.
    #[error("{name}:{line}: evaluation error: {message}")]
    EvaluationError {
        name: String,
        line: usize,
        message: String,
    },

    /// `{{template "x"}}` or a render call named an unknown template.
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    /// Template inclusion nested deeper than the evaluator allows.
    #[error("template inclusion exceeds depth {max_depth}: {name}")]
    RecursiveTemplate { name: String, max_depth: usize },

    /// I/O error while writing rendered output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
