/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template engine for inkpress template projects.
//!
//! Templates use `{{ }}` actions over a data value called dot:
//!
//! - Output: `{{.Title}}`, `{{$x.Field}}`, `{{$}}`
//! - Pipelines: `{{.Title | print "x" | len}}`
//! - Conditionals: `{{if p}}...{{else if p}}...{{else}}...{{end}}`
//! - Iteration: `{{range $i, $e := .Body}}...{{else}}...{{end}}`
//! - Scoping: `{{with .Author}}...{{end}}`
//! - Variables: `{{$x := p}}`, `{{$x = p}}`
//! - Named templates: `{{define "n"}}...{{end}}`, `{{template "n" .}}`
//! - Trim markers and comments: `{{- ... -}}`, `{{/* ... */}}`
//!
//! # Architecture
//!
//! The engine is **independent of the document model**. It defines its own
//! [`TemplateValue`]; conversion from model nodes happens in the build layer.
//! A [`TemplateSet`] holds every template of one [`Flavor`] together with
//! the functions they may call.
//!
//! # Example
//!
//! ```
//! use inkpress_template::{Flavor, TemplateSet, TemplateValue};
//!
//! let mut set = TemplateSet::new(Flavor::Text);
//! set.parse("hello", "Hello, {{.Name}}!").unwrap();
//!
//! let data = TemplateValue::map([("Name", TemplateValue::from("World"))]);
//! assert_eq!(set.render("hello", &data).unwrap(), "Hello, World!");
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod set;

// Re-export main types at crate root
pub use ast::{Branch, Command, Operand, Pipeline, Template, TemplateCall, TemplateNode};
pub use context::{Scope, TemplateValue};
pub use error::{TemplateError, TemplateResult};
pub use evaluator::MAX_TEMPLATE_DEPTH;
pub use parser::MAX_NESTING_DEPTH;
pub use functions::{FunctionRegistry, TemplateFunction, html_escape};
pub use set::{Flavor, TemplateSet};
