/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template AST types.
//!
//! This module defines the abstract syntax tree for parsed templates.
//! Nodes that can fail at evaluation time carry the line they started on.

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text to be output as-is.
    Text(String),

    /// Pipeline output: `{{.Title}}` or `{{$x := .Body}}`
    Action(Pipeline),

    /// Conditional block: `{{if p}}...{{else}}...{{end}}`
    If(Branch),

    /// Iteration: `{{range $i, $e := p}}...{{else}}...{{end}}`
    Range(Branch),

    /// Rebinding of dot: `{{with p}}...{{else}}...{{end}}`
    With(Branch),

    /// Named template invocation: `{{template "name" p}}`
    Template(TemplateCall),
}

/// Shared shape of `if`, `range` and `with`.
///
/// `else if` and `else with` chains are stored as a single nested node in
/// `else_list`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipeline: Pipeline,
    pub list: Vec<TemplateNode>,
    pub else_list: Option<Vec<TemplateNode>>,
    pub line: usize,
}

/// A named template invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCall {
    pub name: String,
    /// The new dot. Without a pipeline the callee sees `nil`.
    pub pipeline: Option<Pipeline>,
    pub line: usize,
}

/// A sequence of commands joined by `|`, optionally bound to variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Variables declared (`:=`) or assigned (`=`) by this pipeline,
    /// without the leading `$`.
    pub decl: Vec<String>,
    /// True for `=`, which updates an existing variable instead of
    /// declaring a new one.
    pub is_assign: bool,
    pub commands: Vec<Command>,
    pub line: usize,
}

/// One stage of a pipeline: a function call or a single operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Operand>,
}

/// An argument or the head of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`
    Dot,
    /// `.A.B`, field chain applied to dot.
    Field(Vec<String>),
    /// `$x.A.B`, a variable with an optional field chain. `$` is named `""`.
    Variable { name: String, fields: Vec<String> },
    /// A registered function name.
    Function(String),
    /// `(pipeline).A`, a parenthesized pipeline with an optional field chain.
    Pipeline {
        pipeline: Box<Pipeline>,
        fields: Vec<String>,
    },
    String(String),
    Int(i64),
    Bool(bool),
    Nil,
}

/// A parsed template: its name and its top-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub nodes: Vec<TemplateNode>,
}

impl Template {
    /// True when the template produces nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            TemplateNode::Text(text) => text.trim().is_empty(),
            _ => false,
        })
    }
}
