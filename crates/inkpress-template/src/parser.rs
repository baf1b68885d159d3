/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parser.
//!
//! This module turns the segments produced by the lexer into the template
//! AST. Function names are resolved against a [`FunctionRegistry`] and
//! variables against the declarations in scope, so both kinds of mistakes
//! are reported before any data is rendered.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::ast::{Branch, Command, Operand, Pipeline, Template, TemplateCall, TemplateNode};
use crate::error::{TemplateError, TemplateResult};
use crate::functions::FunctionRegistry;
use crate::lexer::{Segment, Token, split};

type Tokens = Peekable<IntoIter<Token>>;

/// Maximum nesting of parenthesized pipelines and control blocks.
pub const MAX_NESTING_DEPTH: usize = 100;

/// How a list of nodes ended.
enum Terminator {
    Eof,
    End { line: usize },
    Else { tokens: Vec<Token>, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BranchKind {
    If,
    Range,
    With,
}

impl BranchKind {
    fn keyword(self) -> &'static str {
        match self {
            BranchKind::If => "if",
            BranchKind::Range => "range",
            BranchKind::With => "with",
        }
    }

    fn wrap(self, branch: Branch) -> TemplateNode {
        match self {
            BranchKind::If => TemplateNode::If(branch),
            BranchKind::Range => TemplateNode::Range(branch),
            BranchKind::With => TemplateNode::With(branch),
        }
    }
}

/// Parse a template source.
///
/// Returns the template itself, named `name`, followed by every template
/// declared with `define` or `block`, in source order.
pub fn parse(
    name: &str,
    source: &str,
    functions: &FunctionRegistry,
) -> TemplateResult<Vec<Template>> {
    let segments = split(name, source)?;
    let mut parser = Parser {
        name,
        segments: segments.into_iter(),
        functions,
        defines: Vec::new(),
        vars: Vec::new(),
        depth: 0,
    };
    let (nodes, end) = parser.parse_list(true)?;
    match end {
        Terminator::Eof => {}
        Terminator::End { line } => return Err(parser.error(line, "unexpected {{end}}")),
        Terminator::Else { line, .. } => return Err(parser.error(line, "unexpected {{else}}")),
    }
    let mut templates = vec![Template {
        name: name.to_string(),
        nodes,
    }];
    templates.append(&mut parser.defines);
    Ok(templates)
}

struct Parser<'a> {
    name: &'a str,
    segments: IntoIter<Segment>,
    functions: &'a FunctionRegistry,
    defines: Vec<Template>,
    /// Variables declared in the enclosing scopes, without `$`.
    vars: Vec<String>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::ParseError {
            name: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    fn nested<T>(
        &mut self,
        line: usize,
        parse: impl FnOnce(&mut Self) -> TemplateResult<T>,
    ) -> TemplateResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(
                line,
                format!("nesting exceeds maximum depth {}", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn is_defined(&self, var: &str) -> bool {
        var.is_empty() || self.vars.iter().any(|v| v == var)
    }

    fn parse_list(&mut self, top_level: bool) -> TemplateResult<(Vec<TemplateNode>, Terminator)> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            let (tokens, line) = match segment {
                Segment::Text(text) => {
                    nodes.push(TemplateNode::Text(text));
                    continue;
                }
                Segment::Action { tokens, line } => (tokens, line),
            };
            let mut stream: Tokens = tokens.into_iter().peekable();
            skip_space(&mut stream);
            let keyword = match stream.peek() {
                Some(Token::Identifier(k)) => Some(k.clone()),
                _ => None,
            };
            match keyword.as_deref() {
                Some("end") => {
                    stream.next();
                    self.expect_empty(&mut stream, line, "end")?;
                    return Ok((nodes, Terminator::End { line }));
                }
                Some("else") => {
                    stream.next();
                    let tokens = stream.collect();
                    return Ok((nodes, Terminator::Else { tokens, line }));
                }
                Some("if" | "range" | "with") => {
                    let kind = match keyword.as_deref() {
                        Some("if") => BranchKind::If,
                        Some("range") => BranchKind::Range,
                        _ => BranchKind::With,
                    };
                    stream.next();
                    let tokens: Vec<Token> = stream.collect();
                    let branch = self.nested(line, |p| p.parse_branch(kind, tokens, line))?;
                    nodes.push(kind.wrap(branch));
                }
                Some("define") => {
                    if !top_level {
                        return Err(self.error(line, "unexpected {{define}}"));
                    }
                    stream.next();
                    let name = self.template_name(&mut stream, line, "define")?;
                    self.expect_empty(&mut stream, line, "define")?;
                    self.parse_definition(name, line)?;
                }
                Some("template") => {
                    stream.next();
                    let call = self.parse_template_call(stream, line)?;
                    nodes.push(TemplateNode::Template(call));
                }
                Some("block") => {
                    stream.next();
                    let call = self.parse_template_call(stream, line)?;
                    self.parse_definition(call.name.clone(), line)?;
                    nodes.push(TemplateNode::Template(call));
                }
                _ => {
                    let pipeline = self.parse_pipeline(stream.collect(), line, 1, "command")?;
                    nodes.push(TemplateNode::Action(pipeline));
                }
            }
        }
        Ok((nodes, Terminator::Eof))
    }

    fn expect_empty(&self, stream: &mut Tokens, line: usize, context: &str) -> TemplateResult<()> {
        skip_space(stream);
        match stream.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(
                line,
                format!("unexpected {:?} in {}", token, context),
            )),
        }
    }

    fn template_name(&self, stream: &mut Tokens, line: usize, context: &str) -> TemplateResult<String> {
        skip_space(stream);
        match stream.next() {
            Some(Token::Str(name)) => Ok(name),
            _ => Err(self.error(line, format!("{} requires a quoted template name", context))),
        }
    }

    /// Parse the body of a `define` or `block` up to its `end`.
    fn parse_definition(&mut self, name: String, line: usize) -> TemplateResult<()> {
        let saved = std::mem::take(&mut self.vars);
        let (nodes, end) = self.parse_list(false)?;
        self.vars = saved;
        match end {
            Terminator::End { .. } => {}
            Terminator::Else { line, .. } => {
                return Err(self.error(line, format!("unexpected {{{{else}}}} in {:?}", name)));
            }
            Terminator::Eof => {
                return Err(self.error(line, format!("unexpected EOF in definition of {:?}", name)));
            }
        }
        self.defines.push(Template { name, nodes });
        Ok(())
    }

    fn parse_template_call(&mut self, mut stream: Tokens, line: usize) -> TemplateResult<TemplateCall> {
        let name = self.template_name(&mut stream, line, "template")?;
        skip_space(&mut stream);
        let pipeline = if stream.peek().is_none() {
            None
        } else {
            Some(self.parse_pipeline(stream.collect(), line, 0, "template")?)
        };
        Ok(TemplateCall {
            name,
            pipeline,
            line,
        })
    }

    fn parse_branch(
        &mut self,
        kind: BranchKind,
        tokens: Vec<Token>,
        line: usize,
    ) -> TemplateResult<Branch> {
        let max_decl = if kind == BranchKind::Range { 2 } else { 1 };
        let outer = self.vars.len();
        let pipeline = self.parse_pipeline(tokens, line, max_decl, kind.keyword())?;
        let inner = self.vars.len();

        let (list, end) = self.parse_list(false)?;
        self.vars.truncate(inner);

        let else_list = match end {
            Terminator::End { .. } => None,
            Terminator::Eof => {
                return Err(self.error(line, format!("unexpected EOF in {}", kind.keyword())));
            }
            Terminator::Else {
                tokens,
                line: else_line,
            } => {
                let mut stream: Tokens = tokens.into_iter().peekable();
                skip_space(&mut stream);
                let chained = kind != BranchKind::Range
                    && matches!(stream.peek(), Some(Token::Identifier(k)) if k == kind.keyword());
                if chained {
                    stream.next();
                    let tokens: Vec<Token> = stream.collect();
                    let nested =
                        self.nested(else_line, |p| p.parse_branch(kind, tokens, else_line))?;
                    Some(vec![kind.wrap(nested)])
                } else {
                    self.expect_empty(&mut stream, else_line, "else")?;
                    let (list, end) = self.parse_list(false)?;
                    self.vars.truncate(inner);
                    match end {
                        Terminator::End { .. } => {}
                        Terminator::Else { line, .. } => {
                            return Err(self.error(line, "expected end; found {{else}}"));
                        }
                        Terminator::Eof => {
                            return Err(
                                self.error(line, format!("unexpected EOF in {}", kind.keyword()))
                            );
                        }
                    }
                    Some(list)
                }
            }
        };
        self.vars.truncate(outer);

        Ok(Branch {
            pipeline,
            list,
            else_list,
            line,
        })
    }

    fn parse_pipeline(
        &mut self,
        mut tokens: Vec<Token>,
        line: usize,
        max_decl: usize,
        context: &str,
    ) -> TemplateResult<Pipeline> {
        let (decl, is_assign) = match split_decl(&tokens) {
            Some((names, is_assign, next)) => {
                if names.len() > max_decl {
                    return Err(self.error(line, format!("too many declarations in {}", context)));
                }
                tokens.drain(..next);
                (names, is_assign)
            }
            None => (Vec::new(), false),
        };

        let mut stream: Tokens = tokens.into_iter().peekable();
        let commands = self.parse_commands(&mut stream, line, false)?;
        if commands.is_empty() {
            return Err(self.error(line, format!("missing value for {}", context)));
        }

        if is_assign {
            if let Some(var) = decl.iter().find(|var| !self.is_defined(var)) {
                return Err(self.error(line, format!("undefined variable \"${}\"", var)));
            }
        } else {
            self.vars.extend(decl.iter().cloned());
        }

        Ok(Pipeline {
            decl,
            is_assign,
            commands,
            line,
        })
    }

    fn parse_commands(
        &mut self,
        stream: &mut Tokens,
        line: usize,
        in_paren: bool,
    ) -> TemplateResult<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            let mut args = Vec::new();
            loop {
                skip_space(stream);
                match stream.peek() {
                    None | Some(Token::Pipe) => break,
                    Some(Token::RightParen) if in_paren => break,
                    Some(Token::RightParen) => {
                        return Err(self.error(line, "unexpected right paren"));
                    }
                    _ => {}
                }
                args.push(self.parse_operand(stream, line)?);
                match stream.peek() {
                    None | Some(Token::Space | Token::Pipe | Token::RightParen) => {}
                    Some(other) => {
                        return Err(self.error(line, format!("unexpected {:?} in operand", other)));
                    }
                }
            }

            if args.is_empty() {
                if commands.is_empty() && !matches!(stream.peek(), Some(Token::Pipe)) {
                    break;
                }
                return Err(self.error(line, "missing value for command"));
            }
            if args[0] == Operand::Nil {
                return Err(self.error(line, "nil is not a command"));
            }
            if !commands.is_empty() && !matches!(args[0], Operand::Function(_)) {
                return Err(self.error(
                    line,
                    format!("non executable command in pipeline stage {}", commands.len() + 1),
                ));
            }
            commands.push(Command { args });

            if stream.next_if_eq(&Token::Pipe).is_none() {
                break;
            }
        }
        Ok(commands)
    }

    fn parse_operand(&mut self, stream: &mut Tokens, line: usize) -> TemplateResult<Operand> {
        let operand = match stream.next() {
            Some(Token::Dot) => Operand::Dot,
            Some(Token::Field(first)) => {
                let mut fields = vec![first];
                fields.extend(take_fields(stream));
                Operand::Field(fields)
            }
            Some(Token::Variable(name)) => {
                if !self.is_defined(&name) {
                    return Err(self.error(line, format!("undefined variable \"${}\"", name)));
                }
                Operand::Variable {
                    name,
                    fields: take_fields(stream),
                }
            }
            Some(Token::Identifier(name)) => {
                if !self.functions.contains(&name) {
                    return Err(self.error(line, format!("function {:?} not defined", name)));
                }
                Operand::Function(name)
            }
            Some(Token::Str(s)) => Operand::String(s),
            Some(Token::Int(i)) => Operand::Int(i),
            Some(Token::Bool(b)) => Operand::Bool(b),
            Some(Token::Nil) => Operand::Nil,
            Some(Token::LeftParen) => {
                let commands = self.nested(line, |p| p.parse_commands(stream, line, true))?;
                if stream.next() != Some(Token::RightParen) {
                    return Err(self.error(line, "unclosed left paren"));
                }
                if commands.is_empty() {
                    return Err(self.error(line, "missing value for parenthesized pipeline"));
                }
                Operand::Pipeline {
                    pipeline: Box::new(Pipeline {
                        decl: Vec::new(),
                        is_assign: false,
                        commands,
                        line,
                    }),
                    fields: take_fields(stream),
                }
            }
            Some(other) => {
                return Err(self.error(line, format!("unexpected {:?} in command", other)));
            }
            None => return Err(self.error(line, "unexpected end of action")),
        };
        Ok(operand)
    }
}

fn skip_space(stream: &mut Tokens) {
    while stream.next_if_eq(&Token::Space).is_some() {}
}

fn take_fields(stream: &mut Tokens) -> Vec<String> {
    let mut fields = Vec::new();
    while let Some(Token::Field(name)) = stream.next_if(|t| matches!(t, Token::Field(_))) {
        fields.push(name);
    }
    fields
}

/// Detect a leading `$a :=`, `$a =` or `$a, $b :=` declaration.
///
/// Returns the variable names, whether it is an assignment, and the index of
/// the first token after the operator.
fn split_decl(tokens: &[Token]) -> Option<(Vec<String>, bool, usize)> {
    let mut significant = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| **t != Token::Space);
    let mut names = Vec::new();
    loop {
        match significant.next()? {
            (_, Token::Variable(name)) => names.push(name.clone()),
            _ => return None,
        }
        match significant.next()? {
            (_, Token::Comma) => continue,
            (i, Token::Declare) => return Some((names, false, i + 1)),
            (i, Token::Assign) => return Some((names, true, i + 1)),
            _ => return None,
        }
    }
}
