/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation engine.
//!
//! This module walks a parsed template against a data value ("dot") and
//! appends the output to a string. Named templates are looked up in the
//! owning [`TemplateSet`], which also decides whether output is escaped.

use crate::ast::{Branch, Command, Operand, Pipeline, TemplateCall, TemplateNode};
use crate::context::{Scope, TemplateValue};
use crate::error::{TemplateError, TemplateResult};
use crate::functions::html_escape;
use crate::set::{Flavor, TemplateSet};

/// Maximum nesting of `{{template}}` calls.
pub const MAX_TEMPLATE_DEPTH: usize = 200;

/// Render the template `name` from `set` with `data` as dot.
pub(crate) fn execute(
    set: &TemplateSet,
    name: &str,
    data: &TemplateValue,
    depth: usize,
    out: &mut String,
) -> TemplateResult<()> {
    let template = set.get(name).ok_or_else(|| TemplateError::TemplateNotFound {
        name: name.to_string(),
    })?;
    if depth >= MAX_TEMPLATE_DEPTH {
        return Err(TemplateError::RecursiveTemplate {
            name: name.to_string(),
            max_depth: MAX_TEMPLATE_DEPTH,
        });
    }
    let mut evaluator = Evaluator {
        set,
        name: &template.name,
        scope: Scope::new(data.clone()),
        depth,
    };
    evaluator.walk(data, &template.nodes, out)
}

struct Evaluator<'a> {
    set: &'a TemplateSet,
    name: &'a str,
    scope: Scope,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::EvaluationError {
            name: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    fn walk(
        &mut self,
        dot: &TemplateValue,
        nodes: &[TemplateNode],
        out: &mut String,
    ) -> TemplateResult<()> {
        for node in nodes {
            match node {
                TemplateNode::Text(text) => out.push_str(text),
                TemplateNode::Action(pipeline) => {
                    let value = self.eval_pipeline(dot, pipeline)?;
                    // Declarations print nothing.
                    if pipeline.decl.is_empty() {
                        self.emit(&value, out);
                    }
                }
                TemplateNode::If(branch) => self.walk_if_or_with(dot, branch, false, out)?,
                TemplateNode::With(branch) => self.walk_if_or_with(dot, branch, true, out)?,
                TemplateNode::Range(branch) => self.walk_range(dot, branch, out)?,
                TemplateNode::Template(call) => self.walk_template(dot, call, out)?,
            }
        }
        Ok(())
    }

    fn emit(&self, value: &TemplateValue, out: &mut String) {
        let text = value.to_string();
        match self.set.flavor() {
            Flavor::Text => out.push_str(&text),
            Flavor::Html => out.push_str(&html_escape(&text)),
        }
    }

    fn walk_if_or_with(
        &mut self,
        dot: &TemplateValue,
        branch: &Branch,
        rebind_dot: bool,
        out: &mut String,
    ) -> TemplateResult<()> {
        let mark = self.scope.mark();
        let value = self.eval_pipeline(dot, &branch.pipeline)?;
        let result = if value.is_truthy() {
            let dot = if rebind_dot { &value } else { dot };
            self.walk(dot, &branch.list, out)
        } else if let Some(else_list) = &branch.else_list {
            self.walk(dot, else_list, out)
        } else {
            Ok(())
        };
        self.scope.pop_to(mark);
        result
    }

    fn walk_range(
        &mut self,
        dot: &TemplateValue,
        branch: &Branch,
        out: &mut String,
    ) -> TemplateResult<()> {
        let value = self.eval_commands(dot, &branch.pipeline)?;
        let items: Vec<(TemplateValue, TemplateValue)> = match value {
            TemplateValue::Null => Vec::new(),
            TemplateValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (TemplateValue::Int(i as i64), item))
                .collect(),
            TemplateValue::Map(entries) => entries
                .into_iter()
                .map(|(key, item)| (TemplateValue::String(key), item))
                .collect(),
            TemplateValue::Int(n) => (0..n.max(0))
                .map(|i| (TemplateValue::Int(i), TemplateValue::Int(i)))
                .collect(),
            other => {
                return Err(self.error(
                    branch.line,
                    format!("range can't iterate over {}", other),
                ));
            }
        };

        if items.is_empty() {
            if let Some(else_list) = &branch.else_list {
                let mark = self.scope.mark();
                let result = self.walk(dot, else_list, out);
                self.scope.pop_to(mark);
                return result;
            }
            return Ok(());
        }

        let decl = &branch.pipeline.decl;
        for (index, item) in items {
            let mark = self.scope.mark();
            match decl.as_slice() {
                [elem] => self.scope.declare(elem.clone(), item.clone()),
                [key, elem] => {
                    self.scope.declare(key.clone(), index);
                    self.scope.declare(elem.clone(), item.clone());
                }
                _ => {}
            }
            let result = self.walk(&item, &branch.list, out);
            self.scope.pop_to(mark);
            result?;
        }
        Ok(())
    }

    fn walk_template(
        &mut self,
        dot: &TemplateValue,
        call: &TemplateCall,
        out: &mut String,
    ) -> TemplateResult<()> {
        if !self.set.contains(&call.name) {
            return Err(self.error(
                call.line,
                format!("template {:?} not defined", call.name),
            ));
        }
        let data = match &call.pipeline {
            Some(pipeline) => self.eval_pipeline(dot, pipeline)?,
            None => TemplateValue::Null,
        };
        execute(self.set, &call.name, &data, self.depth + 1, out)
    }

    /// Evaluate a pipeline and bind its declared variables.
    fn eval_pipeline(
        &mut self,
        dot: &TemplateValue,
        pipeline: &Pipeline,
    ) -> TemplateResult<TemplateValue> {
        let value = self.eval_commands(dot, pipeline)?;
        for var in &pipeline.decl {
            if pipeline.is_assign {
                if !self.scope.assign(var, value.clone()) {
                    return Err(self.error(pipeline.line, format!("undefined variable: ${}", var)));
                }
            } else {
                self.scope.declare(var.clone(), value.clone());
            }
        }
        Ok(value)
    }

    fn eval_commands(
        &self,
        dot: &TemplateValue,
        pipeline: &Pipeline,
    ) -> TemplateResult<TemplateValue> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.eval_command(dot, command, piped, pipeline.line)?);
        }
        Ok(piped.unwrap_or_default())
    }

    fn eval_command(
        &self,
        dot: &TemplateValue,
        command: &Command,
        piped: Option<TemplateValue>,
        line: usize,
    ) -> TemplateResult<TemplateValue> {
        let Some((head, rest)) = command.args.split_first() else {
            return Err(self.error(line, "empty command"));
        };
        match head {
            Operand::Function(name) if matches!(name.as_str(), "and" | "or") => {
                self.short_circuit(name, dot, rest, piped, line)
            }
            Operand::Function(name) => {
                let mut args = rest
                    .iter()
                    .map(|arg| self.eval_arg(dot, arg, line))
                    .collect::<TemplateResult<Vec<_>>>()?;
                args.extend(piped);
                self.call(name, &args, line)
            }
            _ if !rest.is_empty() || piped.is_some() => Err(self.error(
                line,
                format!("can't give argument to non-function {}", describe(head)),
            )),
            _ => self.eval_arg(dot, head, line),
        }
    }

    /// `and` stops at the first falsy operand, `or` at the first truthy one.
    /// A piped value is the last operand.
    fn short_circuit(
        &self,
        name: &str,
        dot: &TemplateValue,
        rest: &[Operand],
        piped: Option<TemplateValue>,
        line: usize,
    ) -> TemplateResult<TemplateValue> {
        if rest.is_empty() && piped.is_none() {
            let message = format!("wrong number of args for {}: want at least 1 got 0", name);
            return Err(self.error(line, format!("error calling {}: {}", name, message)));
        }
        let stop_when = name == "or";
        let mut last = TemplateValue::Null;
        for arg in rest {
            last = self.eval_arg(dot, arg, line)?;
            if last.is_truthy() == stop_when {
                return Ok(last);
            }
        }
        Ok(piped.unwrap_or(last))
    }

    fn call(&self, name: &str, args: &[TemplateValue], line: usize) -> TemplateResult<TemplateValue> {
        let function = self
            .set
            .functions()
            .get(name)
            .ok_or_else(|| self.error(line, format!("function {:?} not defined", name)))?;
        function(args).map_err(|message| self.error(line, format!("error calling {}: {}", name, message)))
    }

    fn eval_arg(
        &self,
        dot: &TemplateValue,
        operand: &Operand,
        line: usize,
    ) -> TemplateResult<TemplateValue> {
        match operand {
            Operand::Dot => Ok(dot.clone()),
            Operand::Field(fields) => self.field_chain(dot, fields, line),
            Operand::Variable { name, fields } => {
                let value = self
                    .scope
                    .get(name)
                    .ok_or_else(|| self.error(line, format!("undefined variable: ${}", name)))?;
                self.field_chain(value, fields, line)
            }
            Operand::Function(name) => self.call(name, &[], line),
            Operand::Pipeline { pipeline, fields } => {
                let value = self.eval_commands(dot, pipeline)?;
                self.field_chain(&value, fields, line)
            }
            Operand::String(s) => Ok(TemplateValue::String(s.clone())),
            Operand::Int(i) => Ok(TemplateValue::Int(*i)),
            Operand::Bool(b) => Ok(TemplateValue::Bool(*b)),
            Operand::Nil => Ok(TemplateValue::Null),
        }
    }

    /// Follow `.A.B` through nested maps. Missing keys yield nil.
    fn field_chain(
        &self,
        value: &TemplateValue,
        fields: &[String],
        line: usize,
    ) -> TemplateResult<TemplateValue> {
        let mut current = value;
        for field in fields {
            current = match current {
                TemplateValue::Map(entries) => match entries.get(field) {
                    Some(next) => next,
                    None => return Ok(TemplateValue::Null),
                },
                TemplateValue::Null => return Ok(TemplateValue::Null),
                other => {
                    return Err(self.error(
                        line,
                        format!("can't evaluate field {} in type {}", field, other.kind_name()),
                    ));
                }
            };
        }
        Ok(current.clone())
    }
}

fn describe(operand: &Operand) -> String {
    match operand {
        Operand::Dot => ".".to_string(),
        Operand::Field(fields) => format!(".{}", fields.join(".")),
        Operand::Variable { name, fields } if fields.is_empty() => format!("${}", name),
        Operand::Variable { name, fields } => format!("${}.{}", name, fields.join(".")),
        Operand::Function(name) => name.clone(),
        Operand::Pipeline { .. } => "(pipeline)".to_string(),
        Operand::String(s) => format!("{:?}", s),
        Operand::Int(i) => i.to_string(),
        Operand::Bool(b) => b.to_string(),
        Operand::Nil => "nil".to_string(),
    }
}
