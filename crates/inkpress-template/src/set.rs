/*
 * set.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Named collections of templates.

use std::collections::HashMap;
use std::io::Write;

use crate::ast::Template;
use crate::context::TemplateValue;
use crate::error::TemplateResult;
use crate::evaluator::execute;
use crate::functions::{FunctionRegistry, TemplateFunction};
use crate::parser::parse;

/// How action output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Values are emitted verbatim.
    Text,
    /// Every action's output is HTML-escaped.
    Html,
}

/// A set of templates that can call each other by name.
///
/// Every parsed source contributes a template under the name it was parsed
/// with, plus one template per `define`. Functions must be registered before
/// the sources that call them are parsed.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    flavor: Flavor,
    functions: FunctionRegistry,
    templates: HashMap<String, Template>,
}

impl TemplateSet {
    /// Create an empty set with the builtin functions.
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            functions: FunctionRegistry::with_builtins(),
            templates: HashMap::new(),
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Register an additional function.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        function: TemplateFunction,
    ) -> &mut Self {
        self.functions.register(name, function);
        self
    }

    /// Parse `source` and add its templates under `name`.
    ///
    /// A later definition replaces an earlier one of the same name, unless
    /// the later one is blank.
    pub fn parse(&mut self, name: &str, source: &str) -> TemplateResult<()> {
        for template in parse(name, source, &self.functions)? {
            let keep_existing = template.is_blank()
                && self
                    .templates
                    .get(&template.name)
                    .is_some_and(|existing| !existing.is_blank());
            if !keep_existing {
                self.templates.insert(template.name.clone(), template);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Names of all templates, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render the named template with `data` as dot.
    pub fn render(&self, name: &str, data: &TemplateValue) -> TemplateResult<String> {
        let mut out = String::new();
        execute(self, name, data, 0, &mut out)?;
        Ok(out)
    }

    /// Render the named template into a writer.
    ///
    /// Nothing is written if rendering fails.
    pub fn render_to(
        &self,
        name: &str,
        data: &TemplateValue,
        writer: &mut dyn Write,
    ) -> TemplateResult<()> {
        let out = self.render(name, data)?;
        writer.write_all(out.as_bytes())?;
        Ok(())
    }
}
