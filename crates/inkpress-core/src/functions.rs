/*
 * functions.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Domain functions available to text-flavor templates.
//!
//! - `escapeLatex s`: escape LaTeX reserved characters
//! - `typeOf v`: a node's discriminator, or the value kind for non-nodes
//! - `isType v "chapter" "text"`: whether `v` is any of the named kinds
//! - `str v`: stringify any value

use inkpress_template::functions::sprint;
use inkpress_template::{TemplateSet, TemplateValue};

use crate::model_value::TYPE_FIELD;

/// Register the domain functions on a template set.
///
/// Must run before any source using them is parsed.
pub fn register_domain_functions(set: &mut TemplateSet) {
    set.register_function("escapeLatex", escape_latex_fn)
        .register_function("typeOf", type_of_fn)
        .register_function("isType", is_type_fn)
        .register_function("str", str_fn);
}

/// Escape characters with special meaning in LaTeX.
pub fn escape_latex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            c => out.push(c),
        }
    }
    out
}

/// Discriminator of a converted node, or the kind of any other value.
pub fn type_of(value: &TemplateValue) -> &str {
    value
        .get_path(&[TYPE_FIELD])
        .and_then(TemplateValue::as_str)
        .unwrap_or_else(|| value.kind_name())
}

fn single<'a>(name: &str, args: &'a [TemplateValue]) -> Result<&'a TemplateValue, String> {
    match args {
        [value] => Ok(value),
        _ => Err(format!(
            "wrong number of args for {}: want 1 got {}",
            name,
            args.len()
        )),
    }
}

fn escape_latex_fn(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    let value = single("escapeLatex", args)?;
    Ok(TemplateValue::String(escape_latex(&value.to_string())))
}

fn type_of_fn(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    let value = single("typeOf", args)?;
    Ok(TemplateValue::from(type_of(value)))
}

fn is_type_fn(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    let (value, names) = args
        .split_first()
        .ok_or("wrong number of args for isType: want at least 1 got 0")?;
    let kind = type_of(value);
    Ok(TemplateValue::Bool(
        names.iter().any(|name| name.as_str() == Some(kind)),
    ))
}

fn str_fn(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::String(sprint(args)))
}
