/*
 * functions.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template functions.
//!
//! A [`FunctionRegistry`] maps names to plain function pointers. The parser
//! consults it so that calls to unknown functions fail at parse time, and
//! the evaluator looks functions up again when running a command.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::context::TemplateValue;

/// A callable template function.
///
/// Errors are plain messages; the evaluator wraps them with the template
/// name and line.
pub type TemplateFunction = fn(&[TemplateValue]) -> Result<TemplateValue, String>;

/// Named functions available to a template set.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, TemplateFunction>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the builtin functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("and", and)
            .register("or", or)
            .register("not", not)
            .register("eq", eq)
            .register("ne", ne)
            .register("lt", lt)
            .register("le", le)
            .register("gt", gt)
            .register("ge", ge)
            .register("len", len)
            .register("index", index)
            .register("print", print)
            .register("html", html);
        registry
    }

    /// Add or replace a function.
    pub fn register(&mut self, name: impl Into<String>, function: TemplateFunction) -> &mut Self {
        self.functions.insert(name.into(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<TemplateFunction> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

/// Escape text for inclusion in HTML.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

/// Concatenate values, adding spaces between operands when neither side
/// is a string.
pub fn sprint(args: &[TemplateValue]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, TemplateValue::String(_));
        if i > 0 && !is_string && !matches!(args[i - 1], TemplateValue::String(_)) {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out
}

fn expect_args(name: &str, args: &[TemplateValue], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            count,
            args.len()
        ));
    }
    Ok(())
}

fn and(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    let last = args.last().ok_or("wrong number of args for and: want at least 1 got 0")?;
    Ok(args
        .iter()
        .find(|arg| !arg.is_truthy())
        .unwrap_or(last)
        .clone())
}

fn or(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    let last = args.last().ok_or("wrong number of args for or: want at least 1 got 0")?;
    Ok(args
        .iter()
        .find(|arg| arg.is_truthy())
        .unwrap_or(last)
        .clone())
}

fn not(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    expect_args("not", args, 1)?;
    Ok(TemplateValue::Bool(!args[0].is_truthy()))
}

/// `eq a b c` is true when `a` equals any of the following arguments.
fn eq(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    match args.split_first() {
        Some((first, rest)) if !rest.is_empty() => {
            Ok(TemplateValue::Bool(rest.iter().any(|arg| arg == first)))
        }
        _ => Err("missing argument for comparison".to_string()),
    }
}

fn ne(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    expect_args("ne", args, 2)?;
    Ok(TemplateValue::Bool(args[0] != args[1]))
}

fn compare(name: &str, args: &[TemplateValue]) -> Result<Ordering, String> {
    expect_args(name, args, 2)?;
    match (&args[0], &args[1]) {
        (TemplateValue::Int(a), TemplateValue::Int(b)) => Ok(a.cmp(b)),
        (TemplateValue::String(a), TemplateValue::String(b)) => Ok(a.cmp(b)),
        (a, b) if a.kind_name() == b.kind_name() => Err("invalid type for comparison".to_string()),
        _ => Err("incompatible types for comparison".to_string()),
    }
}

fn lt(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::Bool(compare("lt", args)?.is_lt()))
}

fn le(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::Bool(compare("le", args)?.is_le()))
}

fn gt(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::Bool(compare("gt", args)?.is_gt()))
}

fn ge(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::Bool(compare("ge", args)?.is_ge()))
}

fn len(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    expect_args("len", args, 1)?;
    let n = match &args[0] {
        TemplateValue::String(s) => s.chars().count(),
        TemplateValue::List(items) => items.len(),
        TemplateValue::Map(m) => m.len(),
        other => return Err(format!("len of type {}", other.kind_name())),
    };
    Ok(TemplateValue::Int(n as i64))
}

/// `index x 1 2` is `x[1][2]`. Missing map keys yield nil.
fn index(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    let (item, indexes) = args
        .split_first()
        .ok_or("wrong number of args for index: want at least 1 got 0")?;
    let mut current = item.clone();
    for idx in indexes {
        current = match (&current, idx) {
            (TemplateValue::List(items), TemplateValue::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| format!("index out of range: {}", i))?,
            (TemplateValue::Map(m), TemplateValue::String(key)) => {
                m.get(key).cloned().unwrap_or_default()
            }
            (TemplateValue::Null, _) => return Err("index of untyped nil".to_string()),
            (value, idx) => {
                return Err(format!(
                    "cannot index {} with {}",
                    value.kind_name(),
                    idx.kind_name()
                ));
            }
        };
    }
    Ok(current)
}

fn print(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::String(sprint(args)))
}

fn html(args: &[TemplateValue]) -> Result<TemplateValue, String> {
    Ok(TemplateValue::String(html_escape(&sprint(args))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[TemplateValue]) -> Result<TemplateValue, String> {
        let registry = FunctionRegistry::with_builtins();
        let function = registry.get(name).expect("builtin");
        function(args)
    }

    fn s(v: &str) -> TemplateValue {
        TemplateValue::from(v)
    }

    #[test]
    fn test_and_or_return_operands() {
        assert_eq!(
            call("and", &[s("a"), s(""), s("c")]).unwrap(),
            s("")
        );
        assert_eq!(call("and", &[s("a"), s("c")]).unwrap(), s("c"));
        assert_eq!(call("or", &[s(""), s("b")]).unwrap(), s("b"));
        assert_eq!(
            call("or", &[s(""), TemplateValue::Null]).unwrap(),
            TemplateValue::Null
        );
        assert!(call("and", &[]).is_err());
    }

    #[test]
    fn test_eq_matches_any() {
        let chapter = s("chapter");
        assert_eq!(
            call("eq", &[chapter.clone(), s("text"), s("chapter")]).unwrap(),
            TemplateValue::Bool(true)
        );
        assert_eq!(
            call("eq", &[chapter, TemplateValue::Int(1)]).unwrap(),
            TemplateValue::Bool(false)
        );
        assert!(call("eq", &[s("x")]).is_err());
    }

    #[test]
    fn test_ordering() {
        let (one, two) = (TemplateValue::Int(1), TemplateValue::Int(2));
        assert_eq!(call("lt", &[one.clone(), two.clone()]).unwrap(), TemplateValue::Bool(true));
        assert_eq!(call("ge", &[one.clone(), two]).unwrap(), TemplateValue::Bool(false));
        assert_eq!(call("le", &[s("a"), s("b")]).unwrap(), TemplateValue::Bool(true));
        assert_eq!(
            call("gt", &[one, s("1")]).unwrap_err(),
            "incompatible types for comparison"
        );
    }

    #[test]
    fn test_len_and_index() {
        let list = TemplateValue::from(vec!["a", "b", "c"]);
        assert_eq!(call("len", &[list.clone()]).unwrap(), TemplateValue::Int(3));
        assert_eq!(call("len", &[s("äb")]).unwrap(), TemplateValue::Int(2));
        assert!(call("len", &[TemplateValue::Int(3)]).is_err());

        assert_eq!(
            call("index", &[list.clone(), TemplateValue::Int(1)]).unwrap(),
            s("b")
        );
        assert!(call("index", &[list, TemplateValue::Int(7)]).is_err());

        let map = TemplateValue::map([("k", s("v"))]);
        assert_eq!(call("index", &[map.clone(), s("k")]).unwrap(), s("v"));
        assert_eq!(call("index", &[map, s("x")]).unwrap(), TemplateValue::Null);
    }

    #[test]
    fn test_print_spacing() {
        let args = [TemplateValue::Int(1), TemplateValue::Int(2), s("x"), TemplateValue::Int(3)];
        assert_eq!(call("print", &args).unwrap(), s("1 2x3"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(call("html", &[s("<b>")]).unwrap(), s("&lt;b&gt;"));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = FunctionRegistry::new();
        assert!(!registry.contains("len"));
        registry.register("len", len);
        assert!(registry.contains("len"));
        assert!(registry.get("missing").is_none());
    }
}
