/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for inkpress-template using test fixtures.
 */

use inkpress_template::{Flavor, TemplateError, TemplateSet, TemplateValue};
use pretty_assertions::assert_eq;
use std::path::Path;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> std::path::PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Helper to load a fixture into a fresh set under its file name
fn load_template(name: &str, flavor: Flavor) -> TemplateSet {
    let source = std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load template: {}", name));
    let mut set = TemplateSet::new(flavor);
    set.parse(name, &source)
        .unwrap_or_else(|e| panic!("Failed to parse template {}: {}", name, e));
    set
}

fn s(value: &str) -> TemplateValue {
    TemplateValue::from(value)
}

#[test]
fn test_simple_interpolation() {
    let set = load_template("simple.tmpl", Flavor::Text);
    let data = TemplateValue::map([("Name", s("World"))]);
    assert_eq!(set.render("simple.tmpl", &data).unwrap(), "Hello, World!");
}

#[test]
fn test_missing_field_renders_empty() {
    let set = load_template("simple.tmpl", Flavor::Text);
    let data = TemplateValue::map([("Other", s("x"))]);
    assert_eq!(set.render("simple.tmpl", &data).unwrap(), "Hello, !");
}

#[test]
fn test_conditional_true() {
    let set = load_template("conditional.tmpl", Flavor::Text);
    let data = TemplateValue::map([
        ("ShowGreeting", TemplateValue::Bool(true)),
        ("Name", s("Alice")),
    ]);
    assert_eq!(set.render("conditional.tmpl", &data).unwrap(), "Hello, Alice!");
}

#[test]
fn test_conditional_false() {
    let set = load_template("conditional.tmpl", Flavor::Text);
    let data = TemplateValue::map([
        ("ShowGreeting", TemplateValue::Bool(false)),
        ("Name", s("Alice")),
    ]);
    assert_eq!(set.render("conditional.tmpl", &data).unwrap(), "Goodbye.");
}

#[test]
fn test_list_with_separator() {
    let set = load_template("list.tmpl", Flavor::Text);
    let data = TemplateValue::map([("Items", TemplateValue::from(vec!["apple", "banana", "cherry"]))]);
    assert_eq!(
        set.render("list.tmpl", &data).unwrap(),
        "Items: apple, banana, cherry"
    );

    let empty = TemplateValue::map([("Items", TemplateValue::List(vec![]))]);
    assert_eq!(set.render("list.tmpl", &empty).unwrap(), "Items: ");
}

#[test]
fn test_recursive_outline_with_trim_markers() {
    let set = load_template("outline.tmpl", Flavor::Text);

    let chapter = |title: &str, level: i64, body: Vec<TemplateValue>| {
        TemplateValue::map([
            ("Type", s("chapter")),
            ("Title", s(title)),
            ("Level", TemplateValue::Int(level)),
            ("Body", TemplateValue::List(body)),
        ])
    };
    let text = TemplateValue::map([("Type", s("text")), ("Value", s("ignored"))]);
    let data = TemplateValue::map([(
        "Body",
        TemplateValue::List(vec![
            chapter("Intro", 0, vec![text, chapter("Scope", 1, vec![])]),
            chapter("Usage", 0, vec![]),
        ]),
    )]);

    assert_eq!(
        set.render("outline.tmpl", &data).unwrap(),
        "0 Intro\n1 Scope\n0 Usage\n"
    );
}

#[test]
fn test_html_card_escapes_values() {
    let set = load_template("card.gohtml", Flavor::Html);
    let data = TemplateValue::map([("Name", s("Tom & Jerry")), ("EMail", s("<tj@example.com>"))]);
    assert_eq!(
        set.render("card.gohtml", &data).unwrap(),
        "<div class=\"card\">Tom &amp; Jerry &lt;&lt;tj@example.com&gt;&gt;</div>\n"
    );
}

#[test]
fn test_json_data() {
    let mut set = TemplateSet::new(Flavor::Text);
    set.parse("t", "{{range .authors}}{{.first}} {{end}}").unwrap();
    let data = TemplateValue::from(serde_json::json!({
        "authors": [{"first": "Ada"}, {"first": "Alan"}]
    }));
    assert_eq!(set.render("t", &data).unwrap(), "Ada Alan ");
}

#[test]
fn test_parse_error_names_template_and_line() {
    let mut set = TemplateSet::new(Flavor::Text);
    let err = set.parse("broken.tmpl", "ok\n\n{{if .X}}never closed").unwrap_err();
    assert!(matches!(err, TemplateError::ParseError { line: 3, .. }));
    assert!(err.to_string().starts_with("broken.tmpl:3:"));
}
