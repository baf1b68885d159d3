/*
 * codec_roundtrip.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property-based tests for the workspace codec.
 *
 * Random trees over the full node set are encoded and decoded again; the
 * result has to equal the input for any depth and order.
 */

use inkpress_model::{
    Author, Chapter, Code, Document, Group, Image, Node, Span, Workspace, decode, encode,
    marshal, marshal_pretty, unmarshal,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn gen_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 \\\\{}&%$#_^~<>\"'\n]{0,12}"
}

fn gen_author() -> impl Strategy<Value = Author> {
    (gen_text(), gen_text(), gen_text()).prop_map(|(firstname, lastname, email)| Author {
        firstname,
        lastname,
        email,
    })
}

fn gen_leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        gen_text().prop_map(|value| Node::Text(Span { value })),
        (gen_text(), prop::collection::vec(gen_text(), 0..4))
            .prop_map(|(hint, lines)| Node::Code(Code { hint, lines })),
        (gen_text(), gen_text(), gen_text())
            .prop_map(|(src, width, height)| Node::Image(Image { src, width, height })),
        Just(Node::Toc),
        Just(Node::Newline),
        Just(Node::Newpage),
        gen_author().prop_map(Node::Author),
    ]
}

/// Content nodes of arbitrary depth, including nested chapters and groups.
fn gen_node() -> impl Strategy<Value = Node> {
    gen_leaf().prop_recursive(4, 48, 5, |inner| {
        let body = prop::collection::vec(inner, 0..5);
        prop_oneof![
            (gen_text(), 0u32..8, body.clone())
                .prop_map(|(title, level, body)| Node::Chapter(Chapter { title, level, body })),
            body.clone().prop_map(|body| Node::Italic(Group { body })),
            body.clone().prop_map(|body| Node::Bold(Group { body })),
            body.clone().prop_map(|body| Node::Underline(Group { body })),
            body.prop_map(|body| Node::TitlePage(Group { body })),
        ]
    })
}

fn gen_document() -> impl Strategy<Value = Document> {
    (
        gen_text(),
        gen_text(),
        prop::collection::vec(gen_author(), 0..3),
        prop::collection::vec(gen_node(), 0..4),
    )
        .prop_map(|(id, title, authors, body)| Document {
            id,
            title,
            authors,
            body,
        })
}

fn gen_workspace() -> impl Strategy<Value = Workspace> {
    (
        0u32..10,
        gen_text(),
        gen_text(),
        prop::collection::vec(
            prop_oneof![gen_document().prop_map(Node::Document), gen_node()],
            0..4,
        ),
    )
        .prop_map(|(format, version, title, resources)| Workspace {
            format,
            version,
            title,
            resources,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_node_roundtrip(node in gen_node()) {
        prop_assert_eq!(decode(&encode(&node)).unwrap(), node);
    }

    #[test]
    fn test_workspace_roundtrip(ws in gen_workspace()) {
        let bytes = marshal(&ws).unwrap();
        prop_assert_eq!(unmarshal(&bytes).unwrap(), ws.clone());

        let pretty = marshal_pretty(&ws).unwrap();
        prop_assert_eq!(unmarshal(&pretty).unwrap(), ws);
    }

    #[test]
    fn test_workspace_node_roundtrip(ws in gen_workspace()) {
        let node = Node::Workspace(ws);
        prop_assert_eq!(decode(&encode(&node)).unwrap(), node);
    }
}

#[test]
fn test_chapter_survives_marshal() {
    let mut ws = Workspace::new("W");
    ws.new_document()
        .set_id("D1")
        .new_chapter("Intro")
        .text("hello");

    let bytes = marshal(&ws).unwrap();
    let decoded = unmarshal(&bytes).unwrap();
    let doc = decoded.by_id("D1").expect("document D1");
    assert_eq!(
        doc.body,
        vec![Node::Chapter(Chapter {
            title: "Intro".to_string(),
            level: 0,
            body: vec![Node::Text(Span {
                value: "hello".to_string()
            })],
        })]
    );
}

#[test]
fn test_wire_format_shape() {
    let mut ws = Workspace::new("demo");
    ws.new_document()
        .set_title("doc")
        .add(Node::bold([Node::text("b")]));
    let value: serde_json::Value = serde_json::from_slice(&marshal(&ws).unwrap()).unwrap();

    assert_eq!(value["type"], "workspace");
    assert_eq!(value["title"], "demo");
    let doc = &value["resources"][0];
    assert_eq!(doc["type"], "document");
    assert!(doc.get("id").is_none());
    assert_eq!(doc["authors"], serde_json::json!([]));
    assert_eq!(doc["body"][0]["type"], "bold");
    assert_eq!(doc["body"][0]["body"][0]["value"], "b");
}

#[test]
fn test_unknown_variant_in_nested_body() {
    let input = br#"{
        "type": "workspace",
        "resources": [
            {"type": "document", "body": [{"type": "chapter", "body": [{"type": "footnote"}]}]}
        ]
    }"#;
    let err = unmarshal(input).unwrap_err();
    assert_eq!(err.to_string(), "unknown node type 'footnote'");
}
