/*
 * codec.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! JSON encoding of document trees.
//!
//! Every node is written as an object holding its discriminator under
//! [`TYPE_KEY`] plus its attributes. Decoding dispatches on that
//! discriminator alone. Encode and decode are exact mirrors, so
//! `decode(&encode(node))` always reproduces `node`.

use std::path::Path;

use serde_json::{Map, Value, json};

use crate::error::{CodecError, CodecResult};
use crate::kind::NodeKind;
use crate::node::{Body, Chapter, Code, Group, Image, Node, Span};
use crate::workspace::{Author, Document, Workspace};

/// The reserved attribute holding a node's discriminator.
pub const TYPE_KEY: &str = "type";

/// The flat attribute map a single node encodes to.
pub type AttributeMap = Map<String, Value>;

// ============================================================================
// Encoding
// ============================================================================

pub fn encode(node: &Node) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(TYPE_KEY.into(), json!(node.kind().as_str()));
    match node {
        Node::Workspace(ws) => return encode_workspace(ws),
        Node::Document(doc) => {
            if !doc.id.is_empty() {
                map.insert("id".into(), json!(doc.id));
            }
            map.insert("title".into(), json!(doc.title));
            let authors = doc
                .authors
                .iter()
                .map(|author| Value::Object(encode_author(author)))
                .collect();
            map.insert("authors".into(), Value::Array(authors));
            map.insert("body".into(), encode_body(&doc.body));
        }
        Node::Author(author) => return encode_author(author),
        Node::Chapter(chapter) => {
            map.insert("title".into(), json!(chapter.title));
            map.insert("level".into(), json!(chapter.level));
            map.insert("body".into(), encode_body(&chapter.body));
        }
        Node::Text(span) => {
            map.insert("value".into(), json!(span.value));
        }
        Node::Code(code) => {
            map.insert("hint".into(), json!(code.hint));
            map.insert("lines".into(), json!(code.lines));
        }
        Node::Image(image) => {
            map.insert("src".into(), json!(image.src));
            map.insert("width".into(), json!(image.width));
            map.insert("height".into(), json!(image.height));
        }
        Node::Toc | Node::Newline | Node::Newpage => {}
        Node::Italic(group) | Node::Bold(group) | Node::Underline(group) | Node::TitlePage(group) => {
            map.insert("body".into(), encode_body(&group.body));
        }
    }
    map
}

fn encode_workspace(ws: &Workspace) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(TYPE_KEY.into(), json!(NodeKind::Workspace.as_str()));
    map.insert("format".into(), json!(ws.format));
    map.insert("version".into(), json!(ws.version));
    map.insert("title".into(), json!(ws.title));
    map.insert("resources".into(), encode_body(&ws.resources));
    map
}

fn encode_author(author: &Author) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(TYPE_KEY.into(), json!(NodeKind::Author.as_str()));
    map.insert("firstname".into(), json!(author.firstname));
    map.insert("lastname".into(), json!(author.lastname));
    map.insert("email".into(), json!(author.email));
    map
}

fn encode_body(body: &[Node]) -> Value {
    Value::Array(body.iter().map(|n| Value::Object(encode(n))).collect())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one node from its attribute map.
pub fn decode(map: &AttributeMap) -> CodecResult<Node> {
    let kind = read_kind(map)?;
    let node = match kind {
        NodeKind::Workspace => Node::Workspace(decode_workspace_fields(map)?),
        NodeKind::Document => Node::Document(Document {
            id: opt_string(map, "id")?,
            title: opt_string(map, "title")?,
            authors: read_authors(map)?,
            body: read_body(map, "body")?,
        }),
        NodeKind::Author => Node::Author(decode_author_fields(map)?),
        NodeKind::Chapter => Node::Chapter(Chapter {
            title: opt_string(map, "title")?,
            level: opt_u32(map, "level")?,
            body: read_body(map, "body")?,
        }),
        NodeKind::Text => Node::Text(Span {
            value: opt_string(map, "value")?,
        }),
        NodeKind::Code => Node::Code(Code {
            hint: opt_string(map, "hint")?,
            lines: opt_string_list(map, "lines")?,
        }),
        NodeKind::Image => Node::Image(Image {
            src: opt_string(map, "src")?,
            width: opt_string(map, "width")?,
            height: opt_string(map, "height")?,
        }),
        NodeKind::Toc => Node::Toc,
        NodeKind::Newline => Node::Newline,
        NodeKind::Newpage => Node::Newpage,
        NodeKind::Italic => Node::Italic(read_group(map)?),
        NodeKind::Bold => Node::Bold(read_group(map)?),
        NodeKind::Underline => Node::Underline(read_group(map)?),
        NodeKind::TitlePage => Node::TitlePage(read_group(map)?),
    };
    Ok(node)
}

fn read_kind(map: &AttributeMap) -> CodecResult<NodeKind> {
    match map.get(TYPE_KEY) {
        Some(Value::String(s)) => s.parse(),
        Some(Value::Null) | None => Err(CodecError::MissingDiscriminator { key: TYPE_KEY }),
        Some(_) => Err(CodecError::invalid(TYPE_KEY, "expected a string")),
    }
}

fn decode_workspace_fields(map: &AttributeMap) -> CodecResult<Workspace> {
    Ok(Workspace {
        format: opt_u32(map, "format")?,
        version: opt_string(map, "version")?,
        title: opt_string(map, "title")?,
        resources: read_body(map, "resources")?,
    })
}

fn decode_author_fields(map: &AttributeMap) -> CodecResult<Author> {
    Ok(Author {
        firstname: opt_string(map, "firstname")?,
        lastname: opt_string(map, "lastname")?,
        email: opt_string(map, "email")?,
    })
}

fn read_group(map: &AttributeMap) -> CodecResult<Group> {
    Ok(Group {
        body: read_body(map, "body")?,
    })
}

fn read_authors(map: &AttributeMap) -> CodecResult<Vec<Author>> {
    read_objects(map, "authors")?
        .into_iter()
        .map(|obj| match decode(obj)? {
            Node::Author(author) => Ok(author),
            other => Err(CodecError::UnexpectedVariant {
                expected: NodeKind::Author,
                found: other.kind(),
            }),
        })
        .collect()
}

fn read_body(map: &AttributeMap, key: &str) -> CodecResult<Body> {
    read_objects(map, key)?.into_iter().map(decode).collect()
}

fn read_objects<'a>(map: &'a AttributeMap, key: &str) -> CodecResult<Vec<&'a AttributeMap>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object().ok_or_else(|| {
                    CodecError::invalid(key, format!("element {} is not an object", i))
                })
            })
            .collect(),
        Some(_) => Err(CodecError::invalid(key, "expected an array")),
    }
}

fn opt_string(map: &AttributeMap, key: &str) -> CodecResult<String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(CodecError::invalid(key, "expected a string")),
    }
}

fn opt_string_list(map: &AttributeMap, key: &str) -> CodecResult<Vec<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(CodecError::invalid(key, "expected an array of strings")),
            })
            .collect(),
        Some(_) => Err(CodecError::invalid(key, "expected an array")),
    }
}

/// Read a non-negative integer. Floats are truncated toward zero.
fn opt_u32(map: &AttributeMap, key: &str) -> CodecResult<u32> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(CodecError::invalid(key, "expected a number")),
    };
    let wide = if let Some(u) = value.as_u64() {
        u
    } else if let Some(i) = value.as_i64() {
        return Err(CodecError::invalid(key, format!("{} is negative", i)));
    } else {
        match value.as_f64() {
            Some(f) if f >= 0.0 && f.is_finite() => f.trunc() as u64,
            _ => return Err(CodecError::invalid(key, format!("{} is not a valid count", value))),
        }
    };
    u32::try_from(wide).map_err(|_| CodecError::invalid(key, format!("{} is out of range", wide)))
}

// ============================================================================
// Whole-workspace entry points
// ============================================================================

fn workspace_value(workspace: &Workspace) -> Value {
    Value::Object(encode_workspace(workspace))
}

/// Serialize a workspace to compact JSON.
pub fn marshal(workspace: &Workspace) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(&workspace_value(workspace))?)
}

/// Serialize a workspace to indented JSON.
pub fn marshal_pretty(workspace: &Workspace) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&workspace_value(workspace))?)
}

/// Parse a serialized workspace.
///
/// The top-level object may omit its discriminator. When present it has to
/// be `workspace`.
pub fn unmarshal(bytes: &[u8]) -> CodecResult<Workspace> {
    let value: Value = serde_json::from_slice(bytes)?;
    let map = value
        .as_object()
        .ok_or_else(|| CodecError::invalid(TYPE_KEY, "top level is not an object"))?;
    match map.get(TYPE_KEY) {
        None | Some(Value::Null) => {}
        Some(_) => {
            let kind = read_kind(map)?;
            if kind != NodeKind::Workspace {
                return Err(CodecError::UnexpectedVariant {
                    expected: NodeKind::Workspace,
                    found: kind,
                });
            }
        }
    }
    decode_workspace_fields(map)
}

/// Read and parse a serialized workspace from disk.
pub fn unmarshal_file(path: impl AsRef<Path>) -> CodecResult<Workspace> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    unmarshal(&bytes).map_err(|source| CodecError::File {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}
