/*
 * workspace.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Workspace, document and author types.

use crate::node::{Body, Chapter, Node, push_chapter};

/// Current serialization format number written by [`Workspace::new`].
pub const FORMAT_VERSION: u32 = 1;

/// The root container of a document model.
///
/// Resources are heterogeneous, but only [`Document`] resources can be found
/// by identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workspace {
    pub format: u32,
    pub version: String,
    pub title: String,
    pub resources: Vec<Node>,
}

impl Workspace {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            format: FORMAT_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: title.into(),
            resources: Vec::new(),
        }
    }

    /// Append an empty document and return a handle to it.
    pub fn new_document(&mut self) -> &mut Document {
        self.resources.push(Node::Document(Document::default()));
        match self.resources.last_mut() {
            Some(Node::Document(document)) => document,
            _ => unreachable!("a document was just appended"),
        }
    }

    pub fn add_resource(&mut self, node: Node) -> &mut Self {
        self.resources.push(node);
        self
    }

    /// Iterate the top-level documents in resource order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.resources.iter().filter_map(|node| match node {
            Node::Document(document) => Some(document),
            _ => None,
        })
    }

    /// Find the first top-level document with the given identifier.
    ///
    /// Only direct resources are searched. Documents have no nested
    /// documents, and chapters carry no identifier.
    pub fn by_id(&self, id: &str) -> Option<&Document> {
        self.documents().find(|document| document.id == id)
    }
}

/// An addressable document. The identifier is optional (empty means none).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub authors: Vec<Author>,
    pub body: Body,
}

impl Document {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn add_author(&mut self, author: Author) -> &mut Self {
        self.authors.push(author);
        self
    }

    pub fn add(&mut self, node: Node) -> &mut Self {
        self.body.push(node);
        self
    }

    pub fn add_all(&mut self, nodes: impl IntoIterator<Item = Node>) -> &mut Self {
        self.body.extend(nodes);
        self
    }

    /// Append a top-level chapter (level 0) and return it.
    pub fn new_chapter(&mut self, title: impl Into<String>) -> &mut Chapter {
        push_chapter(&mut self.body, Chapter::new(title, 0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

impl Author {
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_documents() -> Workspace {
        let mut ws = Workspace::new("W");
        ws.new_document().set_id("A").set_title("first");
        ws.add_resource(Node::text("not a document"));
        ws.new_document().set_id("B").set_title("second");
        ws
    }

    #[test]
    fn test_by_id_finds_documents() {
        let ws = two_documents();
        assert_eq!(ws.by_id("A").map(|d| d.title.as_str()), Some("first"));
        assert_eq!(ws.by_id("B").map(|d| d.title.as_str()), Some("second"));
        assert!(ws.by_id("C").is_none());
    }

    #[test]
    fn test_by_id_returns_first_match() {
        let mut ws = two_documents();
        ws.new_document().set_id("A").set_title("shadowed");
        assert_eq!(ws.by_id("A").map(|d| d.title.as_str()), Some("first"));
    }

    #[test]
    fn test_empty_id_never_matches_missing_document() {
        let mut ws = Workspace::new("W");
        ws.add_resource(Node::toc());
        assert!(ws.by_id("").is_none());
    }

    #[test]
    fn test_document_chapters_start_at_level_zero() {
        let mut ws = Workspace::new("W");
        let doc = ws.new_document();
        doc.add_author(Author::new("Ada", "Lovelace", "ada@example.com"));
        let chapter = doc.new_chapter("Intro");
        chapter.text("hello");
        assert_eq!(chapter.level, 0);

        let doc = ws.documents().next().unwrap();
        assert_eq!(doc.authors.len(), 1);
        assert_eq!(
            doc.body,
            vec![Node::Chapter(Chapter {
                title: "Intro".into(),
                level: 0,
                body: vec![Node::text("hello")],
            })]
        );
    }

    #[test]
    fn test_new_workspace_carries_format() {
        let ws = Workspace::new("demo");
        assert_eq!(ws.format, FORMAT_VERSION);
        assert!(!ws.version.is_empty());
        assert!(ws.resources.is_empty());
    }
}
