/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content nodes of a document tree.
//!
//! Every node owns its children exclusively. There are no back-references,
//! so a tree is always acyclic and can be moved or cloned as a unit.

use crate::kind::NodeKind;
use crate::workspace::{Author, Document, Workspace};

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Workspace(Workspace),
    Document(Document),
    Author(Author),
    Chapter(Chapter),
    Text(Span),
    Code(Code),
    Image(Image),
    Toc,
    Newline,
    Newpage,
    Italic(Group),
    Bold(Group),
    Underline(Group),
    TitlePage(Group),
}

/// An ordered list of content nodes.
pub type Body = Vec<Node>;

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Workspace(_) => NodeKind::Workspace,
            Node::Document(_) => NodeKind::Document,
            Node::Author(_) => NodeKind::Author,
            Node::Chapter(_) => NodeKind::Chapter,
            Node::Text(_) => NodeKind::Text,
            Node::Code(_) => NodeKind::Code,
            Node::Image(_) => NodeKind::Image,
            Node::Toc => NodeKind::Toc,
            Node::Newline => NodeKind::Newline,
            Node::Newpage => NodeKind::Newpage,
            Node::Italic(_) => NodeKind::Italic,
            Node::Bold(_) => NodeKind::Bold,
            Node::Underline(_) => NodeKind::Underline,
            Node::TitlePage(_) => NodeKind::TitlePage,
        }
    }

    /// The child nodes of a body-bearing node, if it has any.
    pub fn body(&self) -> Option<&[Node]> {
        match self {
            Node::Document(d) => Some(&d.body),
            Node::Chapter(c) => Some(&c.body),
            Node::Italic(g) | Node::Bold(g) | Node::Underline(g) | Node::TitlePage(g) => {
                Some(&g.body)
            }
            _ => None,
        }
    }

    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(Span::new(value))
    }

    pub fn code<I, S>(hint: impl Into<String>, lines: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Code(Code {
            hint: hint.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        })
    }

    pub fn image(
        src: impl Into<String>,
        width: impl Into<String>,
        height: impl Into<String>,
    ) -> Node {
        Node::Image(Image {
            src: src.into(),
            width: width.into(),
            height: height.into(),
        })
    }

    /// A body group for cursive typesetting.
    pub fn italic(body: impl IntoIterator<Item = Node>) -> Node {
        Node::Italic(Group::new(body))
    }

    /// A body group for bold typesetting.
    pub fn bold(body: impl IntoIterator<Item = Node>) -> Node {
        Node::Bold(Group::new(body))
    }

    pub fn underline(body: impl IntoIterator<Item = Node>) -> Node {
        Node::Underline(Group::new(body))
    }

    /// A specially formatted page. How much of the body ends up on it is
    /// entirely up to the template.
    pub fn title_page(body: impl IntoIterator<Item = Node>) -> Node {
        Node::TitlePage(Group::new(body))
    }

    pub fn newline() -> Node {
        Node::Newline
    }

    pub fn newpage() -> Node {
        Node::Newpage
    }

    /// A table of contents built from the chapters and their levels.
    pub fn toc() -> Node {
        Node::Toc
    }
}

impl From<Chapter> for Node {
    fn from(chapter: Chapter) -> Self {
        Node::Chapter(chapter)
    }
}

impl From<Span> for Node {
    fn from(span: Span) -> Self {
        Node::Text(span)
    }
}

/// A titled, hierarchical grouping of content.
///
/// `level` starts at 0 for chapters directly below a document and grows by
/// one per nesting step when built through [`Chapter::new_chapter`]. Decoded
/// chapters keep whatever level the input carried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chapter {
    pub title: String,
    pub level: u32,
    pub body: Body,
}

impl Chapter {
    pub fn new(title: impl Into<String>, level: u32) -> Self {
        Self {
            title: title.into(),
            level,
            body: Vec::new(),
        }
    }

    pub fn add(&mut self, node: Node) -> &mut Self {
        self.body.push(node);
        self
    }

    pub fn add_all(&mut self, nodes: impl IntoIterator<Item = Node>) -> &mut Self {
        self.body.extend(nodes);
        self
    }

    /// Append a text span.
    pub fn text(&mut self, value: impl Into<String>) -> &mut Self {
        self.add(Node::text(value))
    }

    /// Append a sub-chapter one level deeper and return it.
    pub fn new_chapter(&mut self, title: impl Into<String>) -> &mut Chapter {
        let level = self.level + 1;
        push_chapter(&mut self.body, Chapter::new(title, level))
    }
}

pub(crate) fn push_chapter(body: &mut Body, chapter: Chapter) -> &mut Chapter {
    body.push(Node::Chapter(chapter));
    match body.last_mut() {
        Some(Node::Chapter(chapter)) => chapter,
        _ => unreachable!("a chapter was just appended"),
    }
}

/// A leaf text value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub value: String,
}

impl Span {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Literal lines with a format hint (e.g. a language name).
///
/// Line breaks are structural: each entry is one line without a newline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Code {
    pub hint: String,
    pub lines: Vec<String>,
}

/// A reference to a (usually local) image file.
///
/// Width and height are format-specific hints such as `"0.5\\textwidth"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    pub src: String,
    pub width: String,
    pub height: String,
}

/// The body of a group wrapper (italic, bold, underline, title page).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub body: Body,
}

impl Group {
    pub fn new(body: impl IntoIterator<Item = Node>) -> Self {
        Self {
            body: body.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Node::text("x").kind(), NodeKind::Text);
        assert_eq!(Node::toc().kind(), NodeKind::Toc);
        assert_eq!(Node::title_page([]).kind(), NodeKind::TitlePage);
        assert_eq!(Node::code("go", ["a"]).kind(), NodeKind::Code);
    }

    #[test]
    fn test_nested_chapters_increase_level() {
        let mut chapter = Chapter::new("top", 0);
        let sub = chapter.new_chapter("section");
        assert_eq!(sub.level, 1);
        let subsub = sub.new_chapter("subsection");
        subsub.text("deep");
        assert_eq!(subsub.level, 2);

        let Node::Chapter(section) = &chapter.body[0] else {
            panic!("expected chapter");
        };
        let Node::Chapter(subsection) = &section.body[0] else {
            panic!("expected chapter");
        };
        assert_eq!(subsection.body, vec![Node::text("deep")]);
    }

    #[test]
    fn test_chapter_builder_chains() {
        let mut chapter = Chapter::new("c", 0);
        chapter
            .text("hello ")
            .add(Node::italic([Node::text("worl"), Node::bold([Node::text("d")])]))
            .add(Node::newline());
        assert_eq!(chapter.body.len(), 3);
        assert_eq!(chapter.body[2], Node::Newline);
    }

    #[test]
    fn test_body_accessor() {
        let group = Node::bold([Node::text("a")]);
        assert_eq!(group.body().map(<[Node]>::len), Some(1));
        assert!(Node::newpage().body().is_none());
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new("plain").to_string(), "plain");
    }
}
