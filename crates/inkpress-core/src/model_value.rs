/*
 * model_value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion of document model values to template values.
//!
//! Every node becomes a map holding its discriminator under `Type` and its
//! attributes under capitalized keys, so templates can write `{{.Title}}`,
//! `{{range .Body}}` or `{{if eq .Type "chapter"}}`.

use inkpress_model::{Author, Chapter, Code, Document, Group, Image, Node, NodeKind, Span, Workspace};
use inkpress_template::TemplateValue;

/// Key holding a node's discriminator.
pub const TYPE_FIELD: &str = "Type";

/// Values that can be handed to a template as dot.
pub trait ToTemplateValue {
    fn to_template_value(&self) -> TemplateValue;
}

impl<T: ToTemplateValue + ?Sized> ToTemplateValue for &T {
    fn to_template_value(&self) -> TemplateValue {
        (**self).to_template_value()
    }
}

impl ToTemplateValue for TemplateValue {
    fn to_template_value(&self) -> TemplateValue {
        self.clone()
    }
}

impl<T: ToTemplateValue> ToTemplateValue for [T] {
    fn to_template_value(&self) -> TemplateValue {
        TemplateValue::List(self.iter().map(ToTemplateValue::to_template_value).collect())
    }
}

impl<T: ToTemplateValue> ToTemplateValue for Vec<T> {
    fn to_template_value(&self) -> TemplateValue {
        self.as_slice().to_template_value()
    }
}

fn node_map<const N: usize>(kind: NodeKind, fields: [(&str, TemplateValue); N]) -> TemplateValue {
    TemplateValue::map(
        std::iter::once((TYPE_FIELD, TemplateValue::from(kind.as_str()))).chain(fields),
    )
}

fn group(kind: NodeKind, group: &Group) -> TemplateValue {
    node_map(kind, [("Body", group.body.to_template_value())])
}

impl ToTemplateValue for Node {
    fn to_template_value(&self) -> TemplateValue {
        match self {
            Node::Workspace(w) => w.to_template_value(),
            Node::Document(d) => d.to_template_value(),
            Node::Author(a) => a.to_template_value(),
            Node::Chapter(c) => c.to_template_value(),
            Node::Text(s) => s.to_template_value(),
            Node::Code(c) => c.to_template_value(),
            Node::Image(i) => i.to_template_value(),
            Node::Italic(g) | Node::Bold(g) | Node::Underline(g) | Node::TitlePage(g) => {
                group(self.kind(), g)
            }
            Node::Toc | Node::Newline | Node::Newpage => node_map(self.kind(), []),
        }
    }
}

impl ToTemplateValue for Workspace {
    fn to_template_value(&self) -> TemplateValue {
        node_map(
            NodeKind::Workspace,
            [
                ("Format", TemplateValue::from(self.format)),
                ("Version", TemplateValue::from(self.version.as_str())),
                ("Title", TemplateValue::from(self.title.as_str())),
                ("Resources", self.resources.to_template_value()),
            ],
        )
    }
}

impl ToTemplateValue for Document {
    fn to_template_value(&self) -> TemplateValue {
        node_map(
            NodeKind::Document,
            [
                ("Id", TemplateValue::from(self.id.as_str())),
                ("Title", TemplateValue::from(self.title.as_str())),
                ("Authors", self.authors.to_template_value()),
                ("Body", self.body.to_template_value()),
            ],
        )
    }
}

impl ToTemplateValue for Author {
    fn to_template_value(&self) -> TemplateValue {
        node_map(
            NodeKind::Author,
            [
                ("Firstname", TemplateValue::from(self.firstname.as_str())),
                ("Lastname", TemplateValue::from(self.lastname.as_str())),
                ("EMail", TemplateValue::from(self.email.as_str())),
            ],
        )
    }
}

impl ToTemplateValue for Chapter {
    fn to_template_value(&self) -> TemplateValue {
        node_map(
            NodeKind::Chapter,
            [
                ("Title", TemplateValue::from(self.title.as_str())),
                ("Level", TemplateValue::from(self.level)),
                ("Body", self.body.to_template_value()),
            ],
        )
    }
}

impl ToTemplateValue for Span {
    fn to_template_value(&self) -> TemplateValue {
        node_map(NodeKind::Text, [("Value", TemplateValue::from(self.value.as_str()))])
    }
}

impl ToTemplateValue for Code {
    fn to_template_value(&self) -> TemplateValue {
        node_map(
            NodeKind::Code,
            [
                ("Hint", TemplateValue::from(self.hint.as_str())),
                (
                    "Lines",
                    TemplateValue::List(self.lines.iter().map(|l| TemplateValue::from(l.as_str())).collect()),
                ),
            ],
        )
    }
}

impl ToTemplateValue for Image {
    fn to_template_value(&self) -> TemplateValue {
        node_map(
            NodeKind::Image,
            [
                ("Src", TemplateValue::from(self.src.as_str())),
                ("Width", TemplateValue::from(self.width.as_str())),
                ("Height", TemplateValue::from(self.height.as_str())),
            ],
        )
    }
}
