/*
 * kind.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The closed registry of node discriminators.
//!
//! Every encoded node carries one of these names under the reserved `type`
//! key. Model and codec share this enum, so a discriminator can only be
//! spelled one way.

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Workspace,
    Document,
    Author,
    Chapter,
    Text,
    Code,
    Image,
    Toc,
    Newline,
    Newpage,
    Italic,
    Bold,
    Underline,
    TitlePage,
}

impl NodeKind {
    /// All registered kinds, in wire-format order.
    pub const ALL: [NodeKind; 14] = [
        NodeKind::Workspace,
        NodeKind::Document,
        NodeKind::Author,
        NodeKind::Chapter,
        NodeKind::Text,
        NodeKind::Code,
        NodeKind::Image,
        NodeKind::Toc,
        NodeKind::Newline,
        NodeKind::Newpage,
        NodeKind::Italic,
        NodeKind::Bold,
        NodeKind::Underline,
        NodeKind::TitlePage,
    ];

    /// The discriminator string used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Workspace => "workspace",
            NodeKind::Document => "document",
            NodeKind::Author => "author",
            NodeKind::Chapter => "chapter",
            NodeKind::Text => "text",
            NodeKind::Code => "code",
            NodeKind::Image => "image",
            NodeKind::Toc => "toc",
            NodeKind::Newline => "newline",
            NodeKind::Newpage => "newpage",
            NodeKind::Italic => "italic",
            NodeKind::Bold => "bold",
            NodeKind::Underline => "underline",
            NodeKind::TitlePage => "titlepage",
        }
    }

    /// Whether nodes of this kind own a `body` of child nodes.
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::Chapter
                | NodeKind::Italic
                | NodeKind::Bold
                | NodeKind::Underline
                | NodeKind::TitlePage
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| CodecError::UnknownVariant {
                discriminator: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_parses_back() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_discriminator() {
        let err = "paragraph".parse::<NodeKind>().unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnknownVariant { ref discriminator } if discriminator == "paragraph"
        ));
    }

    #[test]
    fn test_discriminators_are_case_sensitive() {
        assert!("Chapter".parse::<NodeKind>().is_err());
        assert!("TitlePage".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_body_bearing_kinds() {
        assert!(NodeKind::Chapter.has_body());
        assert!(NodeKind::TitlePage.has_body());
        assert!(!NodeKind::Text.has_body());
        assert!(!NodeKind::Toc.has_body());
        assert!(!NodeKind::Workspace.has_body());
    }
}
