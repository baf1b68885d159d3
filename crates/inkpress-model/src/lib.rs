/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Document model types for inkpress.
 *
 * A workspace owns documents, documents own chapters and content nodes.
 * The codec module maps every node to a flat JSON object tagged with its
 * discriminator and back.
 */

pub mod codec;
pub mod error;
pub mod kind;
pub mod node;
pub mod workspace;

pub use codec::{
    AttributeMap, TYPE_KEY, decode, encode, marshal, marshal_pretty, unmarshal, unmarshal_file,
};
pub use error::{CodecError, CodecResult};
pub use kind::NodeKind;
pub use node::{Body, Chapter, Code, Group, Image, Node, Span};
pub use workspace::{Author, Document, FORMAT_VERSION, Workspace};
