//! Typed hierarchical metadata tree and path queries

mod node;
mod query;

pub use node::{MetadataNode, NodeType, Value};
pub use query::dotted;
