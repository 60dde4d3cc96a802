//! Node JSON codec.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::node::Node;
use crate::model::schema::{check_document, SchemaError};

/// Errors from decoding or encoding document JSON.
#[derive(Debug)]
pub enum JsonError {
    /// Input is not valid node JSON.
    Serde(serde_json::Error),
    /// Decoded tree violates the schema.
    Schema(SchemaError),
}

impl Display for JsonError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serde(err) => write!(f, "invalid document json: {err}"),
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JsonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serde(err) => Some(err),
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for JsonError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl From<SchemaError> for JsonError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Encodes a node tree as compact JSON.
pub fn to_json(node: &Node) -> Result<String, JsonError> {
    Ok(serde_json::to_string(node)?)
}

/// Decodes a document, normalizes paragraph text runs and validates it.
///
/// # Errors
/// - `Serde` for malformed JSON or unknown node types.
/// - `Schema` for illegal nesting, including a non-`doc` root.
pub fn from_json(input: &str) -> Result<Node, JsonError> {
    let mut node: Node = serde_json::from_str(input)?;
    node.normalize();
    check_document(&node)?;
    Ok(node)
}
