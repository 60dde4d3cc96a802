//! Document schema: node types and nesting legality.
//!
//! # Responsibility
//! - Declare which children each node type accepts.
//! - Validate whole documents before a transaction is committed.
//!
//! # Invariants
//! - `doc: (paragraph | taskList)*`
//! - `paragraph: text*`
//! - `taskList: taskItem+`
//! - `taskItem {done}: paragraph` (exactly one)
//! - Text runs are never empty.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::node::Node;

/// Node type names, mirroring the node JSON `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Doc,
    Paragraph,
    Text,
    TaskList,
    TaskItem,
}

const DOC_CHILDREN: &[NodeType] = &[NodeType::Paragraph, NodeType::TaskList];
const PARAGRAPH_CHILDREN: &[NodeType] = &[NodeType::Text];
const TASK_LIST_CHILDREN: &[NodeType] = &[NodeType::TaskItem];

/// Content expression accepted by one node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// No children at all.
    Leaf,
    /// Any number of children drawn from the set.
    ZeroOrMore(&'static [NodeType]),
    /// At least one child drawn from the set.
    OneOrMore(&'static [NodeType]),
    /// Exactly one child of the given type.
    ExactlyOne(NodeType),
}

impl NodeType {
    /// Stable name used by JSON and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::TaskList => "taskList",
            Self::TaskItem => "taskItem",
        }
    }

    pub fn content_rule(self) -> ContentRule {
        match self {
            Self::Doc => ContentRule::ZeroOrMore(DOC_CHILDREN),
            Self::Paragraph => ContentRule::ZeroOrMore(PARAGRAPH_CHILDREN),
            Self::Text => ContentRule::Leaf,
            Self::TaskList => ContentRule::OneOrMore(TASK_LIST_CHILDREN),
            Self::TaskItem => ContentRule::ExactlyOne(NodeType::Paragraph),
        }
    }

    /// Returns whether `child` may appear directly under this node type.
    pub fn allows_child(self, child: NodeType) -> bool {
        match self.content_rule() {
            ContentRule::Leaf => false,
            ContentRule::ZeroOrMore(allowed) | ContentRule::OneOrMore(allowed) => {
                allowed.contains(&child)
            }
            ContentRule::ExactlyOne(expected) => expected == child,
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural violation found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Root node is not `doc`.
    UnexpectedRoot(NodeType),
    /// Child type is not allowed under its parent.
    IllegalChild {
        parent: NodeType,
        child: NodeType,
        path: Vec<usize>,
    },
    /// Node requires at least one child but has none.
    MissingContent { node: NodeType, path: Vec<usize> },
    /// Node accepts exactly one child but has more.
    TooManyChildren {
        node: NodeType,
        path: Vec<usize>,
        count: usize,
    },
    /// Text run with no characters.
    EmptyText { path: Vec<usize> },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedRoot(found) => write!(f, "document root must be doc, got {found}"),
            Self::IllegalChild {
                parent,
                child,
                path,
            } => write!(
                f,
                "{child} is not allowed inside {parent} at {}",
                display_path(path)
            ),
            Self::MissingContent { node, path } => {
                write!(f, "{node} at {} must not be empty", display_path(path))
            }
            Self::TooManyChildren { node, path, count } => write!(
                f,
                "{node} at {} accepts exactly one child, got {count}",
                display_path(path)
            ),
            Self::EmptyText { path } => {
                write!(f, "empty text run at {}", display_path(path))
            }
        }
    }
}

impl Error for SchemaError {}

/// Formats a child-index path as `/1/0/0` (`/` for the root).
pub fn display_path(path: &[usize]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().map(|index| format!("/{index}")).collect()
}

/// Validates a complete document.
///
/// # Errors
/// - Returns the first violation found in document order.
pub fn check_document(doc: &Node) -> Result<(), SchemaError> {
    if doc.node_type() != NodeType::Doc {
        return Err(SchemaError::UnexpectedRoot(doc.node_type()));
    }
    let mut path = Vec::new();
    check_node(doc, &mut path)
}

/// Validates one subtree rooted at `path`.
pub fn check_node(node: &Node, path: &mut Vec<usize>) -> Result<(), SchemaError> {
    let node_type = node.node_type();
    if let Node::Text { text } = node {
        if text.is_empty() {
            return Err(SchemaError::EmptyText { path: path.clone() });
        }
        return Ok(());
    }

    let children = node.content();
    match node_type.content_rule() {
        ContentRule::OneOrMore(_) if children.is_empty() => {
            return Err(SchemaError::MissingContent {
                node: node_type,
                path: path.clone(),
            });
        }
        ContentRule::ExactlyOne(_) if children.is_empty() => {
            return Err(SchemaError::MissingContent {
                node: node_type,
                path: path.clone(),
            });
        }
        ContentRule::ExactlyOne(_) if children.len() > 1 => {
            return Err(SchemaError::TooManyChildren {
                node: node_type,
                path: path.clone(),
                count: children.len(),
            });
        }
        _ => {}
    }

    for (index, child) in children.iter().enumerate() {
        path.push(index);
        if !node_type.allows_child(child.node_type()) {
            let err = SchemaError::IllegalChild {
                parent: node_type,
                child: child.node_type(),
                path: path.clone(),
            };
            path.pop();
            return Err(err);
        }
        let result = check_node(child, path);
        path.pop();
        result?;
    }
    Ok(())
}
