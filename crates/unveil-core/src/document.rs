//! Document model shared by parsers and the renderer.
//!
//! A parsed document is a tree of [`DocumentNode`]s under a [`DocumentRoot`].
//! The node vocabulary is closed; parsers that encounter a construct they
//! cannot classify wrap its content in [`DocumentNode::Unknown`] so the
//! renderer can still pass the content through.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open, string-keyed attribute mapping attached to component nodes.
///
/// Values are arbitrary JSON; validation of attribute shapes belongs to the
/// individual component handlers, not to the core.
pub type Attributes = serde_json::Map<String, Value>;

/// Structural role of a component node in the source dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Block component with nested block content.
    Container,
    /// Block component without nested content.
    Leaf,
    /// Inline component inside prose.
    Text,
}

/// A single node of a parsed document.
///
/// `children`, where present, is ordered and preserves source order. Nodes
/// are produced fresh by a parser on every parse; the renderer never mutates
/// them in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentNode {
    /// Literal text run. The value is unescaped source text.
    Text { value: String },
    /// Prose paragraph.
    Paragraph { children: Vec<DocumentNode> },
    /// Section heading. `depth` is nominally 1..=6; the renderer clamps
    /// out-of-range depths.
    Heading { depth: u8, children: Vec<DocumentNode> },
    /// Fenced or indented code block.
    Code { value: String, lang: Option<String> },
    /// Inline code span.
    InlineCode { value: String },
    /// Strong emphasis.
    Strong { children: Vec<DocumentNode> },
    /// Regular emphasis.
    Emphasis { children: Vec<DocumentNode> },
    /// Hyperlink with its label as children.
    Link { url: String, children: Vec<DocumentNode> },
    /// Ordered or unordered list of `ListItem` children.
    List { ordered: bool, children: Vec<DocumentNode> },
    /// One list entry.
    ListItem { children: Vec<DocumentNode> },
    /// Quoted block.
    Blockquote { children: Vec<DocumentNode> },
    /// Horizontal rule.
    ThematicBreak,
    /// Named, attributed extension component.
    Component {
        kind: ComponentKind,
        name: String,
        attributes: Attributes,
        children: Vec<DocumentNode>,
    },
    /// Escape hatch for constructs outside the closed vocabulary. The
    /// renderer emits the children in sequence with no wrapping semantics.
    Unknown { children: Vec<DocumentNode> },
}

impl DocumentNode {
    /// Shorthand for a text node.
    pub fn text(value: impl Into<String>) -> Self {
        DocumentNode::Text {
            value: value.into(),
        }
    }
}

/// Root of a parsed document: the ordered top-level blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRoot {
    pub children: Vec<DocumentNode>,
}

impl DocumentRoot {
    pub fn new(children: Vec<DocumentNode>) -> Self {
        Self { children }
    }
}
