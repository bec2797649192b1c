//! Document renderer: walks a parsed tree into keyed render instructions.
//!
//! The walk is a pure function of `(node, key path)`. Keys are structural
//! paths (`"root"`, `"root-0"`, `"root-0-1"`, ...), so a prefix of a
//! document and any longer prefix of the same document share keys for their
//! common structure; only newly revealed trailing content introduces new
//! keys. That is what lets a host diff successive trees without identity
//! churn while content streams in.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::{Attributes, DocumentNode, DocumentRoot};
use crate::parser::{DocumentParser, ParseError};
use crate::registry::ComponentRegistry;

/// Key assigned to the root instruction of every tree.
pub const ROOT_KEY: &str = "root";

/// Heading size tier. Depths outside 1..=6 clamp to the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTier {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTier {
    const BY_DEPTH: [HeadingTier; 6] = [
        HeadingTier::H1,
        HeadingTier::H2,
        HeadingTier::H3,
        HeadingTier::H4,
        HeadingTier::H5,
        HeadingTier::H6,
    ];

    pub fn from_depth(depth: u8) -> Self {
        Self::BY_DEPTH[(depth.clamp(1, 6) - 1) as usize]
    }
}

/// One typed render instruction. The host decides how each variant looks;
/// the renderer only decides structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Sequence container with no semantics of its own: the tree root and
    /// the generic passthrough for unclassified constructs.
    Fragment,
    /// Literal text leaf. The value is unescaped; sanitization belongs to
    /// the host.
    Text { value: String },
    /// Block container for prose.
    Paragraph,
    Heading { tier: HeadingTier },
    Code { value: String, lang: Option<String> },
    InlineCode { value: String },
    Strong,
    Emphasis,
    /// Hyperlink; hosts open the target in a new context.
    Link { url: String },
    List { ordered: bool },
    ListItem,
    Blockquote,
    /// Zero-children divider.
    Divider,
    /// Output of a registered component handler that keeps the component
    /// shape (handlers may also return any other instruction).
    Component { name: String, attributes: Attributes },
    /// Bordered placeholder for a component with no registered handler,
    /// labeled with the original-cased name. Children carry the component's
    /// content so nothing disappears.
    Fallback { name: String },
}

/// A keyed instruction node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    /// Structural-path key, stable across re-renders of a growing prefix.
    pub key: String,
    pub instruction: Instruction,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// Leaf node without a key; the walk assigns keys.
    pub fn new(instruction: Instruction) -> Self {
        Self::with_children(instruction, Vec::new())
    }

    /// Node without a key; the walk assigns keys.
    pub fn with_children(instruction: Instruction, children: Vec<RenderNode>) -> Self {
        Self {
            key: String::new(),
            instruction,
            children,
        }
    }

    /// Convenience for handlers that keep the component shape.
    pub fn component(name: impl Into<String>, attributes: Attributes, children: Vec<RenderNode>) -> Self {
        Self::with_children(
            Instruction::Component {
                name: name.into(),
                attributes,
            },
            children,
        )
    }

    fn keyed(key: String, instruction: Instruction, children: Vec<RenderNode>) -> Self {
        Self {
            key,
            instruction,
            children,
        }
    }

    /// Pre-order traversal of this node and all descendants.
    pub fn visit(&self, f: &mut impl FnMut(&RenderNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Output of a render pass: an ordered tree of keyed instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderTree {
    pub root: RenderNode,
}

impl RenderTree {
    /// Every key in the tree, pre-order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.root.visit(&mut |node| keys.push(node.key.clone()));
        keys
    }

    /// Finds a node by its structural key.
    pub fn find(&self, key: &str) -> Option<&RenderNode> {
        fn search<'a>(node: &'a RenderNode, key: &str) -> Option<&'a RenderNode> {
            if node.key == key {
                return Some(node);
            }
            node.children.iter().find_map(|child| search(child, key))
        }
        search(&self.root, key)
    }
}

/// Renders revealed prefixes through a parser into keyed instruction trees.
pub struct DocumentRenderer {
    parser: Box<dyn DocumentParser>,
}

impl DocumentRenderer {
    pub fn new(parser: impl DocumentParser + 'static) -> Self {
        Self {
            parser: Box::new(parser),
        }
    }

    /// Renderer over the built-in standard-markdown parser.
    pub fn markdown() -> Self {
        Self::new(crate::markdown::MarkdownParser::new())
    }

    /// Parses `prefix` and walks the result into a render tree.
    ///
    /// Truncated input renders best-effort; only input the parser cannot
    /// recover from surfaces as a [`ParseError`], which is returned as-is
    /// and never retried here.
    pub fn render(
        &self,
        prefix: &str,
        registry: &ComponentRegistry,
    ) -> Result<RenderTree, ParseError> {
        let root = self.parser.parse(prefix)?;
        Ok(render_root(&root, registry))
    }
}

/// Walks an already-parsed document into a render tree.
pub fn render_root(root: &DocumentRoot, registry: &ComponentRegistry) -> RenderTree {
    let children = walk_children(&root.children, ROOT_KEY, registry);
    RenderTree {
        root: RenderNode::keyed(ROOT_KEY.to_string(), Instruction::Fragment, children),
    }
}

fn walk_children(
    nodes: &[DocumentNode],
    parent_key: &str,
    registry: &ComponentRegistry,
) -> Vec<RenderNode> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| walk(node, format!("{parent_key}-{index}"), registry))
        .collect()
}

/// Converts one document node into exactly one render instruction,
/// recursing into children. Dispatch is total over the node vocabulary.
pub fn walk(node: &DocumentNode, key: String, registry: &ComponentRegistry) -> RenderNode {
    match node {
        DocumentNode::Text { value } => RenderNode::keyed(
            key,
            Instruction::Text {
                value: value.clone(),
            },
            Vec::new(),
        ),
        DocumentNode::Paragraph { children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::Paragraph, rendered)
        }
        DocumentNode::Heading { depth, children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(
                key,
                Instruction::Heading {
                    tier: HeadingTier::from_depth(*depth),
                },
                rendered,
            )
        }
        DocumentNode::Code { value, lang } => RenderNode::keyed(
            key,
            Instruction::Code {
                value: value.clone(),
                lang: lang.clone(),
            },
            Vec::new(),
        ),
        DocumentNode::InlineCode { value } => RenderNode::keyed(
            key,
            Instruction::InlineCode {
                value: value.clone(),
            },
            Vec::new(),
        ),
        DocumentNode::Strong { children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::Strong, rendered)
        }
        DocumentNode::Emphasis { children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::Emphasis, rendered)
        }
        DocumentNode::Link { url, children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::Link { url: url.clone() }, rendered)
        }
        DocumentNode::List { ordered, children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::List { ordered: *ordered }, rendered)
        }
        DocumentNode::ListItem { children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::ListItem, rendered)
        }
        DocumentNode::Blockquote { children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::Blockquote, rendered)
        }
        DocumentNode::ThematicBreak => RenderNode::keyed(key, Instruction::Divider, Vec::new()),
        DocumentNode::Component {
            name,
            attributes,
            children,
            ..
        } => {
            let rendered = walk_children(children, &key, registry);
            match registry.get(name) {
                Some(handler) => {
                    let mut node = handler(attributes, rendered);
                    node.key = key;
                    node
                }
                None => {
                    warn!(component = %name, "no handler registered, rendering placeholder");
                    RenderNode::keyed(
                        key,
                        Instruction::Fallback { name: name.clone() },
                        rendered,
                    )
                }
            }
        }
        DocumentNode::Unknown { children } => {
            let rendered = walk_children(children, &key, registry);
            RenderNode::keyed(key, Instruction::Fragment, rendered)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::document::ComponentKind;

    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect()
    }

    fn component(name: &str, attributes: Attributes, children: Vec<DocumentNode>) -> DocumentNode {
        DocumentNode::Component {
            kind: ComponentKind::Container,
            name: name.to_string(),
            attributes,
            children,
        }
    }

    fn render(nodes: Vec<DocumentNode>, registry: &ComponentRegistry) -> RenderTree {
        render_root(&DocumentRoot::new(nodes), registry)
    }

    #[test]
    fn test_key_paths_follow_structure() {
        let registry = ComponentRegistry::new();
        let tree = render(
            vec![DocumentNode::Paragraph {
                children: vec![
                    DocumentNode::text("a"),
                    DocumentNode::Strong {
                        children: vec![DocumentNode::text("b")],
                    },
                ],
            }],
            &registry,
        );

        assert_eq!(
            tree.keys(),
            vec!["root", "root-0", "root-0-0", "root-0-1", "root-0-1-0"]
        );
        assert_eq!(
            tree.find("root-0-1-0").map(|n| &n.instruction),
            Some(&Instruction::Text {
                value: "b".to_string()
            })
        );
    }

    #[test]
    fn test_heading_depth_clamped() {
        let registry = ComponentRegistry::new();
        let heading = |depth| DocumentNode::Heading {
            depth,
            children: vec![],
        };
        let tree = render(vec![heading(0), heading(3), heading(9)], &registry);

        let tiers: Vec<_> = tree.root.children.iter().map(|n| &n.instruction).collect();
        assert_eq!(
            tiers,
            vec![
                &Instruction::Heading {
                    tier: HeadingTier::H1
                },
                &Instruction::Heading {
                    tier: HeadingTier::H3
                },
                &Instruction::Heading {
                    tier: HeadingTier::H6
                },
            ]
        );
    }

    #[test]
    fn test_thematic_break_is_childless_divider() {
        let registry = ComponentRegistry::new();
        let tree = render(vec![DocumentNode::ThematicBreak], &registry);
        assert_eq!(tree.root.children[0].instruction, Instruction::Divider);
        assert!(tree.root.children[0].children.is_empty());
    }

    #[test]
    fn test_unregistered_component_renders_placeholder_with_children() {
        let registry = ComponentRegistry::new();
        let tree = render(
            vec![component(
                "widget",
                Attributes::new(),
                vec![DocumentNode::Paragraph {
                    children: vec![DocumentNode::text("inside")],
                }],
            )],
            &registry,
        );

        let node = &tree.root.children[0];
        assert_eq!(
            node.instruction,
            Instruction::Fallback {
                name: "widget".to_string()
            }
        );
        assert_eq!(node.key, "root-0");
        assert_eq!(
            node.children[0].children[0].instruction,
            Instruction::Text {
                value: "inside".to_string()
            }
        );
    }

    #[test]
    fn test_fallback_label_keeps_original_case() {
        let registry = ComponentRegistry::new();
        let tree = render(
            vec![component("BigWidget", Attributes::new(), vec![])],
            &registry,
        );
        assert_eq!(
            tree.root.children[0].instruction,
            Instruction::Fallback {
                name: "BigWidget".to_string()
            }
        );
    }

    #[test]
    fn test_handler_receives_attributes_and_children_verbatim() {
        let mut registry = ComponentRegistry::new();
        registry.register("alert", |attributes, children| {
            RenderNode::component("alert", attributes.clone(), children)
        });

        let tree = render(
            vec![component(
                "Alert",
                attrs(&[("type", "warning")]),
                vec![DocumentNode::text("Text")],
            )],
            &registry,
        );

        let node = &tree.root.children[0];
        assert_eq!(node.key, "root-0");
        assert_eq!(
            node.instruction,
            Instruction::Component {
                name: "alert".to_string(),
                attributes: attrs(&[("type", "warning")]),
            }
        );
        assert_eq!(
            node.children,
            vec![RenderNode {
                key: "root-0-0".to_string(),
                instruction: Instruction::Text {
                    value: "Text".to_string()
                },
                children: vec![],
            }]
        );
    }

    #[test]
    fn test_unknown_node_passes_children_through() {
        let registry = ComponentRegistry::new();
        let tree = render(
            vec![DocumentNode::Unknown {
                children: vec![DocumentNode::text("kept")],
            }],
            &registry,
        );

        let node = &tree.root.children[0];
        assert_eq!(node.instruction, Instruction::Fragment);
        assert_eq!(
            node.children[0].instruction,
            Instruction::Text {
                value: "kept".to_string()
            }
        );
    }

    #[test]
    fn test_text_value_is_not_escaped() {
        let registry = ComponentRegistry::new();
        let tree = render(vec![DocumentNode::text("<b>&\"quoted\"</b>")], &registry);
        assert_eq!(
            tree.root.children[0].instruction,
            Instruction::Text {
                value: "<b>&\"quoted\"</b>".to_string()
            }
        );
    }

    #[test]
    fn test_render_markdown_scenario() {
        let registry = ComponentRegistry::new();
        let renderer = DocumentRenderer::markdown();
        let tree = renderer
            .render("# Hi\n\nHello **world**", &registry)
            .expect("render");

        assert_eq!(
            tree.root.children[0].instruction,
            Instruction::Heading {
                tier: HeadingTier::H1
            }
        );
        assert_eq!(
            tree.root.children[1].instruction,
            Instruction::Paragraph
        );
        assert_eq!(
            tree.find("root-1-1").map(|n| &n.instruction),
            Some(&Instruction::Strong)
        );
        assert_eq!(
            tree.find("root-1-1-0").map(|n| &n.instruction),
            Some(&Instruction::Text {
                value: "world".to_string()
            })
        );
    }

    #[test]
    fn test_keys_stable_between_prefix_and_extension() {
        let registry = ComponentRegistry::new();
        let renderer = DocumentRenderer::markdown();

        let short = renderer.render("# Hi", &registry).expect("render");
        let long = renderer
            .render("# Hi\n\nHello **world**", &registry)
            .expect("render");

        let long_keys = long.keys();
        for key in short.keys() {
            assert!(
                long_keys.contains(&key),
                "key {key} from the shorter prefix is missing in the longer one"
            );
        }
    }
}
