//! Standard-markdown parser adapter.
//!
//! Bridges pulldown-cmark events into the document model. This covers the
//! plain markdown vocabulary only; the component dialect belongs to the host
//! parser. pulldown-cmark recovers from any truncation, so this adapter
//! never returns an error: unterminated fences, emphasis markers and links
//! all come back as a best-effort tree.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};

use crate::document::{DocumentNode, DocumentRoot};
use crate::parser::{DocumentParser, ParseError};

/// Parser for standard markdown, without the component dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, text: &str) -> Result<DocumentRoot, ParseError> {
        let mut builder = TreeBuilder::new();
        for event in Parser::new(text) {
            builder.process_event(event);
        }
        Ok(builder.finish())
    }
}

/// Open block or span being assembled while its events stream in.
enum Frame {
    Paragraph,
    Heading { depth: u8 },
    Code { lang: Option<String> },
    List { ordered: bool },
    Item,
    Blockquote,
    Strong,
    Emphasis,
    Link { url: String },
    /// Constructs outside the closed vocabulary (images, tables, raw HTML
    /// blocks, ...) keep their content as a passthrough node.
    Passthrough,
}

/// Event-stream state for building the node tree.
struct TreeBuilder {
    /// Open frames, innermost last. Each carries the children collected so far.
    stack: Vec<(Frame, Vec<DocumentNode>)>,
    /// Finished top-level blocks.
    blocks: Vec<DocumentNode>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.stack.push((frame_for(tag), Vec::new())),
            // Start/End events arrive balanced, so every End closes the
            // innermost frame regardless of its payload.
            Event::End(_) => self.pop_frame(),
            Event::Text(text) => self.push_node(DocumentNode::text(text.to_string())),
            Event::Code(code) => self.push_node(DocumentNode::InlineCode {
                value: code.to_string(),
            }),
            // Raw HTML stays literal text; sanitization is the host's job.
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_node(DocumentNode::text(html.to_string()));
            }
            Event::SoftBreak => self.push_node(DocumentNode::text(" ")),
            Event::HardBreak => self.push_node(DocumentNode::text("\n")),
            Event::Rule => self.push_node(DocumentNode::ThematicBreak),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_node(DocumentNode::text(marker));
            }
            Event::FootnoteReference(label) => {
                self.push_node(DocumentNode::text(format!("[^{label}]")));
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push_node(DocumentNode::text(math.to_string()));
            }
        }
    }

    fn pop_frame(&mut self) {
        let Some((frame, children)) = self.stack.pop() else {
            return;
        };
        let node = match frame {
            Frame::Paragraph => DocumentNode::Paragraph { children },
            Frame::Heading { depth } => DocumentNode::Heading { depth, children },
            Frame::Code { lang } => DocumentNode::Code {
                value: collect_text(&children),
                lang,
            },
            Frame::List { ordered } => DocumentNode::List { ordered, children },
            Frame::Item => DocumentNode::ListItem { children },
            Frame::Blockquote => DocumentNode::Blockquote { children },
            Frame::Strong => DocumentNode::Strong { children },
            Frame::Emphasis => DocumentNode::Emphasis { children },
            Frame::Link { url } => DocumentNode::Link { url, children },
            Frame::Passthrough => DocumentNode::Unknown { children },
        };
        self.push_node(node);
    }

    fn push_node(&mut self, node: DocumentNode) {
        match self.stack.last_mut() {
            Some((_, children)) => children.push(node),
            None => self.blocks.push(node),
        }
    }

    fn finish(mut self) -> DocumentRoot {
        // pulldown closes every tag it opens; draining here is belt for
        // frames left open by a foreign event stream.
        while !self.stack.is_empty() {
            self.pop_frame();
        }
        DocumentRoot::new(self.blocks)
    }
}

fn frame_for(tag: Tag) -> Frame {
    match tag {
        Tag::Paragraph => Frame::Paragraph,
        Tag::Heading { level, .. } => Frame::Heading { depth: level as u8 },
        Tag::CodeBlock(kind) => Frame::Code {
            lang: match kind {
                CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                _ => None,
            },
        },
        Tag::List(start) => Frame::List {
            ordered: start.is_some(),
        },
        Tag::Item => Frame::Item,
        Tag::BlockQuote(_) => Frame::Blockquote,
        Tag::Strong => Frame::Strong,
        Tag::Emphasis => Frame::Emphasis,
        Tag::Link { dest_url, .. } => Frame::Link {
            url: dest_url.to_string(),
        },
        _ => Frame::Passthrough,
    }
}

/// Concatenates the text runs directly under a frame (code block bodies).
fn collect_text(children: &[DocumentNode]) -> String {
    let mut out = String::new();
    for child in children {
        if let DocumentNode::Text { value } = child {
            out.push_str(value);
        }
    }
    out
}
