//! The markup AST.
//!
//! Parsing produces a [`Node`] tree rooted at [`NodeKind::Root`]. Inline
//! style nesting is expressed through [`NodeKind::Style`] nodes whose
//! children carry the styled content; template holes are numbered
//! left-to-right in document order after parsing.

use super::style::Style;

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// What a node is. Block-level kinds come out of the line-oriented pass,
/// inline kinds out of the token pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// Literal text. An empty string acts as a vertical spacer.
    Text(String),
    /// An inline styled region; the style applies to all children.
    Style(Style),
    /// A `%v` placeholder, numbered left-to-right after parsing.
    Hole(usize),
    /// A paragraph line with inline children.
    Block,
    /// A `#`-header of the given level (1..=6).
    Header(u8),
    List,
    ListItem,
    /// A fenced code block with its language tag and verbatim body.
    CodeBlock { lang: String, body: String },
    /// A horizontal rule.
    Rule,
    /// A `>` block quote.
    Quote,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Node {
        Node {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Node {
        Node { kind, children }
    }

    pub fn text(content: impl Into<String>) -> Node {
        Node::new(NodeKind::Text(content.into()))
    }

    pub fn styled(style: Style, children: Vec<Node>) -> Node {
        Node::with_children(NodeKind::Style(style), children)
    }

    /// The style this node contributes to its children.
    ///
    /// Headers imply bold; level 1 adds reverse, level 2 adds underline.
    /// Everything except `Style` and `Header` contributes nothing.
    pub fn own_style(&self) -> Style {
        match self.kind {
            NodeKind::Style(style) => style,
            NodeKind::Header(level) => {
                let mut style = Style::bold();
                match level {
                    1 => style.reverse = true,
                    2 => style.underline = true,
                    _ => {}
                }
                style
            }
            _ => Style::new(),
        }
    }

    /// Walk the tree, assigning hole indices in document order.
    pub(crate) fn assign_holes(&mut self, next: &mut usize) {
        if let NodeKind::Hole(index) = &mut self.kind {
            *index = *next;
            *next += 1;
        }
        for child in &mut self.children {
            child.assign_holes(next);
        }
    }

    /// Total number of holes in the tree.
    pub fn hole_count(&self) -> usize {
        let own = usize::from(matches!(self.kind, NodeKind::Hole(_)));
        own + self.children.iter().map(Node::hole_count).sum::<usize>()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
