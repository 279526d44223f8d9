//! Layout tree types.
//!
//! A [`LayoutNode`] is a flexbox-like box: a direction, sizing constraints
//! per axis, padding, an optional border, and children. Children are
//! uniform [`Content`] values — nested nodes, plain text, or a reactive
//! cell resolved at measure/draw time (whose value may itself be a layout
//! node, as conditional views typically are).
//!
//! Nodes are shared as [`Layout`] (`Arc<LayoutNode>`); the geometry computed
//! by the last measure/draw pass lives behind a lock so a shared tree can be
//! re-measured every frame.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::reactive::{DerivedCell, Gettable, StateCell, ToValue, Value};

// ---------------------------------------------------------------------------
// Direction and sizing
// ---------------------------------------------------------------------------

/// Main-axis orientation of a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// How a node is sized along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Sized by content.
    Auto,
    /// A fixed number of cells.
    Fixed(i32),
    /// A weighted share of the space left after fixed and auto siblings.
    Flex(i32),
}

/// Fixed size in cells.
pub fn fixed(cells: i32) -> Sizing {
    Sizing::Fixed(cells)
}

/// Flexible size with the given weight.
pub fn flex(weight: i32) -> Sizing {
    Sizing::Flex(weight)
}

/// Content-determined size.
pub fn auto() -> Sizing {
    Sizing::Auto
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// A shared, immutable layout subtree.
pub type Layout = Arc<LayoutNode>;

/// A child of a layout node.
pub enum Content {
    /// A nested layout node.
    Node(Layout),
    /// Literal text, drawn with default style.
    Text(String),
    /// A reactive value resolved on every measure/draw pass. Reading it
    /// subscribes the running render effect.
    Dynamic(Arc<dyn Gettable>),
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Content::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Content::Dynamic(_) => f.debug_tuple("Dynamic").field(&"<dyn Gettable>").finish(),
        }
    }
}

/// A [`Content`] with any reactive indirection peeled off.
pub(crate) enum Resolved {
    Node(Layout),
    Text(String),
}

impl Content {
    pub(crate) fn resolve(&self) -> Resolved {
        match self {
            Content::Node(node) => Resolved::Node(node.clone()),
            Content::Text(text) => Resolved::Text(text.clone()),
            Content::Dynamic(cell) => match cell.get_value() {
                Value::Layout(node) => Resolved::Node(node),
                Value::Text(text) => Resolved::Text(text),
            },
        }
    }
}

/// Conversion into layout content. Implemented for nodes, strings, numbers,
/// and reactive cells.
pub trait IntoContent {
    fn into_content(self) -> Content;
}

impl IntoContent for Content {
    fn into_content(self) -> Content {
        self
    }
}

impl IntoContent for LayoutNode {
    fn into_content(self) -> Content {
        Content::Node(Arc::new(self))
    }
}

impl IntoContent for Layout {
    fn into_content(self) -> Content {
        Content::Node(self)
    }
}

macro_rules! impl_into_content_via_display {
    ($($ty:ty),* $(,)?) => {
        $(impl IntoContent for $ty {
            fn into_content(self) -> Content {
                Content::Text(self.to_string())
            }
        })*
    };
}

impl_into_content_via_display!(
    String, &str, bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64,
);

impl<T> IntoContent for StateCell<T>
where
    T: ToValue + Clone + Send + Sync + 'static,
{
    fn into_content(self) -> Content {
        Content::Dynamic(Arc::new(self))
    }
}

impl<T> IntoContent for DerivedCell<T>
where
    T: ToValue + Clone + Send + Sync + 'static,
{
    fn into_content(self) -> Content {
        Content::Dynamic(Arc::new(self))
    }
}

// ---------------------------------------------------------------------------
// LayoutNode
// ---------------------------------------------------------------------------

/// Geometry produced by the last measure/draw pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct Geometry {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Per-child (w, h), in child order.
    pub child_sizes: Vec<(i32, i32)>,
}

/// A box in the layout tree. Build with [`row`](crate::layout::row),
/// [`col`](crate::layout::col), or [`boxed`](crate::layout::boxed), then
/// shape with the builder methods.
pub struct LayoutNode {
    pub direction: Direction,
    pub width: Sizing,
    pub height: Sizing,
    pub padding: i32,
    pub border: bool,
    pub children: Vec<Content>,
    pub(crate) geom: Mutex<Geometry>,
}

impl std::fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutNode")
            .field("direction", &self.direction)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("padding", &self.padding)
            .field("border", &self.border)
            .field("children", &self.children)
            .field("geom", &self.geom)
            .finish()
    }
}

impl LayoutNode {
    pub(crate) fn new(direction: Direction, children: Vec<Content>) -> LayoutNode {
        LayoutNode {
            direction,
            width: Sizing::Auto,
            height: Sizing::Auto,
            padding: 0,
            border: false,
            children,
            geom: Mutex::new(Geometry::default()),
        }
    }

    /// Set both size constraints.
    pub fn with_size(mut self, width: Sizing, height: Sizing) -> LayoutNode {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_width(mut self, width: Sizing) -> LayoutNode {
        self.width = width;
        self
    }

    pub fn with_height(mut self, height: Sizing) -> LayoutNode {
        self.height = height;
        self
    }

    /// Wrap into a shareable [`Layout`].
    pub fn shared(self) -> Layout {
        Arc::new(self)
    }

    /// Size computed by the last measure pass.
    pub fn computed_size(&self) -> (i32, i32) {
        let geom = self.geom.lock();
        (geom.w, geom.h)
    }

    /// Position stored by the last draw pass.
    pub fn computed_position(&self) -> (i32, i32) {
        let geom = self.geom.lock();
        (geom.x, geom.y)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
