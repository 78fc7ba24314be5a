use crate::overlay::OverlayOp;

/// Handle for a host page node. The host assigns these; identity follows the
/// node itself, never its position in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Axis-aligned box in document coordinates. Document coordinates keep
/// overlay anchors valid regardless of the scroll position at render time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PageRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Compare two boxes ignoring sub-epsilon jitter from layout rounding.
    pub fn approx_eq(&self, other: &PageRect, epsilon: f32) -> bool {
        (self.left - other.left).abs() <= epsilon
            && (self.top - other.top).abs() <= epsilon
            && (self.right - other.right).abs() <= epsilon
            && (self.bottom - other.bottom).abs() <= epsilon
    }
}

/// Everything element classification needs to know about a node at one
/// point in time. Snapshots are recomputed per scan; nothing here is cached
/// across scans because pages mutate attributes dynamically.
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    pub tag: String,
    pub role: Option<String>,
    /// Accessible text alternative (alt attribute, aria-label, ...).
    pub accessible_text: Option<String>,
    /// Whether the node bears image content (img/picture/canvas or a
    /// background image).
    pub image_bearing: bool,
    /// Natively interactive: links with href, buttons, inputs, selects, ...
    pub interactive: bool,
    /// display:none or visibility:hidden.
    pub hidden: bool,
    pub rect: PageRect,
    pub attached: bool,
}

/// Seam between the engine and the host page. All DOM reads and writes go
/// through this trait so the engine can run headlessly under test.
///
/// Overlay mutations mount nodes owned by the engine; implementations must
/// never alter the host page's own nodes or event handlers.
pub trait DomAdapter {
    /// Node handles in document order (pre-order traversal).
    fn nodes_in_document_order(&self) -> Vec<NodeId>;

    /// Snapshot a node, or `None` when it is detached or unreadable.
    fn snapshot(&self, node: NodeId) -> Option<NodeSnapshot>;

    fn scroll_into_view(&self, node: NodeId);

    /// Dispatch the node's native activation (click/submit equivalent).
    fn activate(&self, node: NodeId);

    /// Raw image bytes for an image-bearing node, if retrievable.
    fn fetch_image(&self, node: NodeId) -> Option<Vec<u8>>;

    fn apply_overlay(&self, op: &OverlayOp);

    /// Apply or remove the page-wide contrast stylesheet.
    fn set_contrast_fix(&self, enabled: bool);

    /// False while the document cannot be attached to at all.
    fn document_ready(&self) -> bool {
        true
    }
}
