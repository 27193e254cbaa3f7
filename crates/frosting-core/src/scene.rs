//! Scene graph: nodes, the stage arena, and z-order.
//!
//! The stage is the imperative counterpart of the declarative element list.
//! Nodes live in an arena keyed by stable ids and are addressed only by id
//! across component boundaries; the explicit z-order vector is the single
//! place stacking is recorded. Ownership of content nodes is tracked solely
//! by the scene index, never by raw references.

use crate::element::{ArcSpec, DesignElement, ElementId, ElementPayload, FontSpec};
use crate::metrics;
use crate::paint::PaintColor;
use kurbo::{BezPath, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// Unique identifier for scene nodes.
pub type NodeId = Uuid;

/// Role of a node on the stage.
///
/// System roles (everything but `Content`) are engine-managed: unselectable,
/// excluded from hit-testing, and without a declarative counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// User content, mirrored from a design element.
    Content,
    /// One background grid line.
    Grid,
    /// The backdrop photo, pinned topmost.
    Backdrop,
    /// The plinth slab, pinned immediately beneath the backdrop.
    Base,
}

/// Geometry of one decomposed markup primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveGeometry {
    /// Free-form path, translated so its bounding-box center is the origin.
    Path(BezPath),
    Circle {
        radius: f64,
    },
    Rect {
        width: f64,
        height: f64,
        corner_radius: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
    },
}

/// One child of a composite node, anchored at its own center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Offset of the child's center from the composite center, unscaled.
    pub offset: Vec2,
    pub geometry: PrimitiveGeometry,
    pub fill: Option<PaintColor>,
    pub stroke: Option<PaintColor>,
}

/// Decomposed vector markup: a group of primitives anchored at its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub children: Vec<Primitive>,
    /// Unscaled union size of the children.
    pub natural_size: Size,
    /// Fixed display factor applied on top of the element scale.
    pub display_factor: f64,
    /// Source markup, retained so duplicates can be expressed declaratively.
    pub markup: String,
}

/// Editable plain text.
///
/// `source` keeps the user-intended casing; `display` is the case-transformed
/// string actually rendered. Edits mutate the source and re-derive the
/// display, so write-backs never lose the original casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    source: String,
    display: String,
    pub font: FontSpec,
}

impl Label {
    pub fn new(source: impl Into<String>, font: FontSpec) -> Self {
        let source = source.into();
        let display = font.transform.apply(&source);
        Self {
            source,
            display,
            font,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// Replace the source text and re-derive the display string.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.refresh_display();
    }

    /// Re-derive the display string after a font or transform change.
    pub fn refresh_display(&mut self) {
        self.display = self.font.transform.apply(&self.source);
    }

    fn extents(&self) -> (f64, f64) {
        metrics::text_extents(&self.display, self.font.size, self.font.letter_spacing)
    }
}

/// Bridge text: characters laid out along a parametric arch or triangle.
///
/// Serializes all curve parameters alongside the node transform, since the
/// curve is not representable by any plain primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub content: String,
    pub font: FontSpec,
    pub arc: ArcSpec,
    pub width: f64,
    pub height: f64,
}

/// The backdrop photo. Pixel data stays with the host; the node carries the
/// natural dimensions and derived display scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub natural_width: f64,
    pub natural_height: f64,
    pub display_scale: f64,
}

/// The plinth slab drawn under the backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plinth {
    pub width: f64,
    pub height: f64,
    pub fill: PaintColor,
}

/// One grid line, in absolute scene coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub start: Point,
    pub end: Point,
}

/// Renderable payload of a scene node, fixed at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeVisual {
    Composite(Composite),
    Label(Label),
    Bridge(Bridge),
    Photo(Photo),
    Plinth(Plinth),
    GridLine(GridLine),
}

/// A node on the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    /// Back-reference to the originating element; `None` for system nodes.
    pub element: Option<ElementId>,
    pub role: NodeRole,
    /// Position of the node's visual center in scene coordinates.
    pub position: Point,
    /// Rotation in degrees around the center.
    pub angle: f64,
    /// Uniform scale factor.
    pub scale: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Locked nodes refuse manipulation gestures.
    pub locked: bool,
    pub visual: NodeVisual,
}

impl SceneNode {
    /// Create a system node.
    pub fn system(role: NodeRole, position: Point, visual: NodeVisual) -> Self {
        debug_assert!(role != NodeRole::Content);
        Self {
            id: Uuid::new_v4(),
            element: None,
            role,
            position,
            angle: 0.0,
            scale: 1.0,
            flip_x: false,
            flip_y: false,
            locked: false,
            visual,
        }
    }

    /// Create a content node mirroring a design element.
    pub fn content(element: ElementId, position: Point, visual: NodeVisual) -> Self {
        Self {
            id: Uuid::new_v4(),
            element: Some(element),
            role: NodeRole::Content,
            position,
            angle: 0.0,
            scale: 1.0,
            flip_x: false,
            flip_y: false,
            locked: false,
            visual,
        }
    }

    /// True for engine-managed nodes (grid, backdrop, base).
    pub fn is_system(&self) -> bool {
        self.role != NodeRole::Content
    }

    /// True for nodes that get the finer text snap quantum and the
    /// center-preserving scale clamp.
    pub fn is_text_like(&self) -> bool {
        matches!(self.visual, NodeVisual::Label(_) | NodeVisual::Bridge(_))
    }

    /// Unscaled size of the visual.
    pub fn base_size(&self) -> Size {
        match &self.visual {
            NodeVisual::Composite(c) => Size::new(
                c.natural_size.width * c.display_factor,
                c.natural_size.height * c.display_factor,
            ),
            NodeVisual::Label(l) => {
                let (w, h) = l.extents();
                Size::new(w, h)
            }
            NodeVisual::Bridge(b) => Size::new(b.width, b.height),
            NodeVisual::Photo(p) => Size::new(
                p.natural_width * p.display_scale,
                p.natural_height * p.display_scale,
            ),
            NodeVisual::Plinth(p) => Size::new(p.width, p.height),
            NodeVisual::GridLine(line) => Size::new(
                (line.end.x - line.start.x).abs(),
                (line.end.y - line.start.y).abs(),
            ),
        }
    }

    /// Rendered size: base size times the uniform scale.
    pub fn size(&self) -> Size {
        let base = self.base_size();
        Size::new(base.width * self.scale, base.height * self.scale)
    }

    /// Axis-aligned bounds ignoring rotation, centered at `position`.
    pub fn bounds(&self) -> Rect {
        let size = self.size();
        Rect::from_center_size(self.position, size)
    }

    /// Axis-aligned bounding box of the rotated node.
    pub fn rotated_bounds(&self) -> Rect {
        if self.angle == 0.0 {
            return self.bounds();
        }
        let size = self.size();
        let (half_w, half_h) = (size.width / 2.0, size.height / 2.0);
        let rad = self.angle.to_radians();
        let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
        let w = half_w * cos + half_h * sin;
        let h = half_w * sin + half_h * cos;
        Rect::new(
            self.position.x - w,
            self.position.y - h,
            self.position.x + w,
            self.position.y + h,
        )
    }

    /// Check if a scene point hits this node's rotated bounds.
    pub fn hit_test(&self, point: Point) -> bool {
        self.rotated_bounds().contains(point)
    }

    /// Express this node as a declarative element under the given id.
    ///
    /// Used when duplicating: the clone's element is handed to the host so
    /// the declarative list and the stage stay in lockstep.
    pub fn to_element(&self, id: ElementId) -> Option<DesignElement> {
        let payload = match &self.visual {
            NodeVisual::Label(l) => ElementPayload::Text {
                content: l.source().to_string(),
                font: l.font.clone(),
            },
            NodeVisual::Composite(c) => ElementPayload::Shape {
                markup: c.markup.clone(),
            },
            NodeVisual::Bridge(b) => ElementPayload::BridgeText {
                content: b.content.clone(),
                font: b.font.clone(),
                arc: b.arc,
            },
            _ => return None,
        };
        Some(DesignElement {
            id,
            position: Some(self.position),
            angle: self.angle,
            scale: self.scale,
            payload,
        })
    }
}

/// One-time environment configuration.
///
/// Stand-in for patching the render library's global event-listener options
/// (passive wheel listeners) before any scene node exists. Idempotent: the
/// first call wins, later calls observe the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Wheel listeners are registered passive so scrolling never blocks.
    pub passive_wheel_listeners: bool,
}

static ENVIRONMENT: OnceLock<EnvironmentConfig> = OnceLock::new();

/// Configure the rendering environment, once.
pub fn configure_environment() -> &'static EnvironmentConfig {
    ENVIRONMENT.get_or_init(|| {
        log::debug!("configuring render environment (passive wheel listeners)");
        EnvironmentConfig {
            passive_wheel_listeners: true,
        }
    })
}

/// The render surface model: an arena of nodes plus explicit z-order.
#[derive(Debug, Clone)]
pub struct Stage {
    nodes: std::collections::HashMap<NodeId, SceneNode>,
    /// Z-order of nodes (back to front).
    z_order: Vec<NodeId>,
    /// Viewport size in scene units; zero until the surface is initialized.
    viewport: Size,
    /// Coalesced repaint request.
    needs_repaint: bool,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// Create an empty stage. Configures the environment on first use.
    pub fn new() -> Self {
        configure_environment();
        Self {
            nodes: std::collections::HashMap::new(),
            z_order: Vec::new(),
            viewport: Size::ZERO,
            needs_repaint: false,
        }
    }

    /// True once the surface has valid dimensions.
    pub fn is_ready(&self) -> bool {
        self.viewport.width > 0.0 && self.viewport.height > 0.0
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    /// Center of the currently visible canvas.
    pub fn visible_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Add a node on top of the stack, returning its id.
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        self.z_order.push(id);
        self.needs_repaint = true;
        id
    }

    /// Add a node at a specific stack index (clamped).
    pub fn insert_at(&mut self, index: usize, node: SceneNode) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        let index = index.min(self.z_order.len());
        self.z_order.insert(index, id);
        self.needs_repaint = true;
        id
    }

    /// Remove a node from the stage.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        self.z_order.retain(|&node_id| node_id != id);
        let removed = self.nodes.remove(&id);
        if removed.is_some() {
            self.needs_repaint = true;
        }
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stack index of a node (0 = backmost).
    pub fn z_index_of(&self, id: NodeId) -> Option<usize> {
        self.z_order.iter().position(|&node_id| node_id == id)
    }

    /// Move a node to a specific stack index.
    pub fn move_to(&mut self, id: NodeId, index: usize) {
        if !self.nodes.contains_key(&id) {
            return;
        }
        self.z_order.retain(|&node_id| node_id != id);
        let index = index.min(self.z_order.len());
        self.z_order.insert(index, id);
        self.needs_repaint = true;
    }

    /// Bring a node to the front (topmost).
    pub fn bring_to_front(&mut self, id: NodeId) {
        if !self.nodes.contains_key(&id) {
            return;
        }
        self.z_order.retain(|&node_id| node_id != id);
        self.z_order.push(id);
        self.needs_repaint = true;
    }

    /// Send a node to the back (bottommost).
    pub fn send_to_back(&mut self, id: NodeId) {
        if !self.nodes.contains_key(&id) {
            return;
        }
        self.z_order.retain(|&node_id| node_id != id);
        self.z_order.insert(0, id);
        self.needs_repaint = true;
    }

    /// Nodes in z-order (back to front).
    pub fn nodes_ordered(&self) -> impl Iterator<Item = &SceneNode> {
        self.z_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Ids in z-order (back to front).
    pub fn z_order(&self) -> &[NodeId] {
        &self.z_order
    }

    /// Find the single node with the given system role, if present.
    pub fn find_role(&self, role: NodeRole) -> Option<NodeId> {
        self.z_order
            .iter()
            .find(|id| self.nodes.get(*id).is_some_and(|n| n.role == role))
            .copied()
    }

    /// All grid-line node ids.
    pub fn grid_ids(&self) -> Vec<NodeId> {
        self.z_order
            .iter()
            .filter(|id| self.nodes.get(*id).is_some_and(|n| n.role == NodeRole::Grid))
            .copied()
            .collect()
    }

    /// Topmost content node at a scene point. System nodes never hit.
    pub fn content_at(&self, point: Point) -> Option<NodeId> {
        self.z_order
            .iter()
            .rev()
            .find(|id| {
                self.nodes
                    .get(*id)
                    .is_some_and(|n| n.role == NodeRole::Content && n.hit_test(point))
            })
            .copied()
    }

    /// Request a repaint. Any number of requests within a frame coalesce
    /// into at most one repaint.
    pub fn request_repaint(&mut self) {
        self.needs_repaint = true;
    }

    /// Whether a repaint is currently pending.
    pub fn repaint_pending(&self) -> bool {
        self.needs_repaint
    }

    /// Consume the pending repaint request, if any. Called once per frame.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.needs_repaint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::FontSpec;

    fn label_node(id: &str) -> SceneNode {
        SceneNode::content(
            ElementId::new(id),
            Point::new(100.0, 100.0),
            NodeVisual::Label(Label::new("hello", FontSpec::default())),
        )
    }

    #[test]
    fn test_insert_and_remove() {
        let mut stage = Stage::new();
        let id = stage.insert(label_node("a"));
        assert_eq!(stage.len(), 1);
        assert!(stage.remove(id).is_some());
        assert!(stage.is_empty());
        assert!(stage.z_order().is_empty());
    }

    #[test]
    fn test_z_order_ops() {
        let mut stage = Stage::new();
        let a = stage.insert(label_node("a"));
        let b = stage.insert(label_node("b"));
        assert_eq!(stage.z_order(), &[a, b]);

        stage.bring_to_front(a);
        assert_eq!(stage.z_order(), &[b, a]);

        stage.send_to_back(a);
        assert_eq!(stage.z_order(), &[a, b]);

        stage.move_to(b, 0);
        assert_eq!(stage.z_order(), &[b, a]);
    }

    #[test]
    fn test_repaint_coalescing() {
        let mut stage = Stage::new();
        stage.request_repaint();
        stage.request_repaint();
        stage.request_repaint();
        assert!(stage.take_repaint());
        assert!(!stage.take_repaint());
    }

    #[test]
    fn test_content_at_ignores_system_nodes() {
        let mut stage = Stage::new();
        let backdrop = SceneNode::system(
            NodeRole::Backdrop,
            Point::new(100.0, 100.0),
            NodeVisual::Photo(Photo {
                natural_width: 400.0,
                natural_height: 400.0,
                display_scale: 1.0,
            }),
        );
        stage.insert(backdrop);
        assert_eq!(stage.content_at(Point::new(100.0, 100.0)), None);

        let content = stage.insert(label_node("a"));
        assert_eq!(stage.content_at(Point::new(100.0, 100.0)), Some(content));
    }

    #[test]
    fn test_rotated_bounds_grow() {
        let mut node = label_node("a");
        node.angle = 45.0;
        let flat = node.bounds();
        let rotated = node.rotated_bounds();
        assert!(rotated.width() > flat.width() - 1e-9);
    }

    #[test]
    fn test_environment_configured_once() {
        let a = configure_environment();
        let b = configure_environment();
        assert!(std::ptr::eq(a, b));
        assert!(a.passive_wheel_listeners);
    }

    #[test]
    fn test_label_case_transform_tracks_source() {
        let mut font = FontSpec::default();
        font.transform = crate::element::CaseTransform::Uppercase;
        let mut label = Label::new("Happy", font);
        assert_eq!(label.display(), "HAPPY");
        assert_eq!(label.source(), "Happy");

        label.set_source("Happy 30th");
        assert_eq!(label.display(), "HAPPY 30TH");
        assert_eq!(label.source(), "Happy 30th");
    }

    #[test]
    fn test_bridge_serializes_curve_parameters() {
        let node = SceneNode::content(
            ElementId::new("b"),
            Point::new(0.0, 0.0),
            NodeVisual::Bridge(Bridge {
                content: "Arch".to_string(),
                font: FontSpec::default(),
                arc: ArcSpec {
                    curve: 120.0,
                    offset_y: 40.0,
                    text_height: 90.0,
                    bottom: 180.0,
                    triangle: true,
                },
                width: 300.0,
                height: 150.0,
            }),
        );
        let json = serde_json::to_string(&node).expect("serialize");
        assert!(json.contains("\"curve\":120.0"));
        assert!(json.contains("\"triangle\":true"));
        assert!(json.contains("\"angle\":0.0"));
    }
}
