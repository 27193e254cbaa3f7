//! Overlay positioner: screen-space anchors for floating controls.
//!
//! Derives anchor points for the contextual quick-action control and, for
//! editable text, the format toolbar, from the selected node's on-screen
//! bounds. Anchors are recomputed on every move/scale/rotate of the selected
//! node so overlays track it live. System nodes never produce overlays.

use crate::camera::Camera;
use crate::scene::{NodeVisual, SceneNode};
use kurbo::{Point, Rect, Size};

/// Distance above the node's top edge where the quick-action control sits,
/// clearing the rotation handle.
pub const QUICK_ACTION_OFFSET: f64 = 56.0;

/// Fixed vertical position of the format toolbar on the render surface.
pub const FORMAT_TOOLBAR_Y: f64 = 695.0;

/// Screen-space anchor points for the floating controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayAnchors {
    /// Centered above the selected node's top edge.
    pub quick_action: Point,
    /// Fixed region of the surface; present only for editable text.
    pub format_toolbar: Option<Point>,
}

/// Compute the node's bounding rectangle in screen coordinates.
pub fn screen_bounds(node: &SceneNode, camera: &Camera) -> Rect {
    let bounds = node.rotated_bounds();
    let top_left = camera.scene_to_screen(Point::new(bounds.x0, bounds.y0));
    let bottom_right = camera.scene_to_screen(Point::new(bounds.x1, bounds.y1));
    Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
}

/// Derive overlay anchors for a selected node.
///
/// Returns `None` for system nodes, which are never selectable.
pub fn anchors_for(node: &SceneNode, camera: &Camera, viewport: Size) -> Option<OverlayAnchors> {
    if node.is_system() {
        return None;
    }

    let bounds = screen_bounds(node, camera);
    let quick_action = Point::new(
        bounds.x0 + bounds.width() / 2.0,
        bounds.y0 - QUICK_ACTION_OFFSET,
    );

    let format_toolbar = match &node.visual {
        NodeVisual::Label(_) => Some(Point::new(viewport.width / 2.0, FORMAT_TOOLBAR_Y)),
        _ => None,
    };

    Some(OverlayAnchors {
        quick_action,
        format_toolbar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, FontSpec};
    use crate::scene::{Label, NodeRole, Photo};
    use kurbo::Vec2;

    fn label_node() -> SceneNode {
        SceneNode::content(
            ElementId::new("t"),
            Point::new(200.0, 150.0),
            NodeVisual::Label(Label::new("hello", FontSpec::default())),
        )
    }

    #[test]
    fn test_quick_action_sits_above_top_edge() {
        let node = label_node();
        let camera = Camera::new();
        let anchors =
            anchors_for(&node, &camera, Size::new(800.0, 600.0)).expect("anchors");

        let bounds = node.rotated_bounds();
        assert!((anchors.quick_action.x - 200.0).abs() < 1e-9);
        assert!((anchors.quick_action.y - (bounds.y0 - QUICK_ACTION_OFFSET)).abs() < 1e-9);
    }

    #[test]
    fn test_anchors_track_camera() {
        let node = label_node();
        let mut camera = Camera::new();
        let viewport = Size::new(800.0, 600.0);
        let before = anchors_for(&node, &camera, viewport).expect("anchors");

        camera.pan(Vec2::new(30.0, -10.0));
        let after = anchors_for(&node, &camera, viewport).expect("anchors");
        assert!((after.quick_action.x - before.quick_action.x - 30.0).abs() < 1e-9);
        assert!((after.quick_action.y - before.quick_action.y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_toolbar_only_for_labels() {
        let camera = Camera::new();
        let viewport = Size::new(800.0, 600.0);

        let label = label_node();
        let anchors = anchors_for(&label, &camera, viewport).expect("anchors");
        assert_eq!(
            anchors.format_toolbar,
            Some(Point::new(400.0, FORMAT_TOOLBAR_Y))
        );

        let shape = SceneNode::content(
            ElementId::new("s"),
            Point::new(0.0, 0.0),
            NodeVisual::Composite(crate::scene::Composite {
                children: Vec::new(),
                natural_size: Size::new(10.0, 10.0),
                display_factor: 2.0,
                markup: String::new(),
            }),
        );
        let anchors = anchors_for(&shape, &camera, viewport).expect("anchors");
        assert_eq!(anchors.format_toolbar, None);
    }

    #[test]
    fn test_system_nodes_produce_no_overlay() {
        let camera = Camera::new();
        let backdrop = SceneNode::system(
            NodeRole::Backdrop,
            Point::new(100.0, 100.0),
            NodeVisual::Photo(Photo {
                natural_width: 100.0,
                natural_height: 100.0,
                display_scale: 1.0,
            }),
        );
        assert!(anchors_for(&backdrop, &camera, Size::new(800.0, 600.0)).is_none());
    }
}
