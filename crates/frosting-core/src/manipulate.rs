//! Manipulation handlers: move, scale and rotate gestures.
//!
//! Handlers operate on one node at a time, driven by begin/update/end events.
//! Dragging is free of snapping until the gesture ends so the object follows
//! the pointer exactly; rotation quantizes live. All entry points validate
//! their inputs and return errors instead of panicking, so the editor's
//! gesture boundary can restore the last known-good state and force one
//! resynchronizing repaint.

use crate::element::ElementId;
use crate::scene::SceneNode;
use crate::snap;
use kurbo::Point;
use thiserror::Error;

/// Minimum rendered size on either axis after a scale gesture.
pub const MIN_RENDERED_SIZE: f64 = 20.0;

/// Offset applied to duplicated nodes.
pub const DUPLICATE_OFFSET: f64 = 40.0;

/// Kind of an active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Scale,
    Rotate,
}

/// Transform snapshot taken at gesture begin, restored on handler failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSnapshot {
    pub position: Point,
    pub angle: f64,
    pub scale: f64,
}

impl TransformSnapshot {
    pub fn of(node: &SceneNode) -> Self {
        Self {
            position: node.position,
            angle: node.angle,
            scale: node.scale,
        }
    }

    pub fn restore(&self, node: &mut SceneNode) {
        node.position = self.position;
        node.angle = self.angle;
        node.scale = self.scale;
    }
}

/// State of the active gesture.
#[derive(Debug, Clone)]
pub struct GestureState {
    pub kind: GestureKind,
    pub element: ElementId,
    pub original: TransformSnapshot,
}

/// Manipulation failures.
#[derive(Debug, Error)]
pub enum ManipulationError {
    #[error("no scene node for element {0}")]
    MissingNode(ElementId),
    #[error("no active gesture")]
    NoGesture,
    #[error("gesture kind mismatch")]
    WrongGesture,
    #[error("non-finite input: {0}")]
    NonFinite(f64),
}

fn ensure_finite(value: f64) -> Result<f64, ManipulationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ManipulationError::NonFinite(value))
    }
}

/// Continuous move update: the node follows the pointer exactly.
pub fn apply_move(node: &mut SceneNode, position: Point) -> Result<(), ManipulationError> {
    ensure_finite(position.x)?;
    ensure_finite(position.y)?;
    node.position = position;
    Ok(())
}

/// Snap the node's position on move end.
///
/// Non-text nodes always snap to the quantum. Text-like nodes use a quantum
/// four times finer plus a dead-zone, so fine placement never visibly jumps
/// while deliberate alignment still lands exactly.
pub fn finish_move(node: &mut SceneNode, quantum: f64) {
    if node.is_text_like() {
        let text_quantum = snap::text_quantum(quantum);
        node.position = Point::new(
            snap::snap_text_coord(node.position.x, text_quantum),
            snap::snap_text_coord(node.position.y, text_quantum),
        );
    } else {
        node.position = Point::new(
            snap::snap_coord(node.position.x, quantum),
            snap::snap_coord(node.position.y, quantum),
        );
    }
}

/// Continuous scale update.
///
/// Text-like nodes scale around their visual center; other nodes keep their
/// top-left corner fixed, matching how a corner-handle drag behaves.
pub fn apply_scale(node: &mut SceneNode, scale: f64) -> Result<(), ManipulationError> {
    let scale = ensure_finite(scale)?;
    if scale <= 0.0 {
        return Err(ManipulationError::NonFinite(scale));
    }
    if node.is_text_like() {
        node.scale = scale;
    } else {
        let old_bounds = node.bounds();
        node.scale = scale;
        let new_size = node.size();
        node.position = Point::new(
            old_bounds.x0 + new_size.width / 2.0,
            old_bounds.y0 + new_size.height / 2.0,
        );
    }
    Ok(())
}

/// Enforce the minimum rendered size on scale end.
///
/// Clamps the scale factor so both axes render at least
/// [`MIN_RENDERED_SIZE`] units; the binding axis ends at exactly that size.
/// Text-like nodes keep their visual center through the clamp; other nodes
/// keep their top-left corner.
pub fn finish_scale(node: &mut SceneNode) {
    let base = node.base_size();
    if base.width <= 0.0 || base.height <= 0.0 {
        return;
    }
    let required = (MIN_RENDERED_SIZE / base.width).max(MIN_RENDERED_SIZE / base.height);
    if node.scale >= required {
        return;
    }

    if node.is_text_like() {
        node.scale = required;
    } else {
        let old_bounds = node.bounds();
        node.scale = required;
        let new_size = node.size();
        node.position = Point::new(
            old_bounds.x0 + new_size.width / 2.0,
            old_bounds.y0 + new_size.height / 2.0,
        );
    }
}

/// Continuous rotation update, quantized live to 15° increments so the user
/// sees snapped rotation while dragging, not only on release.
pub fn apply_rotation(node: &mut SceneNode, angle_degrees: f64) -> Result<(), ManipulationError> {
    let angle = ensure_finite(angle_degrees)?;
    node.angle = snap::snap_angle(angle);
    Ok(())
}
