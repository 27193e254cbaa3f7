//! Editor facade: selection, gestures, edit sessions and surface state.
//!
//! Owns the stage, the scene index and the camera, and exposes the
//! imperative surface the host application drives. All mutation happens on
//! the host's UI execution context; every entry point leaves the stage and
//! the index mutually consistent before returning, and repaint requests
//! coalesce so any number of mutations within a frame produce at most one
//! repaint.

use crate::camera::Camera;
use crate::element::{ArcPatch, DesignElement, ElementId, ElementKind, TextPatch};
use crate::events::{EditorEvent, EventOutbox, TextSelection};
use crate::index::SceneIndex;
use crate::layering;
use crate::manipulate::{
    self, GestureKind, GestureState, ManipulationError, TransformSnapshot, DUPLICATE_OFFSET,
};
use crate::overlay::{self, OverlayAnchors};
use crate::scene::{NodeVisual, SceneNode, Stage};
use crate::snap;
use kurbo::{Point, Size, Vec2};
use uuid::Uuid;

/// How many frames an element add waits for the surface to become ready
/// before it is abandoned.
pub const SURFACE_WAIT_FRAMES: u32 = 120;

/// An element add waiting for the surface to report valid dimensions.
#[derive(Debug, Clone)]
pub(crate) struct PendingAdd {
    pub(crate) element: DesignElement,
    pub(crate) frames_left: u32,
}

/// The scene synchronization and manipulation engine.
pub struct Editor {
    pub(crate) stage: Stage,
    pub(crate) index: SceneIndex,
    pub(crate) camera: Camera,
    pub(crate) grid_size: f64,
    pub(crate) backdrop: Option<(f64, f64)>,
    pub(crate) selection: Option<ElementId>,
    pub(crate) gesture: Option<GestureState>,
    pub(crate) editing: Option<ElementId>,
    pub(crate) pending: Vec<PendingAdd>,
    pub(crate) outbox: EventOutbox,
}

impl Editor {
    /// Create an editor with the given grid spacing.
    pub fn new(grid_size: f64) -> Self {
        Self {
            stage: Stage::new(),
            index: SceneIndex::new(),
            camera: Camera::new(),
            grid_size,
            backdrop: None,
            selection: None,
            gesture: None,
            editing: None,
            pending: Vec::new(),
            outbox: EventOutbox::new(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Update the grid spacing and regenerate the grid.
    pub fn set_grid_size(&mut self, grid_size: f64) {
        self.grid_size = grid_size;
        layering::regenerate_grid(&mut self.stage, self.grid_size);
        layering::assert_layering(&mut self.stage);
        self.stage.request_repaint();
    }

    /// Resize the render surface and re-derive all surface-dependent
    /// geometry (grid, backdrop, plinth, layering).
    pub fn set_viewport(&mut self, size: Size) {
        self.stage.set_viewport(size);
        self.refresh_surface();
    }

    /// Set (or replace) the backdrop photo by its natural pixel dimensions.
    pub fn set_backdrop(&mut self, natural_width: f64, natural_height: f64) {
        self.backdrop = Some((natural_width, natural_height));
        self.refresh_surface();
    }

    fn refresh_surface(&mut self) {
        layering::regenerate_grid(&mut self.stage, self.grid_size);
        if let Some((width, height)) = self.backdrop {
            layering::install_backdrop(&mut self.stage, width, height);
        }
        layering::assert_layering(&mut self.stage);
        self.stage.request_repaint();
    }

    /// Center of the currently visible canvas, where new elements without an
    /// explicit position are placed.
    pub fn visible_center(&self) -> Point {
        self.stage.visible_center()
    }

    /// Top edge of the backdrop plinth, for overlay alignment (e.g. a ruler).
    pub fn base_top_y(&self) -> Option<f64> {
        layering::backdrop_top_y(&self.stage)
    }

    /// Advance one frame: retry queued adds and consume the coalesced
    /// repaint request. Returns true when a repaint is due.
    pub fn tick_frame(&mut self) -> bool {
        if !self.pending.is_empty() {
            if self.stage.is_ready() {
                let pending = std::mem::take(&mut self.pending);
                for add in pending {
                    self.create_node(&add.element);
                }
            } else {
                for add in &mut self.pending {
                    add.frames_left = add.frames_left.saturating_sub(1);
                }
                self.pending.retain(|add| {
                    if add.frames_left == 0 {
                        log::warn!(
                            "abandoning element {}: surface never became ready",
                            add.element.id
                        );
                        false
                    } else {
                        true
                    }
                });
            }
        }
        self.stage.take_repaint()
    }

    /// Take all pending host notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.outbox.drain()
    }

    // ---- selection -------------------------------------------------------

    /// Select an element (or clear the selection with `None`).
    ///
    /// Emits the text-selection notification for property panels: a snapshot
    /// for editable text, `None` for anything else.
    pub fn select(&mut self, id: Option<ElementId>) {
        let resolved = id.filter(|id| self.index.contains(id));
        self.selection = resolved;
        self.notify_text_selection();
        self.stage.request_repaint();
    }

    /// Select whatever content node is topmost at a scene point.
    pub fn select_at(&mut self, point: Point) {
        let id = self
            .stage
            .content_at(point)
            .and_then(|node_id| self.stage.get(node_id))
            .and_then(|node| node.element.clone());
        self.select(id);
    }

    pub fn selected(&self) -> Option<&ElementId> {
        self.selection.as_ref()
    }

    fn notify_text_selection(&mut self) {
        let snapshot = self.selection.as_ref().and_then(|id| {
            let node = self.index.get(id).and_then(|n| self.stage.get(n))?;
            match &node.visual {
                NodeVisual::Label(label) => Some(TextSelection {
                    id: id.clone(),
                    kind: ElementKind::Text,
                    content: label.source().to_string(),
                    font: label.font.clone(),
                }),
                _ => None,
            }
        });
        self.outbox.push(EditorEvent::TextSelectionChanged(snapshot));
    }

    /// Overlay anchors for the current selection, tracking the camera.
    pub fn overlay(&self) -> Option<OverlayAnchors> {
        let id = self.selection.as_ref()?;
        let node = self.index.get(id).and_then(|n| self.stage.get(n))?;
        overlay::anchors_for(node, &self.camera, self.stage.viewport())
    }

    fn selected_node_id(&self) -> Option<crate::scene::NodeId> {
        self.selection.as_ref().and_then(|id| self.index.get(id))
    }

    // ---- element actions -------------------------------------------------

    /// Delete the selected element: removes its node, drops the index entry
    /// and notifies the host.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selection.take() else {
            return false;
        };
        if let Some(node_id) = self.index.remove(&id) {
            self.stage.remove(node_id);
        }
        if self.editing.as_ref() == Some(&id) {
            self.editing = None;
        }
        self.gesture = None;
        layering::assert_layering(&mut self.stage);
        self.outbox.push(EditorEvent::ElementRemoved(id));
        self.notify_text_selection();
        self.stage.request_repaint();
        true
    }

    /// Duplicate the selected element under a freshly minted id, offset from
    /// its source, and select the clone. The clone's declarative form is
    /// handed to the host via `ElementAdded`.
    pub fn duplicate_selected(&mut self) -> Option<ElementId> {
        let node_id = self.selected_node_id()?;
        let source = self.stage.get(node_id)?.clone();

        let new_id = ElementId::mint();
        let mut clone = source;
        clone.id = Uuid::new_v4();
        clone.element = Some(new_id.clone());
        clone.position += Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        clone.locked = false;

        let element = clone.to_element(new_id.clone())?;
        let inserted = self.stage.insert(clone);
        layering::place_new_content(&mut self.stage, inserted);
        self.index.insert(new_id.clone(), inserted);

        self.outbox.push(EditorEvent::ElementAdded(element));
        self.select(Some(new_id.clone()));
        Some(new_id)
    }

    /// Mirror the selected node horizontally.
    pub fn flip_selected_horizontal(&mut self) {
        if let Some(node_id) = self.selected_node_id() {
            if let Some(node) = self.stage.get_mut(node_id) {
                node.flip_x = !node.flip_x;
            }
            self.stage.request_repaint();
        }
    }

    /// Mirror the selected node vertically.
    pub fn flip_selected_vertical(&mut self) {
        if let Some(node_id) = self.selected_node_id() {
            if let Some(node) = self.stage.get_mut(node_id) {
                node.flip_y = !node.flip_y;
            }
            self.stage.request_repaint();
        }
    }

    /// Toggle the lock flag on the selected node. Locked nodes refuse
    /// manipulation gestures. Returns the new locked state.
    pub fn toggle_locked_selected(&mut self) -> Option<bool> {
        let node_id = self.selected_node_id()?;
        let node = self.stage.get_mut(node_id)?;
        node.locked = !node.locked;
        let locked = node.locked;
        self.stage.request_repaint();
        Some(locked)
    }

    // ---- gestures --------------------------------------------------------

    /// Begin a manipulation gesture on the selected node.
    ///
    /// Returns false when nothing is selected or the node is locked.
    pub fn begin_gesture(&mut self, kind: GestureKind) -> bool {
        let Some(element) = self.selection.clone() else {
            return false;
        };
        let Some(node) = self.index.get(&element).and_then(|n| self.stage.get(n)) else {
            return false;
        };
        if node.locked {
            return false;
        }
        self.gesture = Some(GestureState {
            kind,
            element,
            original: TransformSnapshot::of(node),
        });
        true
    }

    /// Continuous move update: the node follows the pointer exactly, no
    /// snapping until the gesture ends.
    pub fn move_update(&mut self, position: Point) {
        if self.gesture.is_none() {
            return;
        }
        self.guarded(|editor| {
            let node = editor.gesture_node(GestureKind::Move)?;
            manipulate::apply_move(node, position)?;
            editor.stage.request_repaint();
            Ok(())
        });
    }

    /// Continuous scale update.
    pub fn scale_update(&mut self, scale: f64) {
        if self.gesture.is_none() {
            return;
        }
        self.guarded(|editor| {
            let node = editor.gesture_node(GestureKind::Scale)?;
            manipulate::apply_scale(node, scale)?;
            editor.stage.request_repaint();
            Ok(())
        });
    }

    /// Continuous rotation update, quantized live to 15° increments.
    pub fn rotate_update(&mut self, angle_degrees: f64) {
        if self.gesture.is_none() {
            return;
        }
        self.guarded(|editor| {
            let node = editor.gesture_node(GestureKind::Rotate)?;
            manipulate::apply_rotation(node, angle_degrees)?;
            editor.stage.request_repaint();
            Ok(())
        });
    }

    /// End the active gesture: apply end-of-gesture snapping/clamping and
    /// commit the resulting geometry to the declarative list.
    pub fn end_gesture(&mut self) {
        if self.gesture.is_none() {
            return;
        }
        self.guarded(|editor| {
            let Some(state) = editor.gesture.take() else {
                return Err(ManipulationError::NoGesture);
            };
            let quantum = snap::snap_quantum(editor.grid_size, editor.camera.zoom);
            let node_id = editor
                .index
                .get(&state.element)
                .ok_or_else(|| ManipulationError::MissingNode(state.element.clone()))?;
            let node = editor
                .stage
                .get_mut(node_id)
                .ok_or_else(|| ManipulationError::MissingNode(state.element.clone()))?;

            match state.kind {
                GestureKind::Move => manipulate::finish_move(node, quantum),
                GestureKind::Scale => manipulate::finish_scale(node),
                GestureKind::Rotate => {}
            }

            editor.outbox.push(EditorEvent::ElementCommitted {
                id: state.element,
                x: node.position.x,
                y: node.position.y,
                angle: node.angle,
                scale: node.scale,
            });
            editor.stage.request_repaint();
            Ok(())
        });
    }

    fn gesture_node(
        &mut self,
        expected: GestureKind,
    ) -> Result<&mut SceneNode, ManipulationError> {
        let state = self.gesture.as_ref().ok_or(ManipulationError::NoGesture)?;
        if state.kind != expected {
            return Err(ManipulationError::WrongGesture);
        }
        let element = state.element.clone();
        let node_id = self
            .index
            .get(&element)
            .ok_or_else(|| ManipulationError::MissingNode(element.clone()))?;
        self.stage
            .get_mut(node_id)
            .ok_or(ManipulationError::MissingNode(element))
    }

    /// Defensive boundary around every manipulation handler: a failure never
    /// propagates; the node is restored to its gesture-start transform, the
    /// failure is logged, and one full repaint resynchronizes the visual
    /// output. The gesture becomes a no-op for the declarative list.
    fn guarded(&mut self, op: impl FnOnce(&mut Self) -> Result<(), ManipulationError>) {
        if let Err(err) = op(self) {
            log::warn!("manipulation handler failed: {err}; forcing full repaint");
            if let Some(state) = self.gesture.take() {
                if let Some(node) = self
                    .index
                    .get(&state.element)
                    .and_then(|id| self.stage.get_mut(id))
                {
                    state.original.restore(node);
                }
            }
            self.stage.request_repaint();
        }
    }

    // ---- text editing ----------------------------------------------------

    /// Enter a text edit session on the selected editable text node.
    ///
    /// Pushes the current text to the declarative list immediately so
    /// external observers are in sync from the start of the session.
    pub fn begin_text_edit(&mut self) -> bool {
        let Some(id) = self.selection.clone() else {
            return false;
        };
        let Some(node) = self.index.get(&id).and_then(|n| self.stage.get(n)) else {
            return false;
        };
        let NodeVisual::Label(label) = &node.visual else {
            return false;
        };
        let content = label.source().to_string();
        self.editing = Some(id.clone());
        self.outbox
            .push(EditorEvent::ElementContentChanged { id, content });
        true
    }

    /// Replace the edited text with a keystroke's result. The source string
    /// keeps the user's casing; the displayed string re-derives through the
    /// case transform.
    pub fn input_text(&mut self, text: &str) {
        let Some(id) = self.editing.clone() else {
            return;
        };
        if let Some(node) = self.index.get(&id).and_then(|n| self.stage.get_mut(n)) {
            if let NodeVisual::Label(label) = &mut node.visual {
                label.set_source(text);
                self.stage.request_repaint();
            }
        }
    }

    /// Exit the text edit session, pushing the final text to the list.
    pub fn end_text_edit(&mut self) {
        let Some(id) = self.editing.take() else {
            return;
        };
        if let Some(node) = self.index.get(&id).and_then(|n| self.stage.get(n)) {
            if let NodeVisual::Label(label) = &node.visual {
                let content = label.source().to_string();
                self.outbox
                    .push(EditorEvent::ElementContentChanged { id, content });
            }
        }
    }

    // ---- toolbar patches -------------------------------------------------

    /// Apply a format-toolbar patch to the selected text-like node.
    ///
    /// Only fields that actually differ are touched; a no-op patch causes no
    /// repaint and no event.
    pub fn apply_text_patch(&mut self, patch: &TextPatch) {
        let Some(id) = self.selection.clone() else {
            return;
        };
        let Some(node) = self.index.get(&id).and_then(|n| self.stage.get_mut(n)) else {
            return;
        };

        let changed = match &mut node.visual {
            NodeVisual::Label(label) => {
                let mut changed = patch.apply_font(&mut label.font);
                if let Some(content) = &patch.content {
                    if label.source() != content {
                        label.set_source(content.clone());
                        changed = true;
                    }
                }
                if changed {
                    label.refresh_display();
                }
                changed
            }
            NodeVisual::Bridge(bridge) => {
                let mut changed = patch.apply_font(&mut bridge.font);
                if let Some(content) = &patch.content {
                    if bridge.content != *content {
                        bridge.content = content.clone();
                        changed = true;
                    }
                }
                changed
            }
            _ => false,
        };

        if changed {
            self.outbox.push(EditorEvent::ElementPatched {
                id,
                patch: patch.clone(),
            });
            self.stage.request_repaint();
        }
    }

    /// Apply curve-parameter updates to the selected bridge node.
    pub fn apply_arc_patch(&mut self, patch: &ArcPatch) {
        let Some(node) = self
            .selected_node_id()
            .and_then(|id| self.stage.get_mut(id))
        else {
            return;
        };
        if let NodeVisual::Bridge(bridge) = &mut node.visual {
            if patch.apply(&mut bridge.arc) {
                self.stage.request_repaint();
            }
        }
    }
}
