//! Reconciler: declarative element list against the scene index.
//!
//! On every list change the reconciler (a) removes indexed nodes whose id is
//! gone, (b) updates only the fields that actually differ on nodes that
//! survive, and (c) builds, places, layers and indexes nodes for new ids.
//! The pass is idempotent: running it twice with no intervening list change
//! mutates nothing on the second run — no node changes, no repaint request,
//! no events.

use crate::editor::{Editor, PendingAdd, SURFACE_WAIT_FRAMES};
use crate::element::{DesignElement, ElementPayload};
use crate::events::EditorEvent;
use crate::layering;
use crate::scene::NodeVisual;
use crate::{builders, scene::NodeId};
use std::collections::HashSet;

impl Editor {
    /// Reconcile the declarative element list into the stage.
    pub fn reconcile(&mut self, elements: &[DesignElement]) {
        // (a) Remove nodes whose element disappeared from the list.
        let live: HashSet<&str> = elements.iter().map(|e| e.id.as_str()).collect();
        let stale: Vec<_> = self
            .index
            .element_ids()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if let Some(node_id) = self.index.remove(&id) {
                self.stage.remove(node_id);
            }
            if self.selection.as_ref() == Some(&id) {
                self.selection = None;
                self.notify_removed_selection();
            }
            if self.editing.as_ref() == Some(&id) {
                self.editing = None;
            }
        }
        // Queued adds for removed ids are abandoned too.
        self.pending.retain(|add| live.contains(add.element.id.as_str()));

        for element in elements {
            match self.index.get(&element.id) {
                // (b) Known id: update only what differs.
                Some(node_id) => self.update_existing(node_id, element),
                // (c) New id: build, place, layer, index.
                None => {
                    let queued = self
                        .pending
                        .iter()
                        .any(|add| add.element.id == element.id);
                    if !queued {
                        self.spawn_element(element);
                    }
                }
            }
        }
    }

    fn notify_removed_selection(&mut self) {
        self.outbox.push(EditorEvent::TextSelectionChanged(None));
    }

    /// Update a live node from its element, touching only changed fields
    /// (position, angle, and content for text) so no geometry is recomputed
    /// redundantly.
    fn update_existing(&mut self, node_id: NodeId, element: &DesignElement) {
        let Some(node) = self.stage.get_mut(node_id) else {
            return;
        };
        if !payload_matches(&node.visual, &element.payload) {
            log::warn!(
                "element {} changed kind in place; keeping the existing node",
                element.id
            );
            return;
        }

        let mut changed = false;

        if let Some(position) = element.position {
            if node.position != position {
                node.position = position;
                changed = true;
            }
        }
        if node.angle != element.angle {
            node.angle = element.angle;
            changed = true;
        }
        if let Some(content) = element.payload.content() {
            match &mut node.visual {
                NodeVisual::Label(label) => {
                    if label.source() != content {
                        label.set_source(content.to_string());
                        changed = true;
                    }
                }
                NodeVisual::Bridge(bridge) => {
                    if bridge.content != content {
                        bridge.content = content.to_string();
                        changed = true;
                    }
                }
                _ => {}
            }
        }

        if changed {
            self.stage.request_repaint();
        }
    }

    /// Handle a new element id: build immediately when the surface is ready,
    /// otherwise queue it for a bounded number of frame retries.
    fn spawn_element(&mut self, element: &DesignElement) {
        if !self.stage.is_ready() {
            log::debug!(
                "surface not ready, queueing element {} for retry",
                element.id
            );
            self.pending.push(PendingAdd {
                element: element.clone(),
                frames_left: SURFACE_WAIT_FRAMES,
            });
            return;
        }
        self.create_node(element);
    }

    /// Build the node for an element and wire it into the stage and index.
    ///
    /// A build failure drops the element silently (logged): no partial node
    /// is ever added and the request is not retried.
    pub(crate) fn create_node(&mut self, element: &DesignElement) {
        let placed_at_center = element.position.is_none();
        let position = element.position.unwrap_or_else(|| self.visible_center());

        let node = match builders::build(element, position) {
            Ok(node) => node,
            Err(err) => {
                log::warn!("dropping element {}: {err}", element.id);
                return;
            }
        };

        let node_id = self.stage.insert(node);
        layering::place_new_content(&mut self.stage, node_id);
        self.index.insert(element.id.clone(), node_id);

        if placed_at_center {
            self.outbox.push(EditorEvent::ElementPlaced {
                id: element.id.clone(),
                x: position.x,
                y: position.y,
            });
        }
    }
}

/// True when the payload kind of a live node still matches its element.
/// A kind change under a reused id is a host bug; the reconciler refuses to
/// morph a node in place and keeps the existing one.
pub fn payload_matches(visual: &NodeVisual, payload: &ElementPayload) -> bool {
    matches!(
        (visual, payload),
        (NodeVisual::Label(_), ElementPayload::Text { .. })
            | (NodeVisual::Composite(_), ElementPayload::Shape { .. })
            | (NodeVisual::Bridge(_), ElementPayload::BridgeText { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, FontSpec};
    use crate::scene::NodeRole;
    use kurbo::{Point, Size};

    fn ready_editor() -> Editor {
        let mut editor = Editor::new(40.0);
        editor.set_viewport(Size::new(800.0, 600.0));
        editor.drain_events();
        editor.tick_frame();
        editor
    }

    fn text_element(id: &str, content: &str) -> DesignElement {
        DesignElement::text(ElementId::new(id), content, FontSpec::default())
    }

    #[test]
    fn test_new_element_without_position_lands_at_center() {
        let mut editor = ready_editor();
        editor.reconcile(&[text_element("hi", "Hi")]);

        let node_id = editor.index.get(&ElementId::new("hi")).expect("indexed");
        let node = editor.stage().get(node_id).expect("node");
        assert_eq!(node.position, Point::new(400.0, 300.0));

        let events = editor.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            EditorEvent::ElementPlaced { id, x, y }
                if id.as_str() == "hi" && *x == 400.0 && *y == 300.0
        )));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut editor = ready_editor();
        let elements = vec![
            text_element("a", "one"),
            text_element("b", "two").at(Point::new(100.0, 120.0)),
        ];
        editor.reconcile(&elements);
        editor.tick_frame();
        editor.drain_events();

        // Second run with the unchanged list: zero additional mutations.
        editor.reconcile(&elements);
        assert!(!editor.stage().repaint_pending());
        assert!(editor.drain_events().is_empty());
    }

    #[test]
    fn test_removal_drops_node_and_index_entry() {
        let mut editor = ready_editor();
        editor.reconcile(&[text_element("a", "one")]);
        assert_eq!(editor.index.len(), 1);
        let node_count = editor.stage().len();

        editor.reconcile(&[]);
        assert!(editor.index.is_empty());
        assert_eq!(editor.stage().len(), node_count - 1);
    }

    #[test]
    fn test_update_touches_only_changed_fields() {
        let mut editor = ready_editor();
        editor.reconcile(&[text_element("a", "one").at(Point::new(100.0, 100.0))]);
        editor.tick_frame();
        editor.drain_events();

        let mut updated = text_element("a", "two").at(Point::new(100.0, 100.0));
        updated.angle = 15.0;
        editor.reconcile(&[updated]);

        let node_id = editor.index.get(&ElementId::new("a")).expect("indexed");
        let node = editor.stage().get(node_id).expect("node");
        assert!((node.angle - 15.0).abs() < f64::EPSILON);
        match &node.visual {
            NodeVisual::Label(label) => assert_eq!(label.source(), "two"),
            other => panic!("expected label, got {other:?}"),
        }
        assert!(editor.stage().repaint_pending());
    }

    #[test]
    fn test_malformed_markup_is_dropped_silently() {
        let mut editor = ready_editor();
        let bad = DesignElement::shape(ElementId::new("bad"), "<svg><circle");
        editor.reconcile(&[bad]);

        assert!(editor.index.is_empty());
        // No placement event for a dropped element.
        assert!(editor
            .drain_events()
            .iter()
            .all(|e| !matches!(e, EditorEvent::ElementPlaced { .. })));
    }

    #[test]
    fn test_add_before_surface_ready_is_queued_then_built() {
        let mut editor = Editor::new(40.0);
        editor.reconcile(&[text_element("early", "Hi")]);
        assert!(editor.index.is_empty());

        // A few frames of waiting do not build anything.
        editor.tick_frame();
        editor.tick_frame();
        assert!(editor.index.is_empty());

        // Surface becomes ready; the queued add completes next frame.
        editor.set_viewport(Size::new(800.0, 600.0));
        editor.tick_frame();
        assert_eq!(editor.index.len(), 1);
    }

    #[test]
    fn test_add_abandoned_after_bounded_wait() {
        let mut editor = Editor::new(40.0);
        editor.reconcile(&[text_element("late", "Hi")]);
        for _ in 0..crate::editor::SURFACE_WAIT_FRAMES {
            editor.tick_frame();
        }
        // The retry budget is exhausted; readiness no longer helps.
        editor.set_viewport(Size::new(800.0, 600.0));
        editor.tick_frame();
        assert!(editor.index.is_empty());
    }

    #[test]
    fn test_new_content_layered_beneath_backdrop() {
        let mut editor = ready_editor();
        editor.set_backdrop(1536.0, 1024.0);
        editor.reconcile(&[text_element("a", "one"), text_element("b", "two")]);

        let roles: Vec<NodeRole> = editor.stage().nodes_ordered().map(|n| n.role).collect();
        let len = roles.len();
        assert_eq!(roles[len - 1], NodeRole::Backdrop);
        assert_eq!(roles[len - 2], NodeRole::Base);
        assert_eq!(roles[len - 3], NodeRole::Content);
        assert_eq!(roles[len - 4], NodeRole::Content);
    }

    #[test]
    fn test_payload_matches() {
        let label = NodeVisual::Label(crate::scene::Label::new("x", FontSpec::default()));
        assert!(payload_matches(
            &label,
            &ElementPayload::Text {
                content: "x".to_string(),
                font: FontSpec::default()
            }
        ));
        assert!(!payload_matches(
            &label,
            &ElementPayload::Shape {
                markup: String::new()
            }
        ));
    }
}
