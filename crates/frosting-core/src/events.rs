//! Events emitted to the host application.
//!
//! The engine never calls back into the host directly; it appends to an
//! outbox that the host drains after each call. Committed manipulations reach
//! the declarative list this way, and the reconciler then observes the
//! updated list strictly after the writes of the gesture that produced them.

use crate::element::{DesignElement, ElementId, ElementKind, FontSpec, TextPatch};
use serde::{Deserialize, Serialize};

/// Snapshot of the selected text-like element, for external property panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSelection {
    pub id: ElementId,
    pub kind: ElementKind,
    pub content: String,
    pub font: FontSpec,
}

/// Notification from the engine to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// A manipulation committed new geometry for an element.
    ElementCommitted {
        id: ElementId,
        x: f64,
        y: f64,
        angle: f64,
        scale: f64,
    },
    /// A text edit session pushed the current content (fired on session
    /// entry and exit, so observers stay in sync during editing).
    ElementContentChanged { id: ElementId, content: String },
    /// The reconciler placed an element that carried no explicit position.
    ElementPlaced { id: ElementId, x: f64, y: f64 },
    /// The engine created an element itself (duplication).
    ElementAdded(DesignElement),
    /// The user deleted an element.
    ElementRemoved(ElementId),
    /// A format-toolbar patch was applied to an element.
    ElementPatched { id: ElementId, patch: TextPatch },
    /// The text-like selection changed (`None` when a non-text node or
    /// nothing is selected).
    TextSelectionChanged(Option<TextSelection>),
}

/// Outbox of pending events, drained by the host.
#[derive(Debug, Default)]
pub struct EventOutbox {
    events: Vec<EditorEvent>,
}

impl EventOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    /// Take all pending events, oldest first.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
