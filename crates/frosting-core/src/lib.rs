//! Frosting Core Library
//!
//! Scene synchronization and manipulation engine for the Frosting designer:
//! reconciles a declarative element list against an imperative scene graph,
//! builds renderable nodes from element payloads, and applies the
//! manipulation rules (snapping, scale limits, rotation quantization,
//! layering invariants) that keep both representations consistent under
//! direct manipulation.

pub mod builders;
pub mod camera;
pub mod editor;
pub mod element;
pub mod events;
pub mod index;
pub mod layering;
pub mod manipulate;
pub mod metrics;
pub mod overlay;
pub mod paint;
pub mod reconcile;
pub mod scene;
pub mod snap;

pub use builders::{layout_glyphs, BuildError, GlyphPlacement};
pub use camera::Camera;
pub use editor::{Editor, SURFACE_WAIT_FRAMES};
pub use element::{
    ArcPatch, ArcSpec, CaseTransform, DesignElement, ElementId, ElementKind, ElementPayload,
    FontSpec, FontStyle, TextAlign, TextPatch,
};
pub use events::{EditorEvent, TextSelection};
pub use index::SceneIndex;
pub use manipulate::{GestureKind, ManipulationError, MIN_RENDERED_SIZE};
pub use overlay::OverlayAnchors;
pub use paint::PaintColor;
pub use scene::{
    configure_environment, NodeId, NodeRole, NodeVisual, SceneNode, Stage,
};
pub use snap::{snap_angle, snap_quantum, ANGLE_SNAP_INCREMENT};
