//! Builders: declarative payloads into renderable scene nodes.
//!
//! The element kind is resolved exactly once here; the resulting node carries
//! a closed `NodeVisual` so no other component ever switches on payload
//! types. Building is all-or-nothing: a failed build leaves the stage
//! untouched and the caller drops the element.

mod bridge;
mod shape;

pub use bridge::{layout_glyphs, GlyphPlacement, BRIDGE_NODE_HEIGHT, BRIDGE_NODE_WIDTH};
pub use shape::{decompose, SHAPE_DISPLAY_FACTOR};

use crate::element::{DesignElement, ElementPayload};
use crate::scene::{Label, NodeVisual, SceneNode};
use kurbo::Point;
use thiserror::Error;

/// Build failures.
///
/// Every variant is terminal for the requesting element: the node is never
/// partially constructed and the request is dropped, not retried.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("markup parse error: {0}")]
    Markup(#[from] roxmltree::Error),
    #[error("invalid path data: {0}")]
    PathData(#[from] kurbo::SvgParseError),
    #[error("markup contains no drawable primitives")]
    EmptyMarkup,
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Build the scene node for a design element at the given position.
pub fn build(element: &DesignElement, position: Point) -> BuildResult<SceneNode> {
    let visual = match &element.payload {
        ElementPayload::Shape { markup } => NodeVisual::Composite(shape::decompose(markup)?),
        ElementPayload::Text { content, font } => {
            NodeVisual::Label(Label::new(content.clone(), font.clone()))
        }
        ElementPayload::BridgeText { content, font, arc } => {
            NodeVisual::Bridge(bridge::build(content.clone(), font.clone(), *arc))
        }
    };

    let mut node = SceneNode::content(element.id.clone(), position, visual);
    node.angle = element.angle;
    node.scale = element.scale;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ArcSpec, ElementId, FontSpec};

    #[test]
    fn test_build_text_element() {
        let element = DesignElement::text(ElementId::new("t"), "Hi", FontSpec::default());
        let node = build(&element, Point::new(10.0, 20.0)).expect("build");
        assert!(node.is_text_like());
        match &node.visual {
            NodeVisual::Label(label) => assert_eq!(label.display(), "Hi"),
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn test_build_carries_transform() {
        let mut element =
            DesignElement::bridge_text(ElementId::new("b"), "Arch", FontSpec::default(), ArcSpec::default());
        element.angle = 30.0;
        element.scale = 1.5;
        let node = build(&element, Point::ZERO).expect("build");
        assert!((node.angle - 30.0).abs() < f64::EPSILON);
        assert!((node.scale - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_build_bad_markup_fails() {
        let element = DesignElement::shape(ElementId::new("s"), "<svg><circle");
        assert!(build(&element, Point::ZERO).is_err());
    }
}
