//! Declarative design elements.
//!
//! A `DesignElement` is the host application's description of one user-placed
//! item. The list of elements is the source of truth; the engine mirrors it
//! into scene nodes via the reconciler and writes committed manipulations
//! back through the event outbox.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier for a design element.
///
/// Stable for the element's lifetime. Minted from a UUID when the engine
/// creates elements itself (duplication), but hosts may supply any unique
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh unique identifier.
    pub fn mint() -> Self {
        Self(format!("element-{}", Uuid::new_v4()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element kind discriminant, matching the host-facing payload tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Text,
    Shape,
    BridgeText,
}

/// Display-case transform applied to rendered text.
///
/// The stored element content always keeps the user-intended casing; the
/// transform only affects the displayed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
}

impl CaseTransform {
    /// Apply the transform to a source string, producing the display string.
    pub fn apply(&self, source: &str) -> String {
        match self {
            CaseTransform::None => source.to_string(),
            CaseTransform::Uppercase => source.to_uppercase(),
            CaseTransform::Lowercase => source.to_lowercase(),
        }
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Font attributes for text-like elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Font family name as understood by the renderer.
    pub family: String,
    /// Font size in canvas pixels at 1:1 zoom.
    pub size: f64,
    /// CSS-style weight (400 regular, 700 bold).
    pub weight: u16,
    pub style: FontStyle,
    pub align: TextAlign,
    /// Additional advance between characters, in canvas pixels.
    pub letter_spacing: f64,
    pub transform: CaseTransform,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 20.0,
            weight: 400,
            style: FontStyle::default(),
            align: TextAlign::default(),
            letter_spacing: 0.0,
            transform: CaseTransform::default(),
        }
    }
}

/// Curve parameters for bridge text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSpec {
    /// Curve radius: how far the arch (or triangle apex) rises.
    pub curve: f64,
    /// Vertical offset of the whole run from the node top.
    pub offset_y: f64,
    /// Baseline height added below the curve offset.
    pub text_height: f64,
    /// Bottom offset added below the baseline.
    pub bottom: f64,
    /// Triangle mode instead of arch mode.
    pub triangle: bool,
}

impl Default for ArcSpec {
    fn default() -> Self {
        Self {
            curve: 100.0,
            offset_y: 50.0,
            text_height: 100.0,
            bottom: 200.0,
            triangle: false,
        }
    }
}

/// Kind-specific payload of a design element.
///
/// The kind is resolved exactly once, in the builder layer; downstream code
/// works against the closed capability set of the resulting scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementPayload {
    Text {
        content: String,
        #[serde(flatten)]
        font: FontSpec,
    },
    Shape {
        /// Raw vector markup, decomposed by the shape builder.
        markup: String,
    },
    BridgeText {
        content: String,
        #[serde(flatten)]
        font: FontSpec,
        #[serde(flatten)]
        arc: ArcSpec,
    },
}

impl ElementPayload {
    /// The kind discriminant for this payload.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementPayload::Text { .. } => ElementKind::Text,
            ElementPayload::Shape { .. } => ElementKind::Shape,
            ElementPayload::BridgeText { .. } => ElementKind::BridgeText,
        }
    }

    /// Text content, for text-like payloads.
    pub fn content(&self) -> Option<&str> {
        match self {
            ElementPayload::Text { content, .. } => Some(content),
            ElementPayload::BridgeText { content, .. } => Some(content),
            ElementPayload::Shape { .. } => None,
        }
    }
}

/// One user-placed item, as described by the host application.
///
/// Immutable-by-replacement: the host never mutates an element in place, it
/// replaces it in the list and hands the whole list to the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignElement {
    pub id: ElementId,
    /// Position of the element's visual center in scene coordinates.
    /// `None` asks the engine to place the element at the visible canvas
    /// center on creation.
    pub position: Option<Point>,
    /// Rotation in degrees; a multiple of 15 once committed.
    pub angle: f64,
    /// Uniform scale factor, > 0.
    pub scale: f64,
    pub payload: ElementPayload,
}

impl DesignElement {
    /// Create a plain text element.
    pub fn text(id: ElementId, content: impl Into<String>, font: FontSpec) -> Self {
        Self {
            id,
            position: None,
            angle: 0.0,
            scale: 1.0,
            payload: ElementPayload::Text {
                content: content.into(),
                font,
            },
        }
    }

    /// Create a vector shape element from raw markup.
    pub fn shape(id: ElementId, markup: impl Into<String>) -> Self {
        Self {
            id,
            position: None,
            angle: 0.0,
            scale: 1.0,
            payload: ElementPayload::Shape {
                markup: markup.into(),
            },
        }
    }

    /// Create a bridge text element.
    pub fn bridge_text(
        id: ElementId,
        content: impl Into<String>,
        font: FontSpec,
        arc: ArcSpec,
    ) -> Self {
        Self {
            id,
            position: None,
            angle: 0.0,
            scale: 1.0,
            payload: ElementPayload::BridgeText {
                content: content.into(),
                font,
                arc,
            },
        }
    }

    /// Set the position.
    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// The kind discriminant.
    pub fn kind(&self) -> ElementKind {
        self.payload.kind()
    }
}

/// A partial update to a text-like node, as produced by a format toolbar.
///
/// Only fields that are `Some` are applied, and application reports whether
/// anything actually changed so no-op patches cause no repaint or event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPatch {
    pub content: Option<String>,
    pub family: Option<String>,
    pub size: Option<f64>,
    pub weight: Option<u16>,
    pub style: Option<FontStyle>,
    pub align: Option<TextAlign>,
    pub letter_spacing: Option<f64>,
    pub transform: Option<CaseTransform>,
}

impl TextPatch {
    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a font spec, returning true if anything changed.
    pub fn apply_font(&self, font: &mut FontSpec) -> bool {
        let mut changed = false;
        if let Some(family) = &self.family {
            if font.family != *family {
                font.family = family.clone();
                changed = true;
            }
        }
        if let Some(size) = self.size {
            if font.size != size {
                font.size = size;
                changed = true;
            }
        }
        if let Some(weight) = self.weight {
            if font.weight != weight {
                font.weight = weight;
                changed = true;
            }
        }
        if let Some(style) = self.style {
            if font.style != style {
                font.style = style;
                changed = true;
            }
        }
        if let Some(align) = self.align {
            if font.align != align {
                font.align = align;
                changed = true;
            }
        }
        if let Some(spacing) = self.letter_spacing {
            if font.letter_spacing != spacing {
                font.letter_spacing = spacing;
                changed = true;
            }
        }
        if let Some(transform) = self.transform {
            if font.transform != transform {
                font.transform = transform;
                changed = true;
            }
        }
        changed
    }
}

/// A partial update to a bridge node's curve parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcPatch {
    pub curve: Option<f64>,
    pub offset_y: Option<f64>,
    pub text_height: Option<f64>,
    pub bottom: Option<f64>,
    pub triangle: Option<bool>,
}

impl ArcPatch {
    /// Apply to an arc spec, returning true if anything changed.
    pub fn apply(&self, arc: &mut ArcSpec) -> bool {
        let mut changed = false;
        if let Some(curve) = self.curve {
            if arc.curve != curve {
                arc.curve = curve;
                changed = true;
            }
        }
        if let Some(offset_y) = self.offset_y {
            if arc.offset_y != offset_y {
                arc.offset_y = offset_y;
                changed = true;
            }
        }
        if let Some(text_height) = self.text_height {
            if arc.text_height != text_height {
                arc.text_height = text_height;
                changed = true;
            }
        }
        if let Some(bottom) = self.bottom {
            if arc.bottom != bottom {
                arc.bottom = bottom;
                changed = true;
            }
        }
        if let Some(triangle) = self.triangle {
            if arc.triangle != triangle {
                arc.triangle = triangle;
                changed = true;
            }
        }
        changed
    }
}
