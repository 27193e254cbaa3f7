//! Renderer trait abstraction.

use frosting_core::scene::{NodeId, Stage};
use frosting_core::Camera;
use kurbo::Size;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
#[allow(dead_code)]
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The stage to render, back to front.
    pub stage: &'a Stage,
    /// Camera providing the scene-to-screen transform.
    pub camera: &'a Camera,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Background color.
    pub background_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
    /// Node to draw selection affordances around.
    pub selected_node: Option<NodeId>,
    /// Encoded pixels of the backdrop photo, if the host has loaded one.
    pub backdrop_data: Option<&'a [u8]>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(stage: &'a Stage, camera: &'a Camera, viewport_size: Size) -> Self {
        Self {
            stage,
            camera,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(240, 249, 255, 255),
            selection_color: Color::from_rgba8(33, 150, 243, 255),
            selected_node: None,
            backdrop_data: None,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the node to draw selection affordances around.
    pub fn with_selected_node(mut self, node: Option<NodeId>) -> Self {
        self.selected_node = node;
        self
    }

    /// Set the encoded backdrop photo data.
    pub fn with_backdrop_data(mut self, data: Option<&'a [u8]>) -> Self {
        self.backdrop_data = data;
        self
    }
}

/// Trait for rendering backends.
///
/// Implementations can use Vello, wgpu directly, or other rendering engines.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    ///
    /// This method is called once per frame and should prepare all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
