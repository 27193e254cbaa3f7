//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer};
use frosting_core::builders::layout_glyphs;
use frosting_core::element::{FontSpec, FontStyle, TextAlign};
use frosting_core::scene::{
    Bridge, Composite, GridLine, Label, NodeVisual, Plinth, PrimitiveGeometry, SceneNode,
};
use kurbo::{Affine, BezPath, Point, Rect, Stroke, Vec2};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Brush, Color, Fill};
use vello::Scene;

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Selection highlight color.
    selection_color: Color,
    /// Font context for text rendering (cached to avoid re-resolving fonts).
    font_cx: FontContext,
    /// Layout context for text rendering.
    layout_cx: LayoutContext<Brush>,
    /// Current zoom level (for zoom-independent UI elements).
    zoom: f64,
    /// Decoded backdrop cache, keyed by the encoded data length so a new
    /// resource invalidates it.
    backdrop_cache: Option<(usize, peniko::ImageData)>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer. Fonts resolve through the system font
    /// collection; element font families are matched by name.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            selection_color: Color::from_rgba8(33, 150, 243, 255),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            zoom: 1.0,
            backdrop_cache: None,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::replace(&mut self.scene, Scene::new())
    }

    /// Transform from node-local coordinates (origin at the node center,
    /// unscaled units) into scene coordinates.
    fn node_transform(node: &SceneNode) -> Affine {
        let flip_x = if node.flip_x { -1.0 } else { 1.0 };
        let flip_y = if node.flip_y { -1.0 } else { 1.0 };
        Affine::translate(node.position.to_vec2())
            * Affine::rotate(node.angle.to_radians())
            * Affine::scale_non_uniform(flip_x * node.scale, flip_y * node.scale)
    }

    fn render_grid_line(&mut self, line: &GridLine, transform: Affine) {
        let grid_color = Color::from_rgba8(224, 231, 239, 255);
        let mut path = BezPath::new();
        path.move_to(line.start);
        path.line_to(line.end);
        self.scene
            .stroke(&Stroke::new(1.0), transform, grid_color, None, &path);
    }

    fn render_plinth(&mut self, node: &SceneNode, plinth: &Plinth, transform: Affine) {
        let fill: Color = plinth.fill.into();
        self.scene
            .fill(Fill::NonZero, transform, fill, None, &node.bounds());
    }

    /// Render the backdrop photo, decoding and caching the host-supplied
    /// pixels. Without data (or when decoding fails) a placeholder is drawn.
    fn render_backdrop(&mut self, node: &SceneNode, data: Option<&[u8]>, transform: Affine) {
        let image_data = match data {
            Some(raw) => {
                let cached = self
                    .backdrop_cache
                    .as_ref()
                    .filter(|(len, _)| *len == raw.len())
                    .map(|(_, img)| img.clone());
                match cached {
                    Some(img) => Some(img),
                    None => match image::load_from_memory(raw) {
                        Ok(decoded) => {
                            let rgba = decoded.to_rgba8();
                            let (width, height) = rgba.dimensions();
                            let blob = peniko::Blob::new(std::sync::Arc::new(rgba.into_vec()));
                            let img_data = peniko::ImageData {
                                data: blob,
                                format: peniko::ImageFormat::Rgba8,
                                width,
                                height,
                                alpha_type: peniko::ImageAlphaType::Alpha,
                            };
                            self.backdrop_cache = Some((raw.len(), img_data.clone()));
                            Some(img_data)
                        }
                        Err(err) => {
                            log::warn!("failed to decode backdrop photo: {err}");
                            None
                        }
                    },
                }
            }
            None => None,
        };

        let bounds = node.bounds();
        let Some(image_data) = image_data else {
            self.render_backdrop_placeholder(bounds, transform);
            return;
        };

        let scale_x = bounds.width() / image_data.width as f64;
        let scale_y = bounds.height() / image_data.height as f64;
        let image_transform = transform
            * Affine::translate((bounds.x0, bounds.y0))
            * Affine::scale_non_uniform(scale_x, scale_y);
        self.scene.draw_image(&image_data.into(), image_transform);
    }

    /// Gray rectangle with an X where the backdrop would be.
    fn render_backdrop_placeholder(&mut self, bounds: Rect, transform: Affine) {
        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(200, 200, 200, 255),
            None,
            &bounds,
        );
        let stroke = Stroke::new(2.0);
        let mut x_path = BezPath::new();
        x_path.move_to(Point::new(bounds.x0, bounds.y0));
        x_path.line_to(Point::new(bounds.x1, bounds.y1));
        x_path.move_to(Point::new(bounds.x1, bounds.y0));
        x_path.line_to(Point::new(bounds.x0, bounds.y1));
        self.scene.stroke(
            &stroke,
            transform,
            Color::from_rgba8(150, 150, 150, 255),
            None,
            &x_path,
        );
    }

    /// Render every primitive of a composite, each anchored at its own
    /// center offset within the group.
    fn render_composite(&mut self, node: &SceneNode, composite: &Composite, camera: Affine) {
        let group_transform =
            camera * Self::node_transform(node) * Affine::scale(composite.display_factor);

        for child in &composite.children {
            let transform = group_transform * Affine::translate(child.offset);
            let fill = child.fill.map(Color::from);
            let stroke = child.stroke.map(Color::from);
            match &child.geometry {
                PrimitiveGeometry::Path(path) => {
                    self.render_primitive(path, fill, stroke, transform)
                }
                PrimitiveGeometry::Circle { radius } => {
                    let circle = kurbo::Circle::new(Point::ZERO, *radius);
                    self.render_primitive(&circle, fill, stroke, transform);
                }
                PrimitiveGeometry::Rect {
                    width,
                    height,
                    corner_radius,
                } => {
                    let rect =
                        Rect::from_center_size(Point::ZERO, kurbo::Size::new(*width, *height));
                    if *corner_radius > 0.0 {
                        let rounded = kurbo::RoundedRect::from_rect(rect, *corner_radius);
                        self.render_primitive(&rounded, fill, stroke, transform);
                    } else {
                        self.render_primitive(&rect, fill, stroke, transform);
                    }
                }
                PrimitiveGeometry::Ellipse { rx, ry } => {
                    let ellipse = kurbo::Ellipse::new(Point::ZERO, Vec2::new(*rx, *ry), 0.0);
                    self.render_primitive(&ellipse, fill, stroke, transform);
                }
            }
        }
    }

    fn render_primitive(
        &mut self,
        shape: &impl kurbo::Shape,
        fill: Option<Color>,
        stroke: Option<Color>,
        transform: Affine,
    ) {
        if let Some(fill_color) = fill {
            self.scene
                .fill(Fill::NonZero, transform, fill_color, None, shape);
        }
        if let Some(stroke_color) = stroke {
            self.scene
                .stroke(&Stroke::new(1.0), transform, stroke_color, None, shape);
        }
    }

    /// Build a Parley layout for a run of text with the element's font
    /// attributes applied.
    fn build_text_layout(&mut self, text: &str, font: &FontSpec) -> parley::Layout<Brush> {
        let brush = Brush::Solid(Color::BLACK);
        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font.size as f32));
        builder.push_default(StyleProperty::Brush(brush));
        builder.push_default(StyleProperty::FontWeight(parley::FontWeight::new(
            font.weight as f32,
        )));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Named(font.family.clone().into()),
        )));
        builder.push_default(StyleProperty::LetterSpacing(font.letter_spacing as f32));
        if font.style == FontStyle::Italic {
            builder.push_default(StyleProperty::FontStyle(parley::FontStyle::Italic));
        }
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        let alignment = match font.align {
            TextAlign::Left => parley::Alignment::Start,
            TextAlign::Center => parley::Alignment::Middle,
            TextAlign::Right => parley::Alignment::End,
        };
        layout.align(None, alignment, parley::AlignmentOptions::default());
        layout
    }

    /// Render each line of a layout (adapted from Parley's vello example).
    fn draw_layout(&mut self, layout: &parley::Layout<Brush>, transform: Affine) {
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    let brush = Brush::Solid(Color::BLACK);
                    self.scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(true)
                        .transform(transform)
                        .glyph_transform(glyph_xform)
                        .font_size(font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }
    }

    /// Render an editable text node.
    fn render_label(&mut self, node: &SceneNode, label: &Label, camera: Affine) {
        let transform = camera * Self::node_transform(node);

        if label.display().is_empty() {
            // Caret placeholder for empty text.
            let cursor_height = label.font.size * 1.2;
            let cursor = kurbo::Line::new(
                Point::new(0.0, -cursor_height / 2.0),
                Point::new(0.0, cursor_height / 2.0),
            );
            let stroke = Stroke::new(2.0);
            self.scene.stroke(
                &stroke,
                transform,
                Color::from_rgba8(100, 100, 100, 200),
                None,
                &cursor,
            );
            return;
        }

        let layout = self.build_text_layout(label.display(), &label.font);
        let width = layout.width() as f64;
        let height = layout.height() as f64;
        // Parley layouts have y = 0 at the top; shift so the layout is
        // centered on the node origin.
        let text_transform = transform * Affine::translate((-width / 2.0, -height / 2.0));
        self.draw_layout(&layout, text_transform);
    }

    /// Render bridge text character by character along its curve.
    fn render_bridge(&mut self, node: &SceneNode, bridge: &Bridge, camera: Affine) {
        let transform = camera * Self::node_transform(node);
        let top_left = Affine::translate((-bridge.width / 2.0, -bridge.height / 2.0));

        for placement in layout_glyphs(bridge) {
            let mut buf = [0u8; 4];
            let text: &str = placement.ch.encode_utf8(&mut buf);
            let layout = self.build_text_layout(text, &bridge.font);
            let char_width = layout.width() as f64;
            let baseline = layout
                .lines()
                .next()
                .map(|line| line.metrics().baseline as f64)
                .unwrap_or(0.0);

            // Translate to the glyph's spot on the curve, rotate around it,
            // then center the glyph on its baseline.
            let glyph_transform = transform
                * top_left
                * Affine::translate((placement.center_x, placement.baseline_y))
                * Affine::rotate(placement.rotation)
                * Affine::translate((-char_width / 2.0, -baseline));
            self.draw_layout(&layout, glyph_transform);
        }
    }

    /// Stroke a highlight box around the selected node.
    fn render_selection(&mut self, node: &SceneNode, camera: Affine) {
        let base = node.base_size();
        let rect = Rect::from_center_size(Point::ZERO, base);
        let width = 2.0 / (self.zoom * node.scale.max(0.01));
        self.scene.stroke(
            &Stroke::new(width),
            camera * Self::node_transform(node),
            self.selection_color,
            None,
            &rect,
        );
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        // Clear the scene
        self.scene.reset();
        self.selection_color = ctx.selection_color;
        self.zoom = ctx.camera.zoom;

        let camera_transform = ctx.camera.transform();

        // Draw all nodes in z-order.
        for node in ctx.stage.nodes_ordered() {
            match &node.visual {
                NodeVisual::GridLine(line) => self.render_grid_line(line, camera_transform),
                NodeVisual::Plinth(plinth) => self.render_plinth(node, plinth, camera_transform),
                NodeVisual::Photo(_) => {
                    self.render_backdrop(node, ctx.backdrop_data, camera_transform)
                }
                NodeVisual::Composite(composite) => {
                    self.render_composite(node, composite, camera_transform)
                }
                NodeVisual::Label(label) => self.render_label(node, label, camera_transform),
                NodeVisual::Bridge(bridge) => self.render_bridge(node, bridge, camera_transform),
            }
        }

        // Draw the selection highlight on top of content, beneath nothing
        // else: the backdrop stays unobscured because system nodes are never
        // selectable.
        if let Some(selected) = ctx.selected_node {
            if let Some(node) = ctx.stage.get(selected) {
                self.render_selection(node, camera_transform);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frosting_core::element::{ArcSpec, DesignElement, ElementId, FontSpec};
    use frosting_core::layering;
    use frosting_core::scene::Stage;
    use frosting_core::{builders, Camera};
    use kurbo::Size;

    fn stage_with_content() -> Stage {
        let mut stage = Stage::new();
        stage.set_viewport(Size::new(800.0, 600.0));
        layering::regenerate_grid(&mut stage, 40.0);
        layering::install_backdrop(&mut stage, 1536.0, 1024.0);

        let text = DesignElement::text(ElementId::new("t"), "Hello", FontSpec::default())
            .at(Point::new(300.0, 200.0));
        let shape = DesignElement::shape(
            ElementId::new("s"),
            r##"<svg><circle cx="10" cy="10" r="5" fill="#fff"/></svg>"##,
        )
        .at(Point::new(150.0, 150.0));
        let bridge = DesignElement::bridge_text(
            ElementId::new("b"),
            "Arch",
            FontSpec::default(),
            ArcSpec::default(),
        )
        .at(Point::new(400.0, 300.0));

        for element in [&text, &shape, &bridge] {
            let node =
                builders::build(element, element.position.expect("position")).expect("build");
            let id = stage.insert(node);
            layering::place_new_content(&mut stage, id);
        }
        stage
    }

    #[test]
    fn test_renderer_creation() {
        let renderer = VelloRenderer::new();
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_empty_scene() {
        let mut renderer = VelloRenderer::new();
        let stage = Stage::new();
        let camera = Camera::new();
        let ctx = RenderContext::new(&stage, &camera, Size::new(800.0, 600.0));

        renderer.build_scene(&ctx);
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_scene_with_nodes() {
        let mut renderer = VelloRenderer::new();
        let stage = stage_with_content();
        let camera = Camera::new();
        let ctx = RenderContext::new(&stage, &camera, Size::new(800.0, 600.0));

        renderer.build_scene(&ctx);
        assert!(!renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_scene_with_selection() {
        let mut renderer = VelloRenderer::new();
        let stage = stage_with_content();
        let camera = Camera::new();
        let selected = stage
            .nodes_ordered()
            .find(|n| n.element.is_some())
            .map(|n| n.id);
        let ctx = RenderContext::new(&stage, &camera, Size::new(800.0, 600.0))
            .with_selected_node(selected);

        renderer.build_scene(&ctx);
        assert!(!renderer.scene().encoding().is_empty());
    }
}
