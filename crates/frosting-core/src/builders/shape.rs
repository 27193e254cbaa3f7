//! Shape decomposer: raw vector markup into a composite node.
//!
//! Walks the markup's drawable primitives (`path`, `circle`, `rect`,
//! `ellipse`) in document order. Each primitive becomes one child anchored at
//! its own center; the children aggregate into one composite anchored at the
//! overall center and uniformly scaled by a fixed display factor. Unparseable
//! markup or markup without a single recognized primitive fails the whole
//! operation; nothing is ever half-built.

use super::{BuildError, BuildResult};
use crate::paint::{parse_paint, PaintColor};
use crate::scene::{Composite, Primitive, PrimitiveGeometry};
use kurbo::{Affine, BezPath, Point, Rect, Shape as _, Size, Vec2};

/// Fixed display factor applied to decomposed markup.
pub const SHAPE_DISPLAY_FACTOR: f64 = 2.0;

/// A primitive together with its bounds in markup coordinates.
struct Extracted {
    center: Point,
    bounds: Rect,
    geometry: PrimitiveGeometry,
    fill: Option<PaintColor>,
    stroke: Option<PaintColor>,
}

/// Decompose a vector-markup string into a composite visual.
pub fn decompose(markup: &str) -> BuildResult<Composite> {
    let doc = roxmltree::Document::parse(markup)?;

    let mut extracted = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "path" => {
                if let Some(prim) = extract_path(&node)? {
                    extracted.push(prim);
                }
            }
            "circle" => extracted.push(extract_circle(&node)),
            "rect" => extracted.push(extract_rect(&node)),
            "ellipse" => extracted.push(extract_ellipse(&node)),
            _ => {}
        }
    }

    if extracted.is_empty() {
        return Err(BuildError::EmptyMarkup);
    }

    let union = extracted
        .iter()
        .map(|p| p.bounds)
        .reduce(|a, b| a.union(b))
        .unwrap_or_default();
    let center = union.center();

    let children = extracted
        .into_iter()
        .map(|p| Primitive {
            offset: p.center - center,
            geometry: p.geometry,
            fill: p.fill,
            stroke: p.stroke,
        })
        .collect();

    Ok(Composite {
        children,
        natural_size: Size::new(union.width(), union.height()),
        display_factor: SHAPE_DISPLAY_FACTOR,
        markup: markup.to_string(),
    })
}

fn attr_f64(node: &roxmltree::Node, name: &str) -> f64 {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Paint attributes: fill defaults to opaque black, stroke to none.
fn paints(node: &roxmltree::Node) -> (Option<PaintColor>, Option<PaintColor>) {
    let fill = match node.attribute("fill") {
        Some(value) => parse_paint(value),
        None => Some(PaintColor::black()),
    };
    let stroke = node.attribute("stroke").and_then(parse_paint);
    (fill, stroke)
}

fn extract_path(node: &roxmltree::Node) -> BuildResult<Option<Extracted>> {
    let Some(data) = node.attribute("d") else {
        return Ok(None);
    };
    let mut path = BezPath::from_svg(data)?;
    if path.elements().is_empty() {
        return Ok(None);
    }
    let bounds = path.bounding_box();
    let center = bounds.center();
    // Re-anchor the path at its own center.
    path.apply_affine(Affine::translate(Vec2::new(-center.x, -center.y)));

    let (fill, stroke) = paints(node);
    Ok(Some(Extracted {
        center,
        bounds,
        geometry: PrimitiveGeometry::Path(path),
        fill,
        stroke,
    }))
}

fn extract_circle(node: &roxmltree::Node) -> Extracted {
    let cx = attr_f64(node, "cx");
    let cy = attr_f64(node, "cy");
    let r = attr_f64(node, "r");
    let (fill, stroke) = paints(node);
    Extracted {
        center: Point::new(cx, cy),
        bounds: Rect::new(cx - r, cy - r, cx + r, cy + r),
        geometry: PrimitiveGeometry::Circle { radius: r },
        fill,
        stroke,
    }
}

fn extract_rect(node: &roxmltree::Node) -> Extracted {
    let x = attr_f64(node, "x");
    let y = attr_f64(node, "y");
    let width = attr_f64(node, "width");
    let height = attr_f64(node, "height");
    let corner_radius = attr_f64(node, "rx");
    let (fill, stroke) = paints(node);
    Extracted {
        center: Point::new(x + width / 2.0, y + height / 2.0),
        bounds: Rect::new(x, y, x + width, y + height),
        geometry: PrimitiveGeometry::Rect {
            width,
            height,
            corner_radius,
        },
        fill,
        stroke,
    }
}

fn extract_ellipse(node: &roxmltree::Node) -> Extracted {
    let cx = attr_f64(node, "cx");
    let cy = attr_f64(node, "cy");
    let rx = attr_f64(node, "rx");
    let ry = attr_f64(node, "ry");
    let (fill, stroke) = paints(node);
    Extracted {
        center: Point::new(cx, cy),
        bounds: Rect::new(cx - rx, cy - ry, cx + rx, cy + ry),
        geometry: PrimitiveGeometry::Ellipse { rx, ry },
        fill,
        stroke,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_circle() {
        let composite =
            decompose(r##"<svg><circle cx="10" cy="10" r="5" fill="#fff"/></svg>"##).expect("parse");
        assert_eq!(composite.children.len(), 1);
        let child = &composite.children[0];
        assert_eq!(child.fill, Some(PaintColor::white()));
        assert_eq!(child.stroke, None);
        match child.geometry {
            PrimitiveGeometry::Circle { radius } => assert!((radius - 5.0).abs() < f64::EPSILON),
            ref other => panic!("expected circle, got {other:?}"),
        }
        // The lone child sits at the composite center.
        assert!((child.offset.x).abs() < f64::EPSILON);
        assert!((child.offset.y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fill_defaults_to_black_stroke_to_none() {
        let composite =
            decompose(r#"<svg><rect x="0" y="0" width="10" height="10"/></svg>"#).expect("parse");
        let child = &composite.children[0];
        assert_eq!(child.fill, Some(PaintColor::black()));
        assert_eq!(child.stroke, None);
    }

    #[test]
    fn test_children_anchor_at_own_centers() {
        let markup = r#"<svg>
            <circle cx="0" cy="0" r="10"/>
            <circle cx="40" cy="0" r="10"/>
        </svg>"#;
        let composite = decompose(markup).expect("parse");
        assert_eq!(composite.children.len(), 2);
        // Union spans x in [-10, 50], center x = 20.
        assert!((composite.children[0].offset.x - -20.0).abs() < 1e-9);
        assert!((composite.children[1].offset.x - 20.0).abs() < 1e-9);
        assert!((composite.natural_size.width - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_document_order_preserved() {
        let markup = r#"<svg>
            <rect x="0" y="0" width="4" height="4"/>
            <ellipse cx="2" cy="2" rx="2" ry="1"/>
            <circle cx="1" cy="1" r="1"/>
        </svg>"#;
        let composite = decompose(markup).expect("parse");
        assert!(matches!(
            composite.children[0].geometry,
            PrimitiveGeometry::Rect { .. }
        ));
        assert!(matches!(
            composite.children[1].geometry,
            PrimitiveGeometry::Ellipse { .. }
        ));
        assert!(matches!(
            composite.children[2].geometry,
            PrimitiveGeometry::Circle { .. }
        ));
    }

    #[test]
    fn test_path_data_parsed_and_recentered() {
        let composite =
            decompose(r##"<svg><path d="M 10 10 L 30 10 L 30 30 Z" fill="#f00"/></svg>"##)
                .expect("parse");
        let child = &composite.children[0];
        match &child.geometry {
            PrimitiveGeometry::Path(path) => {
                let bounds = path.bounding_box();
                // Recentered: bounding box is symmetric around the origin.
                assert!((bounds.center().x).abs() < 1e-9);
                assert!((bounds.center().y).abs() < 1e-9);
            }
            other => panic!("expected path, got {other:?}"),
        }
        assert_eq!(child.fill, Some(PaintColor::new(255, 0, 0, 255)));
    }

    #[test]
    fn test_rect_corner_radius() {
        let composite =
            decompose(r#"<svg><rect x="0" y="0" width="10" height="6" rx="2"/></svg>"#)
                .expect("parse");
        match composite.children[0].geometry {
            PrimitiveGeometry::Rect { corner_radius, .. } => {
                assert!((corner_radius - 2.0).abs() < f64::EPSILON)
            }
            ref other => panic!("expected rect, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_markup_fails() {
        assert!(matches!(
            decompose("<svg><circle"),
            Err(BuildError::Markup(_))
        ));
    }

    #[test]
    fn test_no_primitives_fails() {
        assert!(matches!(
            decompose("<svg><g/></svg>"),
            Err(BuildError::EmptyMarkup)
        ));
    }

    #[test]
    fn test_invalid_path_data_fails_whole_decomposition() {
        let markup = r#"<svg>
            <circle cx="0" cy="0" r="5"/>
            <path d="M zz"/>
        </svg>"#;
        assert!(matches!(decompose(markup), Err(BuildError::PathData(_))));
    }
}
