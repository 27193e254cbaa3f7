//! Bridge text: characters laid out along a parametric arch or triangle.

use crate::element::{ArcSpec, FontSpec};
use crate::metrics::char_advance;
use crate::scene::Bridge;
use std::f64::consts::PI;

/// Default bridge node extents.
pub const BRIDGE_NODE_WIDTH: f64 = 300.0;
pub const BRIDGE_NODE_HEIGHT: f64 = 150.0;

/// Build a bridge visual from content, font and curve parameters.
pub fn build(content: String, font: FontSpec, arc: ArcSpec) -> Bridge {
    Bridge {
        content,
        font,
        arc,
        width: BRIDGE_NODE_WIDTH,
        height: BRIDGE_NODE_HEIGHT,
    }
}

/// Placement of one character, in node-local coordinates (origin at the
/// node's top-left, y growing downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    pub ch: char,
    /// Horizontal center of the glyph.
    pub center_x: f64,
    /// Baseline y.
    pub baseline_y: f64,
    /// Rotation in radians around the glyph center.
    pub rotation: f64,
}

/// Lay out every character of a bridge node along its curve.
///
/// Character `i` of `n` is assigned `percent = i / (n - 1)` (0.5 for a single
/// character). Arch mode raises the run by `-curve * sin(π(percent - 0.5))`
/// and rotates by `(percent - 0.5) * curve / 100` radians; triangle mode uses
/// `-curve * 2 * |percent - 0.5|` and `(percent - 0.5) * 0.7`. Horizontal
/// advance accumulates per-glyph measured widths, so spacing stays
/// proportional rather than monospaced.
pub fn layout_glyphs(bridge: &Bridge) -> Vec<GlyphPlacement> {
    let chars: Vec<char> = bridge.content.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let size = bridge.font.size;
    let arc = &bridge.arc;
    let total_width: f64 = chars.iter().map(|&c| char_advance(c, size)).sum();
    let mut x = bridge.width / 2.0 - total_width / 2.0;

    let mut placements = Vec::with_capacity(chars.len());
    for (i, &ch) in chars.iter().enumerate() {
        let advance = char_advance(ch, size);
        let percent = if chars.len() == 1 {
            0.5
        } else {
            i as f64 / (chars.len() - 1) as f64
        };

        let curve_offset = if arc.triangle {
            -arc.curve * 2.0 * (percent - 0.5).abs()
        } else {
            -arc.curve * (PI * (percent - 0.5)).sin()
        };
        let baseline_y = arc.offset_y + curve_offset + arc.text_height + arc.bottom;

        let rotation = if arc.triangle {
            (percent - 0.5) * 0.7
        } else {
            (percent - 0.5) * (arc.curve / 100.0)
        };

        placements.push(GlyphPlacement {
            ch,
            center_x: x + advance / 2.0,
            baseline_y,
            rotation,
        });
        x += advance;
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge(content: &str, triangle: bool) -> Bridge {
        let arc = ArcSpec {
            triangle,
            ..ArcSpec::default()
        };
        build(content.to_string(), FontSpec::default(), arc)
    }

    #[test]
    fn test_arch_symmetry() {
        let placements = layout_glyphs(&bridge("HELLO", false));
        assert_eq!(placements.len(), 5);

        // Middle character is unrotated; the outer pair rotate by equal
        // magnitudes with opposite signs.
        assert!(placements[2].rotation.abs() < 1e-9);
        assert!((placements[0].rotation + placements[4].rotation).abs() < 1e-9);
        assert!(placements[0].rotation < 0.0);
        assert!(placements[4].rotation > 0.0);
    }

    #[test]
    fn test_arch_raises_the_middle() {
        let placements = layout_glyphs(&bridge("HELLO", false));
        // Smaller y = higher on screen.
        assert!(placements[2].baseline_y < placements[0].baseline_y);
        assert!((placements[0].baseline_y - placements[4].baseline_y).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_apex_and_slope() {
        let placements = layout_glyphs(&bridge("HELLO", true));
        let arc = ArcSpec::default();
        // Apex at the middle: curve term vanishes there.
        let middle_expected = arc.offset_y + arc.text_height + arc.bottom;
        assert!((placements[2].baseline_y - middle_expected).abs() < 1e-9);
        // Ends sit a full curve radius lower.
        assert!((placements[0].baseline_y - (middle_expected + arc.curve)).abs() < 1e-9);
        // Fixed slope factor, independent of curve.
        assert!((placements[0].rotation - -0.35).abs() < 1e-9);
        assert!((placements[4].rotation - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_single_character_centers() {
        let placements = layout_glyphs(&bridge("A", false));
        assert_eq!(placements.len(), 1);
        // percent = 0.5: no curve offset, no rotation, centered in the node.
        assert!(placements[0].rotation.abs() < 1e-9);
        assert!((placements[0].center_x - BRIDGE_NODE_WIDTH / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_proportional_advance() {
        let placements = layout_glyphs(&bridge("iw", false));
        let gap = placements[1].center_x - placements[0].center_x;
        // The gap between centers is the mean of the two advances; both are
        // positive and the run is ordered left to right.
        assert!(gap > 0.0);

        let wide = layout_glyphs(&bridge("ww", false));
        let wide_gap = wide[1].center_x - wide[0].center_x;
        // 'w' advances farther than 'i', so the all-wide pair spreads more.
        assert!(wide_gap > gap);
    }

    #[test]
    fn test_empty_content() {
        assert!(layout_glyphs(&bridge("", false)).is_empty());
    }
}
