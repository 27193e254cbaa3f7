//! Serializable paint colors and markup color parsing.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PaintColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for PaintColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<PaintColor> for Color {
    fn from(color: PaintColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Parse a markup paint attribute into a color.
///
/// Returns `None` for `none`/`transparent` (no paint). Unrecognized values
/// fall back to opaque black, matching how the decomposer defaults fills.
pub fn parse_paint(value: &str) -> Option<PaintColor> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("transparent") {
        return None;
    }

    // Handle hex colors (#rgb, #rrggbb, #rrggbbaa)
    if let Some(hex) = value.strip_prefix('#').filter(|h| h.is_ascii()) {
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = u8::from_str_radix(&hex[0..1], 16).unwrap_or(0) * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).unwrap_or(0) * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).unwrap_or(0) * 17;
                return Some(PaintColor::new(r, g, b, 255));
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                return Some(PaintColor::new(r, g, b, 255));
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                let a = u8::from_str_radix(&hex[6..8], 16).unwrap_or(255);
                return Some(PaintColor::new(r, g, b, a));
            }
            _ => {}
        }
    }

    // Small set of named colors seen in element markup.
    match value.to_ascii_lowercase().as_str() {
        "black" => Some(PaintColor::black()),
        "white" => Some(PaintColor::white()),
        "red" => Some(PaintColor::new(255, 0, 0, 255)),
        "green" => Some(PaintColor::new(0, 128, 0, 255)),
        "blue" => Some(PaintColor::new(0, 0, 255, 255)),
        "yellow" => Some(PaintColor::new(255, 255, 0, 255)),
        _ => Some(PaintColor::black()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_paint("#fff"), Some(PaintColor::white()));
        assert_eq!(parse_paint("#000000"), Some(PaintColor::black()));
        assert_eq!(
            parse_paint("#ff000080"),
            Some(PaintColor::new(255, 0, 0, 128))
        );
    }

    #[test]
    fn test_parse_none() {
        assert_eq!(parse_paint("none"), None);
        assert_eq!(parse_paint("transparent"), None);
    }

    #[test]
    fn test_unknown_falls_back_to_black() {
        assert_eq!(parse_paint("chartreuse"), Some(PaintColor::black()));
    }

    #[test]
    fn test_peniko_roundtrip() {
        let color: Color = PaintColor::new(12, 34, 56, 78).into();
        let back: PaintColor = color.into();
        assert_eq!(back, PaintColor::new(12, 34, 56, 78));
    }
}
