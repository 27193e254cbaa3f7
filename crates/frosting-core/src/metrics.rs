//! Approximate glyph metrics.
//!
//! The engine needs text extents before a real layout pass has run, and the
//! bridge layout needs per-glyph advances so spacing stays proportional.
//! These values are empirically determined approximations; the renderer
//! refines label bounds with real layout results where available.

/// Line height multiplier relative to font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Approximate advance width of a single character at the given font size.
///
/// Proportional, not monospaced: narrow glyphs ('i', 'l', punctuation)
/// advance less than wide ones ('m', 'w').
pub fn char_advance(c: char, font_size: f64) -> f64 {
    let factor = match c {
        'i' | 'j' | 'l' | '!' | '\'' | '|' | '.' | ',' | ':' | ';' => 0.30,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.38,
        'm' | 'w' => 0.78,
        'M' | 'W' | '@' => 0.88,
        ' ' => 0.33,
        '0'..='9' => 0.55,
        'A'..='Z' => 0.66,
        _ => 0.52,
    };
    font_size * factor
}

/// Approximate advance of a whole string, including letter spacing between
/// consecutive characters.
pub fn text_advance(text: &str, font_size: f64, letter_spacing: f64) -> f64 {
    let mut width = 0.0;
    let mut chars = 0usize;
    for c in text.chars() {
        width += char_advance(c, font_size);
        chars += 1;
    }
    if chars > 1 {
        width += letter_spacing * (chars - 1) as f64;
    }
    width
}

/// Approximate extents of a (possibly multi-line) text block.
pub fn text_extents(text: &str, font_size: f64, letter_spacing: f64) -> (f64, f64) {
    let width = text
        .lines()
        .map(|line| text_advance(line, font_size, letter_spacing))
        .fold(0.0, f64::max);

    let mut line_count = text.lines().count().max(1);
    if text.ends_with('\n') {
        line_count += 1;
    }
    let height = line_count as f64 * font_size * LINE_HEIGHT_FACTOR;

    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_advance() {
        // Narrow glyphs must advance less than wide ones.
        assert!(char_advance('i', 40.0) < char_advance('w', 40.0));
        assert!(char_advance('l', 40.0) < char_advance('M', 40.0));
    }

    #[test]
    fn test_letter_spacing_applies_between_chars() {
        let plain = text_advance("ab", 20.0, 0.0);
        let spaced = text_advance("ab", 20.0, 5.0);
        assert!((spaced - plain - 5.0).abs() < 1e-9);
        // A single character gets no spacing at all.
        assert!((text_advance("a", 20.0, 5.0) - text_advance("a", 20.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_multiline_extents() {
        let (w, h) = text_extents("hi\nthere", 20.0, 0.0);
        assert!((h - 2.0 * 20.0 * LINE_HEIGHT_FACTOR).abs() < 1e-9);
        assert!((w - text_advance("there", 20.0, 0.0)).abs() < 1e-9);
    }
}
