//! Snap rules for positions and angles.
//!
//! Positions snap on gesture end, never during the drag, so dragging stays
//! responsive. Angles snap live while rotating.

/// Rotation snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Divisor turning the visual grid spacing into the snap quantum.
const QUANTUM_DIVISOR: f64 = 8.0;

/// Text positions use a quantum this many times finer than other content.
const TEXT_QUANTUM_DIVISOR: f64 = 4.0;

/// Fraction of the text quantum used as the snap dead-zone radius.
const DEAD_ZONE_FRACTION: f64 = 4.0;

/// Snap quantum for the given grid spacing and zoom level.
///
/// Finer than the visual grid so snapping feels smooth, and divided by the
/// zoom so the on-screen snap distance stays constant.
pub fn snap_quantum(grid_size: f64, zoom: f64) -> f64 {
    (grid_size / QUANTUM_DIVISOR) / zoom
}

/// The finer quantum used for text-like content.
pub fn text_quantum(quantum: f64) -> f64 {
    quantum / TEXT_QUANTUM_DIVISOR
}

/// Snap a coordinate to the nearest multiple of the quantum.
pub fn snap_coord(value: f64, quantum: f64) -> f64 {
    if quantum <= 0.0 {
        return value;
    }
    (value / quantum).round() * quantum
}

/// Snap a text coordinate, with a dead-zone.
///
/// The coordinate snaps to the nearest multiple of the text quantum only when
/// it is already within `quantum / 4` of it; otherwise it keeps its free-drag
/// value. Deliberate alignment still lands exactly, but fine placement never
/// visibly jumps.
pub fn snap_text_coord(value: f64, quantum: f64) -> f64 {
    if quantum <= 0.0 {
        return value;
    }
    let snapped = (value / quantum).round() * quantum;
    if (value - snapped).abs() < quantum / DEAD_ZONE_FRACTION {
        snapped
    } else {
        value
    }
}

/// Quantize an angle in degrees to the nearest snap increment.
pub fn snap_angle(angle_degrees: f64) -> f64 {
    (angle_degrees / ANGLE_SNAP_INCREMENT).round() * ANGLE_SNAP_INCREMENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantum_scales_with_zoom() {
        assert!((snap_quantum(40.0, 1.0) - 5.0).abs() < f64::EPSILON);
        assert!((snap_quantum(40.0, 2.0) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_coord_rounds_to_quantum() {
        assert!((snap_coord(23.0, 5.0) - 25.0).abs() < f64::EPSILON);
        assert!((snap_coord(22.0, 5.0) - 20.0).abs() < f64::EPSILON);
        assert!((snap_coord(-23.0, 5.0) - -25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_coord_exact_multiple() {
        assert!((snap_coord(25.0, 5.0) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_snap_inside_dead_zone() {
        // Quantum 4, dead-zone radius 1: 16.4 is within 0.4 of 16.
        let snapped = snap_text_coord(16.4, 4.0);
        assert!((snapped - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_snap_outside_dead_zone_keeps_raw() {
        // 18.0 is 2.0 away from both 16 and 20, farther than the radius of 1.
        let snapped = snap_text_coord(18.0, 4.0);
        assert!((snapped - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(0.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(7.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(8.0) - 15.0).abs() < 0.01);
        assert!((snap_angle(22.0) - 15.0).abs() < 0.01);
        assert!((snap_angle(23.0) - 30.0).abs() < 0.01);
        assert!((snap_angle(44.0) - 45.0).abs() < 0.01);
        assert!((snap_angle(-7.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(-8.0) - -15.0).abs() < 0.01);
    }
}
