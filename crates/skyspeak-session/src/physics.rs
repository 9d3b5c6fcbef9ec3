//! Flight physics: gravity, cosmetic rotation and the low-altitude edge.

/// Upper bound on the nose-down rotation while falling.
const MAX_FALL_ROTATION: f32 = 15.0;

/// Altitude lost per degree of target rotation.
const ALTITUDE_PER_DEGREE: f32 = 500.0;

/// Fraction of the gap to the target closed on each tick.
const ROTATION_SMOOTHING: f32 = 0.1;

/// Altitude after one gravity tick. Never goes below zero.
pub const fn apply_gravity(altitude: u32, gravity_force: u32) -> u32 {
    altitude.saturating_sub(gravity_force)
}

/// Rotation the plane drifts toward at `altitude`.
#[allow(clippy::cast_precision_loss)]
pub fn fall_rotation_target(altitude: u32, initial_altitude: u32) -> f32 {
    let drop = initial_altitude as f32 - altitude as f32;
    (drop / ALTITUDE_PER_DEGREE).min(MAX_FALL_ROTATION)
}

/// One smoothing step from `rotation` toward the fall target.
pub fn smooth_rotation(rotation: f32, altitude: u32, initial_altitude: u32) -> f32 {
    let target = fall_rotation_target(altitude, initial_altitude);
    (target - rotation).mul_add(ROTATION_SMOOTHING, rotation)
}

/// Whether a gravity tick from `prev` to `next` just crossed into the warning band.
pub const fn crossed_low_altitude(prev: u32, next: u32, threshold: u32) -> bool {
    prev > threshold && next <= threshold && next > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_saturates_at_zero() {
        assert_eq!(apply_gravity(100, 15), 85);
        assert_eq!(apply_gravity(10, 15), 0);
        assert_eq!(apply_gravity(0, 15), 0);
    }

    #[test]
    fn rotation_target_is_capped() {
        assert!(fall_rotation_target(10_000, 10_000).abs() < f32::EPSILON);
        assert!((fall_rotation_target(7_500, 10_000) - 5.0).abs() < f32::EPSILON);
        assert!((fall_rotation_target(0, 10_000) - 15.0).abs() < f32::EPSILON);
        // Above the start altitude the nose lifts.
        assert!(fall_rotation_target(11_000, 10_000) < 0.0);
    }

    #[test]
    fn smoothing_moves_a_tenth_of_the_way() {
        let next = smooth_rotation(0.0, 5_000, 10_000);
        assert!((next - 1.0).abs() < 1e-6);
    }

    #[test]
    fn warning_is_edge_triggered() {
        assert!(crossed_low_altitude(1_010, 995, 1_000));
        assert!(crossed_low_altitude(1_001, 1_000, 1_000));
        assert!(!crossed_low_altitude(995, 980, 1_000));
        assert!(!crossed_low_altitude(1_010, 0, 1_000));
        assert!(!crossed_low_altitude(1_500, 1_485, 1_000));
    }
}
