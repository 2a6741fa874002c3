//! Camera controllers for the flat map and the globe.
//!
//! Both track a current and a target value per axis. Input writes targets;
//! `update` moves current toward target with a frame-rate independent
//! exponential ease.

pub mod flat;
pub mod orbit;

pub use flat::FlatCamera;
pub use orbit::OrbitCamera;

/// Interpolation weight for one frame: `1 - decay^dt`.
///
/// `decay` is the fraction of the gap still left after one second.
pub fn damp_factor(decay: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    (1.0 - decay.powf(dt)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damp_is_frame_rate_independent() {
        let decay = 0.0005;
        // Two half steps leave the same remainder as one full step.
        let half = 1.0 - damp_factor(decay, 0.008);
        let full = 1.0 - damp_factor(decay, 0.016);
        assert!((half * half - full).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dt_does_not_move() {
        assert_eq!(damp_factor(0.0005, 0.0), 0.0);
    }
}
