//! Per-channel smoothing and threshold mapping.
//!
//! Every retargeted channel blends its previous value toward the freshly
//! computed one by a fixed factor. Scalars such as morph weights and the
//! root's horizontal offset use an exponential moving average. Full rotations
//! use slerp, while single-axis bone rotations apply the average per Euler
//! component.

use glam::{EulerRot, Quat};

/// Default blend factor toward the new value.
pub const DEFAULT_SMOOTHING: f32 = 0.25;

/// Exponential moving average step: `prev * (1 - alpha) + next * alpha`.
pub fn ema(prev: f32, next: f32, alpha: f32) -> f32 {
    (1.0 - alpha) * prev + alpha * next
}

/// Spherical blend from `current` toward `target`.
pub fn smooth_rotation(current: Quat, target: Quat, alpha: f32) -> Quat {
    current.slerp(target, alpha).normalize()
}

/// Linear map of `val` from `[min, max]` to `[0, 1]`, clamped at both ends.
///
/// `min > max` describes a falling ramp: the result is 0 at or above `min`
/// and 1 at or below `max`.
pub fn normalize(val: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range == 0.0 {
        return if val >= max { 1.0 } else { 0.0 };
    }
    ((val - min) / range).clamp(0.0, 1.0)
}

/// Target Euler angles (XYZ order) for a bone; `None` leaves that axis alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerTarget {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl EulerTarget {
    pub fn xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    pub fn x(x: f32) -> Self {
        Self {
            x: Some(x),
            ..Default::default()
        }
    }

    pub fn y(y: f32) -> Self {
        Self {
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn z(z: f32) -> Self {
        Self {
            z: Some(z),
            ..Default::default()
        }
    }

    pub fn xy(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}

/// Blend the Euler components of `current` toward `target`.
///
/// Returns `current` unchanged if any requested angle is not finite.
pub fn smooth_euler(current: Quat, target: EulerTarget, alpha: f32) -> Quat {
    if !target.is_finite() {
        return current;
    }
    let (mut x, mut y, mut z) = current.to_euler(EulerRot::XYZ);
    if let Some(tx) = target.x {
        x = ema(x, tx, alpha);
    }
    if let Some(ty) = target.y {
        y = ema(y, ty, alpha);
    }
    if let Some(tz) = target.z {
        z = ema(z, tz, alpha);
    }
    Quat::from_euler(EulerRot::XYZ, x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(normalize(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(normalize(0.0, 0.0, 1.0), 0.0);
        assert_eq!(normalize(1.0, 0.0, 1.0), 1.0);
        assert_eq!(normalize(7.0, 0.0, 1.0), 1.0);
        assert!((normalize(0.25, 0.0, 1.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_monotonic_and_linear() {
        let (min, max) = (0.01, 0.15);
        let mut prev = normalize(-1.0, min, max);
        for i in 0..=200 {
            let val = -0.05 + i as f32 * 0.001;
            let out = normalize(val, min, max);
            assert!(out >= prev, "not monotonic at {}", val);
            assert!((0.0..=1.0).contains(&out));
            if val > min && val < max {
                let expected = (val - min) / (max - min);
                assert!((out - expected).abs() < 1e-5);
            }
            prev = out;
        }
    }

    #[test]
    fn test_normalize_falling_ramp() {
        // Blink thresholds: wider gap → less blink.
        assert_eq!(normalize(0.11, 0.1, 0.09), 0.0);
        assert_eq!(normalize(0.08, 0.1, 0.09), 1.0);
        assert!((normalize(0.095, 0.1, 0.09) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_ema_converges_without_overshoot() {
        let target = 1.0_f32;
        let mut value = 0.0;
        let mut prev_err = target - value;
        for _ in 0..200 {
            value = ema(value, target, DEFAULT_SMOOTHING);
            assert!(value <= target, "overshoot: {}", value);
            let err = target - value;
            // Geometric convergence: error shrinks by (1 - alpha) each step
            assert!((err - prev_err * (1.0 - DEFAULT_SMOOTHING)).abs() < 1e-6);
            prev_err = err;
        }
        assert!((value - target).abs() < 1e-6);
    }

    #[test]
    fn test_ema_tracks_monotonic_input_from_below() {
        let mut value = 0.0;
        for i in 1..=50 {
            let input = i as f32 * 0.1;
            value = ema(value, input, DEFAULT_SMOOTHING);
            assert!(value <= input);
        }
    }

    #[test]
    fn test_smooth_rotation_converges() {
        let target = Quat::from_rotation_y(1.0);
        let mut q = Quat::IDENTITY;
        for _ in 0..120 {
            q = smooth_rotation(q, target, DEFAULT_SMOOTHING);
        }
        assert!(q.angle_between(target) < 1e-4);
    }

    #[test]
    fn test_smooth_euler_leaves_unset_axes() {
        let current = Quat::from_euler(EulerRot::XYZ, 0.2, 0.3, 0.0);
        let out = smooth_euler(current, EulerTarget::z(0.4), 1.0);
        let (x, y, z) = out.to_euler(EulerRot::XYZ);
        assert!((x - 0.2).abs() < 1e-4);
        assert!((y - 0.3).abs() < 1e-4);
        assert!((z - 0.4).abs() < 1e-4);
    }

    #[test]
    fn test_smooth_euler_blends() {
        let out = smooth_euler(Quat::IDENTITY, EulerTarget::x(0.8), DEFAULT_SMOOTHING);
        let (x, _, _) = out.to_euler(EulerRot::XYZ);
        assert!((x - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_smooth_euler_rejects_nan() {
        let current = Quat::from_rotation_x(0.5);
        let out = smooth_euler(current, EulerTarget::xyz(f32::NAN, 0.0, 0.0), 0.5);
        assert_eq!(out, current);
    }
}
