//! Hand retargeting: single-axis thumb and finger flexion.
//!
//! Full 3-DoF finger rotations from noisy landmarks twist unnaturally, so every
//! phalanx keeps only one flexion angle, clamped to `[0, π/2]`. The thumb
//! flexes about x; the other four fingers flex about z.

use glam::{EulerRot, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use super::basis::{direction, direction_or_zero, rotate_bone, Basis, BasisLayout};
use super::smoothing::EulerTarget;
use super::{advance_basis, SubsystemOutcome};
use crate::avatar::{AvatarBinding, Bone, Digit, Side};
use crate::config::RetargetConfig;
use crate::tracking::{HandLandmark, Landmark};

/// Upper flexion limit of any phalanx.
const MAX_FLEXION: f32 = FRAC_PI_2;

/// Thumb offset for the right hand, whose rest pose is mirrored.
const RIGHT_THUMB_OFFSET: f32 = 0.2 * PI;

const FINGERS: [Digit; 4] = [Digit::Index, Digit::Middle, Digit::Ring, Digit::Pinky];

/// Scale normalized hand landmarks to pixels with y pointing up.
pub fn hand_joints(landmarks: &[Landmark], width: f32, height: f32) -> Vec<Vec3> {
    landmarks
        .iter()
        .map(|lm| Vec3::new(lm.x * width, -lm.y * height, lm.z * width))
        .collect()
}

/// Hand-local frame of the user's `side` hand.
///
/// x runs along the palm (toward the wrist on the left hand, toward the
/// fingers on the right), z runs from the ring knuckle to the index knuckle,
/// and y is their cross product, oriented out of the back of the hand.
///
/// # Panics
///
/// Panics if `joints` holds fewer than [`HandLandmark::COUNT`] points.
pub fn hand_frame(joints: &[Vec3], side: Side, eps: f32) -> Option<Basis> {
    let at = |lm: HandLandmark| joints[lm.index()];

    let mut x = direction(at(HandLandmark::Wrist) - at(HandLandmark::MiddleMcp), eps)?;
    if side == Side::Right {
        x = -x;
    }
    let z = direction(at(HandLandmark::IndexMcp) - at(HandLandmark::RingMcp), eps)?;
    let mut y = direction_or_zero(x.cross(z), eps);
    if side == Side::Left {
        y = -y;
    }
    Some(Basis::from_axes(x, y, z))
}

/// Thumb flexion: the whole rotation angle, clamped.
pub fn thumb_flexion(rotation: Quat) -> f32 {
    let (_, angle) = rotation.to_axis_angle();
    angle.clamp(0.0, MAX_FLEXION)
}

/// Finger flexion: the Euler z component, clamped.
pub fn finger_flexion(rotation: Quat) -> f32 {
    let (_, _, z) = rotation.to_euler(EulerRot::XYZ);
    z.clamp(0.0, MAX_FLEXION)
}

/// Drive all five digits of one hand.
///
/// # Panics
///
/// Panics if `landmarks` holds fewer than [`HandLandmark::COUNT`] points.
pub fn apply_hand(
    config: &RetargetConfig,
    binding: &mut AvatarBinding,
    landmarks: &[Landmark],
    user_side: Side,
) -> SubsystemOutcome {
    let eps = config.degenerate_epsilon;
    let joints = hand_joints(
        landmarks,
        config.frame_width as f32,
        config.frame_height as f32,
    );
    let Some(frame) = hand_frame(&joints, user_side, eps) else {
        tracing::trace!("{} hand frame is degenerate", user_side.as_str());
        return SubsystemOutcome::DegenerateGeometry;
    };

    let side = config.mirroring.avatar_side(user_side);
    let alpha = config.smoothing;

    // Thumb
    let mut basis = frame;
    for phalanx in 1..=3 {
        let bone = Bone::Finger(side, Digit::Thumb, phalanx);
        let solved = solve_phalanx(binding, &joints, side, Digit::Thumb, phalanx, &basis, eps);
        if let Some(rotation) = solved {
            let angle = thumb_flexion(rotation);
            let target = match user_side {
                Side::Left => angle,
                Side::Right => angle - RIGHT_THUMB_OFFSET,
            };
            binding.smooth_euler(bone, EulerTarget::x(target), alpha);
        }
        basis = advance_basis(binding, bone, &basis);
    }

    for digit in FINGERS {
        let mut basis = frame;
        for phalanx in 1..=3 {
            let bone = Bone::Finger(side, digit, phalanx);
            let solved = solve_phalanx(binding, &joints, side, digit, phalanx, &basis, eps);
            if let Some(rotation) = solved {
                let angle = finger_flexion(rotation);
                let target = match user_side {
                    Side::Left => angle,
                    Side::Right => -angle,
                };
                binding.smooth_euler(bone, EulerTarget::z(target), alpha);
            }
            basis = advance_basis(binding, bone, &basis);
        }
    }

    SubsystemOutcome::Applied
}

/// Rotation pointing a phalanx at the next joint, if both bones are bound
/// and the geometry is usable.
fn solve_phalanx(
    binding: &AvatarBinding,
    joints: &[Vec3],
    side: Side,
    digit: Digit,
    phalanx: u8,
    basis: &Basis,
    eps: f32,
) -> Option<Quat> {
    if !binding.has_bone(Bone::Finger(side, digit, phalanx)) {
        return None;
    }
    let rest_child = binding.rest_position(Bone::Finger(side, digit, phalanx + 1))?;
    let j = digit.base_landmark() + usize::from(phalanx) - 1;
    rotate_bone(joints[j], joints[j + 1], rest_child, basis, BasisLayout::Columns, eps)
}
