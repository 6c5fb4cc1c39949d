//! Body retargeting: spine, root, arm and leg chains.
//!
//! World landmarks are negated into the avatar's coordinate convention, then
//! two independent visibility gates decide what runs. The shoulder gate drives
//! the spine and both arm chains. The hip gate drives root yaw, horizontal
//! root translation and both leg chains, and resets the legs to identity when
//! it closes.

use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use super::basis::{direction, direction_or_zero, Basis};
use super::smoothing::EulerTarget;
use super::{drive_joint, ChainParams, SubsystemOutcome};
use crate::avatar::{AvatarBinding, Bone, Digit, Side};
use crate::config::RetargetConfig;
use crate::tracking::{Landmark, PoseLandmark};

/// Spine pitch offset; the torso leans back slightly in the neutral pose.
const SPINE_PITCH_OFFSET: f32 = 1.2 * FRAC_PI_2;

/// Forward spine pitch applied while the hips are tracked.
const HIP_SPINE_PITCH: f32 = 0.1 * PI;

/// Negate world landmarks into avatar space.
pub fn user_joints(world: &[Landmark]) -> Vec<Vec3> {
    world.iter().map(|lm| -lm.position()).collect()
}

/// Both landmarks are strictly more visible than `threshold`.
///
/// # Panics
///
/// Panics if `world` holds fewer than [`PoseLandmark::COUNT`] landmarks.
pub fn gate_open(world: &[Landmark], a: PoseLandmark, b: PoseLandmark, threshold: f32) -> bool {
    world[a.index()].visibility_or_zero() > threshold
        && world[b.index()].visibility_or_zero() > threshold
}

/// Frame spanned by a left/right landmark pair and the shoulder midpoint.
///
/// x runs left → right and must have a direction. y is the normalized
/// shoulder midpoint and z = x × y; either may collapse to zero.
fn torso_frame(
    joints: &[Vec3],
    left: PoseLandmark,
    right: PoseLandmark,
    eps: f32,
) -> Option<Basis> {
    let x = direction(joints[right.index()] - joints[left.index()], eps)?;
    let y = direction_or_zero(shoulder_midpoint(joints), eps);
    let z = direction_or_zero(x.cross(y), eps);
    Some(Basis::from_axes(x, y, z))
}

fn shoulder_midpoint(joints: &[Vec3]) -> Vec3 {
    let right = joints[PoseLandmark::RightShoulder.index()];
    right.lerp(joints[PoseLandmark::LeftShoulder.index()], 0.5)
}

fn angle(cos: f32) -> f32 {
    cos.clamp(-1.0, 1.0).acos()
}

/// Spine Euler angles (XYZ) from the shoulder frame.
pub fn spine_angles(frame: &Basis) -> (f32, f32, f32) {
    let rot_x = angle(frame.z.y) - SPINE_PITCH_OFFSET;
    let rot_y = -angle(frame.z.x) + FRAC_PI_2;
    let rot_z = angle(frame.y.x) - FRAC_PI_2;
    (rot_x, rot_y, rot_z)
}

/// Root yaw from the hip frame.
pub fn root_yaw(frame: &Basis) -> f32 {
    -angle(frame.z.x) + FRAC_PI_2
}

fn chain_params(config: &RetargetConfig) -> ChainParams {
    ChainParams {
        layout: config.basis_layout,
        eps: config.degenerate_epsilon,
        alpha: config.smoothing,
    }
}

/// Spine orientation plus both shoulder → elbow → wrist chains.
///
/// # Panics
///
/// Panics if `world` or `joints` holds fewer than [`PoseLandmark::COUNT`]
/// points. [`Retargeter::apply`](super::Retargeter::apply) only calls this
/// with complete sets.
pub fn apply_upper_body(
    config: &RetargetConfig,
    binding: &mut AvatarBinding,
    world: &[Landmark],
    joints: &[Vec3],
) -> SubsystemOutcome {
    if !gate_open(
        world,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        config.visibility_threshold,
    ) {
        tracing::trace!("Upper body gate closed");
        return SubsystemOutcome::LowConfidence;
    }

    let eps = config.degenerate_epsilon;
    let shoulders = (PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder);
    let Some(frame) = torso_frame(joints, shoulders.0, shoulders.1, eps) else {
        tracing::trace!("Shoulders coincide, skipping upper body");
        return SubsystemOutcome::DegenerateGeometry;
    };

    let yaw_sign = config.mirroring.yaw_sign();
    let (rot_x, rot_y, rot_z) = spine_angles(&frame);
    binding.smooth_euler(
        Bone::Spine,
        EulerTarget::xyz(rot_x, yaw_sign * rot_y, rot_z),
        config.smoothing,
    );

    let params = chain_params(config);
    for user_side in Side::BOTH {
        let side = config.mirroring.avatar_side(user_side);
        drive_arm(binding, joints, user_side, side, &frame, params);
    }

    SubsystemOutcome::Applied
}

fn drive_arm(
    binding: &mut AvatarBinding,
    joints: &[Vec3],
    user_side: Side,
    side: Side,
    frame: &Basis,
    params: ChainParams,
) {
    let at = |lm: PoseLandmark| joints[lm.index()];
    let shoulder = at(PoseLandmark::shoulder(user_side));
    let elbow = at(PoseLandmark::elbow(user_side));
    let wrist = at(PoseLandmark::wrist(user_side));
    let fingers = at(PoseLandmark::pinky(user_side))
        .lerp(at(PoseLandmark::index_finger(user_side)), 0.5);

    let rest_elbow = binding.rest_position(Bone::Elbow(side));
    let rest_wrist = binding.rest_position(Bone::Wrist(side));
    // The hand points at the knuckle line between pinky and index
    let rest_fingers = match (
        binding.rest_position(Bone::Finger(side, Digit::Pinky, 1)),
        binding.rest_position(Bone::Finger(side, Digit::Index, 1)),
    ) {
        (Some(pinky), Some(index)) => Some(pinky.lerp(index, 0.5)),
        _ => None,
    };

    let shoulder_bone = Bone::Shoulder(side);
    let basis = drive_joint(binding, shoulder_bone, shoulder, elbow, rest_elbow, frame, params);
    let basis = drive_joint(binding, Bone::Elbow(side), elbow, wrist, rest_wrist, &basis, params);
    drive_joint(binding, Bone::Wrist(side), wrist, fingers, rest_fingers, &basis, params);
}

/// Root yaw and translation plus both hip → knee → ankle chains.
///
/// A closed gate snaps the leg bones to identity with no smoothing.
///
/// # Panics
///
/// Panics if `world`, `joints` or `image` holds fewer than
/// [`PoseLandmark::COUNT`] points.
pub fn apply_lower_body(
    config: &RetargetConfig,
    binding: &mut AvatarBinding,
    world: &[Landmark],
    joints: &[Vec3],
    image: Option<&[Landmark]>,
) -> SubsystemOutcome {
    if !gate_open(
        world,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        config.visibility_threshold,
    ) {
        tracing::trace!("Lower body gate closed, resetting legs");
        reset_legs(binding);
        return SubsystemOutcome::Reset;
    }

    let eps = config.degenerate_epsilon;
    let Some(frame) = torso_frame(joints, PoseLandmark::LeftHip, PoseLandmark::RightHip, eps) else {
        tracing::trace!("Hips coincide, skipping lower body");
        return SubsystemOutcome::DegenerateGeometry;
    };

    let alpha = config.smoothing;
    let yaw = config.mirroring.yaw_sign() * root_yaw(&frame);
    binding.smooth_euler(Bone::Hips, EulerTarget::y(yaw), alpha);
    binding.smooth_euler(Bone::Spine, EulerTarget::xy(HIP_SPINE_PITCH, -yaw), alpha);

    if let Some(image) = image {
        let offset = hip_center_offset(image);
        let x = config.mirroring.yaw_sign() * offset * config.root_translation_scale;
        binding.smooth_root_x(x, alpha);
    }

    let params = chain_params(config);
    for user_side in Side::BOTH {
        let side = config.mirroring.avatar_side(user_side);
        drive_leg(binding, joints, user_side, side, &frame, params);
    }

    SubsystemOutcome::Applied
}

/// Horizontal offset of the hip center from the middle of the image, in
/// frame widths (`-0.5..=0.5` while on screen).
///
/// # Panics
///
/// Panics if `image` holds fewer than [`PoseLandmark::COUNT`] landmarks.
pub fn hip_center_offset(image: &[Landmark]) -> f32 {
    let left = image[PoseLandmark::LeftHip.index()].x;
    let right = image[PoseLandmark::RightHip.index()].x;
    (left + right) * 0.5 - 0.5
}

fn drive_leg(
    binding: &mut AvatarBinding,
    joints: &[Vec3],
    user_side: Side,
    side: Side,
    frame: &Basis,
    params: ChainParams,
) {
    let at = |lm: PoseLandmark| joints[lm.index()];
    let hip = at(PoseLandmark::hip(user_side));
    let knee = at(PoseLandmark::knee(user_side));
    let ankle = at(PoseLandmark::ankle(user_side));
    let foot = at(PoseLandmark::foot(user_side));

    let rest_knee = binding.rest_position(Bone::Knee(side));
    let rest_ankle = binding.rest_position(Bone::Ankle(side));
    let rest_toe = binding.rest_position(Bone::Toe(side));

    let basis = drive_joint(binding, Bone::Hip(side), hip, knee, rest_knee, frame, params);
    let basis = drive_joint(binding, Bone::Knee(side), knee, ankle, rest_ankle, &basis, params);
    drive_joint(binding, Bone::Ankle(side), ankle, foot, rest_toe, &basis, params);
}

fn reset_legs(binding: &mut AvatarBinding) {
    for side in Side::BOTH {
        for bone in Bone::leg_chain(side) {
            binding.set_rotation(bone, Quat::IDENTITY);
        }
    }
}
