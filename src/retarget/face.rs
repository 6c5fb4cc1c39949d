//! Face retargeting: neck orientation and expression morphs.
//!
//! The face mesh is reduced to a plane through the nose tip. Every landmark is
//! projected onto that plane and divided by the measured face width and
//! height, so the threshold table below works at any camera distance.

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use super::basis::direction;
use super::smoothing::{normalize, EulerTarget};
use super::SubsystemOutcome;
use crate::avatar::{AvatarBinding, Bone, MeshSlot, Mirroring, MorphTarget, Side};
use crate::config::RetargetConfig;
use crate::tracking::{face_index, Landmark};

/// Neck pitch offset so a camera-facing head tilts slightly down.
const NECK_PITCH_OFFSET: f32 = 0.1 * PI;

/// Scale normalized face landmarks to pixels.
pub fn face_joints(landmarks: &[Landmark], width: f32, height: f32) -> Vec<Vec3> {
    landmarks
        .iter()
        .map(|lm| Vec3::new(lm.x * width, lm.y * height, lm.z * width))
        .collect()
}

/// Face-plane frame anchored at the nose tip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFrame {
    pub nose: Vec3,
    /// Across the face, toward the user's left
    pub x: Vec3,
    /// Up the face
    pub y: Vec3,
    /// Out of the face, through the nose tip
    pub z: Vec3,
    /// Distance between the left and right face boundary
    pub width: f32,
    /// Distance between forehead and chin
    pub height: f32,
}

impl FaceFrame {
    /// Build the frame from pixel-scaled face points.
    ///
    /// Returns `None` when the face has no extent or the nose does not stick
    /// out of the boundary line.
    ///
    /// # Panics
    ///
    /// Panics if `points` does not cover the full face mesh topology.
    pub fn from_points(points: &[Vec3], eps: f32) -> Option<Self> {
        let left = points[face_index::LEFT];
        let right = points[face_index::RIGHT];
        let width = left.distance(right);
        let height = points[face_index::BOTTOM].distance(points[face_index::TOP]);
        if !(width > eps && height > eps) {
            return None;
        }

        let nose = points[face_index::NOSE];
        let z = direction(nose - left.lerp(right, 0.5), eps)?;

        // Bridge of the nose, dropped onto the face plane
        let nasal = points[face_index::NASAL];
        let projected = nasal - z * z.dot(nasal - nose);
        let y = direction(projected - nose, eps)?;
        let x = -direction(z.cross(y), eps)?;

        Some(Self {
            nose,
            x,
            y,
            z,
            width,
            height,
        })
    }

    /// Face-relative 2D coordinates of `point`.
    pub fn project(&self, point: Vec3) -> Vec2 {
        let v = point - self.nose;
        Vec2::new(self.x.dot(v) / self.width, self.y.dot(v) / self.height)
    }

    pub fn project_all(&self, points: &[Vec3]) -> Vec<Vec2> {
        points.iter().map(|&p| self.project(p)).collect()
    }

    /// Neck Euler angles (XYZ) as computed, before mirroring.
    pub fn neck_angles(&self) -> (f32, f32, f32) {
        let angle = |cos: f32| cos.clamp(-1.0, 1.0).acos();
        let rot_x = -(angle(self.z.y) - FRAC_PI_2) + NECK_PITCH_OFFSET;
        let rot_y = angle(self.z.x) - FRAC_PI_2;
        let rot_z = -(angle(self.y.x) - FRAC_PI_2);
        (rot_x, rot_y, rot_z)
    }
}

/// Face-relative quantity a morph is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    /// Upper minus lower eyelid height
    EyelidGap,
    /// Upper minus lower lip height
    LipGap,
    /// Height of the mouth corner
    MouthCorner,
    /// Height of the nose wing
    NoseWing,
}

impl Measure {
    fn of(self, pos: &[Vec2], side: Side) -> f32 {
        use face_index::*;
        let y = |i: usize| pos[i].y;
        match (self, side) {
            (Measure::EyelidGap, Side::Right) => y(RIGHT_EYE_TOP) - y(RIGHT_EYE_BOTTOM),
            (Measure::EyelidGap, Side::Left) => y(LEFT_EYE_TOP) - y(LEFT_EYE_BOTTOM),
            (Measure::LipGap, _) => y(MOUTH_TOP) - y(MOUTH_BOTTOM),
            (Measure::MouthCorner, Side::Right) => y(MOUTH_RIGHT),
            (Measure::MouthCorner, Side::Left) => y(MOUTH_LEFT),
            (Measure::NoseWing, Side::Right) => y(NOSE_RIGHT),
            (Measure::NoseWing, Side::Left) => y(NOSE_LEFT),
        }
    }
}

/// One row of the expression table.
#[derive(Debug, Clone, Copy)]
struct MorphRule {
    name: &'static str,
    mesh: MeshSlot,
    measure: Measure,
    /// One target per side, suffixed `Left`/`Right`
    sided: bool,
    min: f32,
    max: f32,
}

const fn sided(name: &'static str, measure: Measure, min: f32, max: f32) -> MorphRule {
    MorphRule {
        name,
        mesh: MeshSlot::Head,
        measure,
        sided: true,
        min,
        max,
    }
}

const fn single(name: &'static str, mesh: MeshSlot, min: f32, max: f32) -> MorphRule {
    MorphRule {
        name,
        mesh,
        measure: Measure::LipGap,
        sided: false,
        min,
        max,
    }
}

const MORPH_RULES: [MorphRule; 8] = [
    sided("eyesWide", Measure::EyelidGap, 0.1, 0.12),
    sided("eyeSquint", Measure::EyelidGap, 0.1, 0.095),
    sided("eyeBlink", Measure::EyelidGap, 0.1, 0.09),
    single("mouthOpen", MeshSlot::Head, 0.01, 0.15),
    single("jawOpen", MeshSlot::Head, 0.12, 0.16),
    single("jawOpen", MeshSlot::Teeth, 0.12, 0.16),
    sided("mouthSmile", Measure::MouthCorner, -0.22, -0.15),
    sided("noseSneer", Measure::NoseWing, -0.027, -0.018),
];

/// Target weight of every face morph for one set of projected landmarks.
///
/// Sided targets are labelled with the avatar side the measured user side
/// maps to. `positions` must cover the full face mesh topology.
pub fn morph_weights(positions: &[Vec2], mirroring: Mirroring) -> Vec<(MorphTarget, f32)> {
    let mut weights = Vec::with_capacity(MORPH_RULES.len() * 2);
    for rule in &MORPH_RULES {
        if rule.sided {
            for user_side in Side::BOTH {
                let label = mirroring.avatar_side(user_side).as_str();
                let value = rule.measure.of(positions, user_side);
                weights.push((
                    MorphTarget {
                        mesh: rule.mesh,
                        name: format!("{}{}", rule.name, label),
                    },
                    normalize(value, rule.min, rule.max),
                ));
            }
        } else {
            let value = rule.measure.of(positions, Side::Left);
            weights.push((
                MorphTarget {
                    mesh: rule.mesh,
                    name: rule.name.to_string(),
                },
                normalize(value, rule.min, rule.max),
            ));
        }
    }
    weights
}

/// Drive the neck and all face morphs from one face mesh.
///
/// # Panics
///
/// Panics if `landmarks` does not cover the full face mesh topology
/// (see [`Topology::EXPECTED`](crate::tracking::Topology::EXPECTED)).
pub fn apply_face(
    config: &RetargetConfig,
    binding: &mut AvatarBinding,
    landmarks: &[Landmark],
) -> SubsystemOutcome {
    let points = face_joints(
        landmarks,
        config.frame_width as f32,
        config.frame_height as f32,
    );
    let Some(frame) = FaceFrame::from_points(&points, config.degenerate_epsilon) else {
        tracing::trace!("Face plane is degenerate");
        return SubsystemOutcome::DegenerateGeometry;
    };

    let alpha = config.smoothing;
    let sign = config.mirroring.yaw_sign();
    let (rot_x, rot_y, rot_z) = frame.neck_angles();
    binding.smooth_euler(
        Bone::Neck,
        EulerTarget::xyz(rot_x, sign * rot_y, sign * rot_z),
        alpha,
    );

    let positions = frame.project_all(&points);
    for (target, weight) in morph_weights(&positions, config.mirroring) {
        binding.smooth_morph(&target, weight, alpha);
    }

    SubsystemOutcome::Applied
}
