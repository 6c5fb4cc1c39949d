//! Retargeting engine
//!
//! Turns one [`DetectionFrame`] into bone rotations, a root offset and morph
//! weights on an [`AvatarBinding`]. The body, hand and face retargeters run
//! independently: a missing landmark set only idles its own subsystem.

pub mod basis;
pub mod body;
pub mod face;
pub mod hand;
pub mod smoothing;

use serde::Serialize;

use crate::avatar::{AvatarBinding, Bone, Side};
use crate::config::{Config, RetargetConfig};
use crate::error::Result;
use crate::tracking::DetectionFrame;
use basis::{rotate_bone, Basis, BasisLayout};

/// What one subsystem did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemOutcome {
    /// New targets were blended into the pose
    Applied,
    /// The landmark set was absent or had the wrong length
    #[default]
    MissingInput,
    /// The visibility gate was closed; the pose is held
    LowConfidence,
    /// The visibility gate was closed and the bones were reset to identity
    Reset,
    /// The frame's anchor geometry was degenerate; the pose is held
    DegenerateGeometry,
}

/// Per-subsystem outcome of [`Retargeter::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FrameReport {
    pub upper_body: SubsystemOutcome,
    pub lower_body: SubsystemOutcome,
    /// The user's left hand
    pub left_hand: SubsystemOutcome,
    /// The user's right hand
    pub right_hand: SubsystemOutcome,
    pub face: SubsystemOutcome,
}

impl FrameReport {
    /// True if any subsystem changed the pose.
    pub fn any_applied(&self) -> bool {
        [
            self.upper_body,
            self.lower_body,
            self.left_hand,
            self.right_hand,
            self.face,
        ]
        .contains(&SubsystemOutcome::Applied)
    }
}

/// Stateless retargeting engine. All pose state lives in the binding.
#[derive(Debug, Clone)]
pub struct Retargeter {
    config: RetargetConfig,
}

impl Retargeter {
    /// Build a retargeter, validating the configuration and the declared
    /// detector topology.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        config.topology.validate()?;

        tracing::info!(
            "Retargeter ready: mirroring={:?}, basis_layout={:?}, smoothing={}",
            config.retarget.mirroring,
            config.retarget.basis_layout,
            config.retarget.smoothing
        );

        Ok(Self {
            config: config.retarget.clone(),
        })
    }

    pub fn config(&self) -> &RetargetConfig {
        &self.config
    }

    /// Retarget one detection result onto `binding`.
    pub fn apply(&self, binding: &mut AvatarBinding, frame: &DetectionFrame) -> FrameReport {
        let mut report = FrameReport::default();

        if let Some(world) = frame.body_world() {
            let joints = body::user_joints(world);
            report.upper_body = body::apply_upper_body(&self.config, binding, world, &joints);
            report.lower_body =
                body::apply_lower_body(&self.config, binding, world, &joints, frame.body_image());
        }

        if let Some(points) = frame.hand(Side::Left) {
            report.left_hand = hand::apply_hand(&self.config, binding, points, Side::Left);
        }
        if let Some(points) = frame.hand(Side::Right) {
            report.right_hand = hand::apply_hand(&self.config, binding, points, Side::Right);
        }

        if let Some(points) = frame.face() {
            report.face = face::apply_face(&self.config, binding, points);
        }

        tracing::trace!(?report, "Frame retargeted");
        report
    }
}

/// Everything a chain joint needs besides its landmarks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChainParams {
    pub layout: BasisLayout,
    pub eps: f32,
    pub alpha: f32,
}

/// Slerp `bone` toward the rotation that points it from `joint` to `child`,
/// then return `basis` re-oriented by the bone's resulting rotation.
///
/// A degenerate joint keeps its held rotation, and the chain carries on with it.
pub(crate) fn drive_joint(
    binding: &mut AvatarBinding,
    bone: Bone,
    joint: glam::Vec3,
    child: glam::Vec3,
    rest_child: Option<glam::Vec3>,
    basis: &Basis,
    params: ChainParams,
) -> Basis {
    if let (true, Some(rest_child)) = (binding.has_bone(bone), rest_child) {
        match rotate_bone(joint, child, rest_child, basis, params.layout, params.eps) {
            Some(target) => binding.slerp_rotation(bone, target, params.alpha),
            None => tracing::trace!("Skipping {}: degenerate geometry", bone.canonical_name()),
        }
    }
    advance_basis(binding, bone, basis)
}

/// Re-orient `basis` by the current rotation of `bone` (unchanged if unbound).
pub(crate) fn advance_basis(binding: &AvatarBinding, bone: Bone, basis: &Basis) -> Basis {
    binding
        .rotation(bone)
        .map(|rotation| basis.rotated(rotation))
        .unwrap_or(*basis)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::error::MocapError;
    use crate::tracking::Topology;

    #[test]
    fn test_new_rejects_topology_mismatch() {
        let mut config = Config::default();
        config.topology = Topology {
            hand: 20,
            ..Topology::EXPECTED
        };
        assert!(matches!(
            Retargeter::new(&config),
            Err(MocapError::Topology(_))
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.retarget.smoothing = 2.0;
        assert!(matches!(Retargeter::new(&config), Err(MocapError::Config(_))));
    }

    #[test]
    fn test_empty_frame_is_all_missing() {
        let retargeter = Retargeter::new(&Config::default()).unwrap();
        let mut binding = full_binding();
        let before = binding.snapshot();

        let report = retargeter.apply(&mut binding, &DetectionFrame::default());
        assert_eq!(report, FrameReport::default());
        assert!(!report.any_applied());
        assert_eq!(binding.snapshot(), before);
    }

    #[test]
    fn test_truncated_sets_are_missing() {
        let retargeter = Retargeter::new(&Config::default()).unwrap();
        let mut binding = full_binding();
        let before = binding.snapshot();

        let mut body = body_points(0.99);
        body.truncate(12);
        let mut hand = hand_points();
        hand.truncate(5);
        let mut face = face_points(0.05);
        face.truncate(100);
        let frame = DetectionFrame {
            pose_landmarks: Some(body.clone()),
            pose_world_landmarks: Some(body),
            left_hand_landmarks: Some(hand.clone()),
            right_hand_landmarks: Some(hand),
            face_landmarks: Some(face),
        };

        let report = retargeter.apply(&mut binding, &frame);
        assert_eq!(report, FrameReport::default());
        assert_eq!(binding.snapshot(), before);
    }

    #[test]
    fn test_subsystems_run_independently() {
        let retargeter = Retargeter::new(&Config::default()).unwrap();
        let mut binding = full_binding();
        let frame = DetectionFrame {
            pose_landmarks: Some(body_points(0.99)),
            pose_world_landmarks: Some(body_points(0.5)),
            right_hand_landmarks: Some(hand_points()),
            face_landmarks: Some(face_points(0.05)),
            ..Default::default()
        };

        let report = retargeter.apply(&mut binding, &frame);
        assert_eq!(report.upper_body, SubsystemOutcome::LowConfidence);
        assert_eq!(report.lower_body, SubsystemOutcome::Reset);
        assert_eq!(report.left_hand, SubsystemOutcome::MissingInput);
        assert_eq!(report.right_hand, SubsystemOutcome::Applied);
        assert_eq!(report.face, SubsystemOutcome::Applied);
        assert!(report.any_applied());
        assert_pose_finite(&binding);
    }

    #[test]
    fn test_full_frame_stays_finite_over_time() {
        let retargeter = Retargeter::new(&Config::default()).unwrap();
        let mut binding = full_binding();
        let frame = DetectionFrame {
            pose_landmarks: Some(body_points(0.99)),
            pose_world_landmarks: Some(body_points(0.99)),
            left_hand_landmarks: Some(hand_points()),
            right_hand_landmarks: Some(hand_points()),
            face_landmarks: Some(face_points(0.05)),
        };

        for _ in 0..30 {
            let report = retargeter.apply(&mut binding, &frame);
            assert_eq!(report.upper_body, SubsystemOutcome::Applied);
            assert_eq!(report.lower_body, SubsystemOutcome::Applied);
            assert_eq!(report.left_hand, SubsystemOutcome::Applied);
            assert_eq!(report.face, SubsystemOutcome::Applied);
            assert_pose_finite(&binding);
        }
        for weight in binding.snapshot().morphs.values().flat_map(|m| m.values()) {
            assert!((0.0..=1.0).contains(weight));
        }
    }

    #[test]
    fn test_partial_rig_is_tolerated() {
        let retargeter = Retargeter::new(&Config::default()).unwrap();
        let rig = crate::avatar::RigDescription::default()
            .with_bone("Spine", crate::avatar::RigBone::at([0.0, 0.1, 0.0]))
            .with_bone("LeftForeArm", crate::avatar::RigBone::at([0.0, 0.25, 0.0]));
        let mut binding = AvatarBinding::bind(&rig, &crate::config::RigConfig::default());
        let frame = DetectionFrame {
            pose_landmarks: Some(body_points(0.99)),
            pose_world_landmarks: Some(body_points(0.99)),
            left_hand_landmarks: Some(hand_points()),
            face_landmarks: Some(face_points(0.05)),
            ..Default::default()
        };

        let report = retargeter.apply(&mut binding, &frame);
        assert_eq!(report.upper_body, SubsystemOutcome::Applied);
        assert_ne!(binding.rotation(Bone::Spine), Some(glam::Quat::IDENTITY));
        assert_pose_finite(&binding);
    }

    #[test]
    fn test_retargeter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Retargeter>();
    }
}
