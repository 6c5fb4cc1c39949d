//! Per-frame detector output.
//!
//! One [`DetectionFrame`] is produced per video frame by a MediaPipe Holistic
//! style detector. Every landmark set is optional: a hand out of view or a
//! face turned away simply leaves that field empty. Field names accept both
//! snake_case and the camelCase used by the MediaPipe JavaScript bindings.

use serde::{Deserialize, Serialize};

use super::landmarks::{Landmark, Topology};
use crate::avatar::Side;

/// A single detector result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Body landmarks in normalized image space
    #[serde(default, alias = "poseLandmarks", skip_serializing_if = "Option::is_none")]
    pub pose_landmarks: Option<Vec<Landmark>>,
    /// Body landmarks in metric, camera-relative space (with visibility).
    /// The MediaPipe JavaScript build exposes these under the minified key `ea`.
    #[serde(
        default,
        alias = "poseWorldLandmarks",
        alias = "ea",
        skip_serializing_if = "Option::is_none"
    )]
    pub pose_world_landmarks: Option<Vec<Landmark>>,
    #[serde(
        default,
        alias = "leftHandLandmarks",
        skip_serializing_if = "Option::is_none"
    )]
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(
        default,
        alias = "rightHandLandmarks",
        skip_serializing_if = "Option::is_none"
    )]
    pub right_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default, alias = "faceLandmarks", skip_serializing_if = "Option::is_none")]
    pub face_landmarks: Option<Vec<Landmark>>,
}

impl DetectionFrame {
    /// World-space body landmarks, if present with the full topology.
    pub fn body_world(&self) -> Option<&[Landmark]> {
        complete(&self.pose_world_landmarks, Topology::EXPECTED.pose)
    }

    /// Image-space body landmarks, if present with the full topology.
    pub fn body_image(&self) -> Option<&[Landmark]> {
        complete(&self.pose_landmarks, Topology::EXPECTED.pose)
    }

    /// Landmarks of the user's `side` hand, if present with the full topology.
    pub fn hand(&self, side: Side) -> Option<&[Landmark]> {
        let set = match side {
            Side::Left => &self.left_hand_landmarks,
            Side::Right => &self.right_hand_landmarks,
        };
        complete(set, Topology::EXPECTED.hand)
    }

    /// Face mesh landmarks, if present with the full topology.
    pub fn face(&self) -> Option<&[Landmark]> {
        complete(&self.face_landmarks, Topology::EXPECTED.face)
    }

    pub fn is_empty(&self) -> bool {
        self.pose_landmarks.is_none()
            && self.pose_world_landmarks.is_none()
            && self.left_hand_landmarks.is_none()
            && self.right_hand_landmarks.is_none()
            && self.face_landmarks.is_none()
    }
}

/// A landmark set is only usable when it has exactly the expected length.
fn complete(set: &Option<Vec<Landmark>>, expected: usize) -> Option<&[Landmark]> {
    match set {
        Some(points) if points.len() == expected => Some(points.as_slice()),
        Some(points) => {
            tracing::trace!(
                "Ignoring landmark set with {} points (expected {})",
                points.len(),
                expected
            );
            None
        }
        None => None,
    }
}
