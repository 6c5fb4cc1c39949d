//! Landmark types and the detector topology they are indexed by.
//!
//! Index constants here are a contract with the detector (MediaPipe Holistic):
//! every frame is indexed positionally, so a mismatch silently corrupts all
//! geometry. [`Topology::validate`] checks the detector's declared counts once
//! at startup.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::avatar::Side;
use crate::error::TopologyError;

/// A single tracked point in detector space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Detection confidence in `[0, 1]`; absent for hand and face landmarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Visibility, treating a missing score as not visible.
    pub fn visibility_or_zero(&self) -> f32 {
        self.visibility.unwrap_or(0.0)
    }
}

/// The 33-point body topology (only the joints the retargeters read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftShoulder,
            Side::Right => Self::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftElbow,
            Side::Right => Self::RightElbow,
        }
    }

    pub fn wrist(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftWrist,
            Side::Right => Self::RightWrist,
        }
    }

    pub fn pinky(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftPinky,
            Side::Right => Self::RightPinky,
        }
    }

    pub fn index_finger(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftIndex,
            Side::Right => Self::RightIndex,
        }
    }

    pub fn hip(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftHip,
            Side::Right => Self::RightHip,
        }
    }

    pub fn knee(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftKnee,
            Side::Right => Self::RightKnee,
        }
    }

    pub fn ankle(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftAnkle,
            Side::Right => Self::RightAnkle,
        }
    }

    pub fn foot(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftFootIndex,
            Side::Right => Self::RightFootIndex,
        }
    }
}

/// The 21-point hand topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    Wrist = 0,
    IndexMcp = 5,
    MiddleMcp = 9,
    RingMcp = 13,
    PinkyMcp = 17,
}

impl HandLandmark {
    pub const COUNT: usize = 21;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Face mesh indices (468-point topology).
pub mod face_index {
    pub const COUNT: usize = 468;

    /// Nose tip; origin of the face plane
    pub const NOSE: usize = 1;
    /// Point just above the nose tip; defines the up axis
    pub const NASAL: usize = 4;
    /// Left-most face boundary point
    pub const LEFT: usize = 454;
    /// Right-most face boundary point
    pub const RIGHT: usize = 234;
    pub const TOP: usize = 10;
    pub const BOTTOM: usize = 152;

    pub const RIGHT_EYE_TOP: usize = 27;
    pub const RIGHT_EYE_BOTTOM: usize = 23;
    pub const LEFT_EYE_TOP: usize = 257;
    pub const LEFT_EYE_BOTTOM: usize = 253;

    pub const MOUTH_TOP: usize = 13;
    pub const MOUTH_BOTTOM: usize = 14;
    pub const MOUTH_RIGHT: usize = 78;
    pub const MOUTH_LEFT: usize = 308;

    pub const NOSE_RIGHT: usize = 129;
    pub const NOSE_LEFT: usize = 358;
}

/// Landmark counts of each set a detector emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub pose: usize,
    pub hand: usize,
    pub face: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self::EXPECTED
    }
}

impl Topology {
    /// The layout the retargeters index into.
    pub const EXPECTED: Topology = Topology {
        pose: PoseLandmark::COUNT,
        hand: HandLandmark::COUNT,
        face: face_index::COUNT,
    };

    /// Check a declared detector topology against [`Topology::EXPECTED`].
    pub fn validate(&self) -> Result<(), TopologyError> {
        let checks = [
            ("pose", self.pose, Self::EXPECTED.pose),
            ("hand", self.hand, Self::EXPECTED.hand),
            ("face", self.face, Self::EXPECTED.face),
        ];
        for (set, declared, expected) in checks {
            if declared != expected {
                return Err(TopologyError::CountMismatch {
                    set,
                    declared,
                    expected,
                });
            }
        }
        Ok(())
    }
}
