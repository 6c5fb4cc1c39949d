//! Canonical bone and mesh names for the avatar skeleton.
//!
//! Names follow the Ready Player Me convention (`Hips`, `LeftArm`,
//! `LeftHandIndex2`, `LeftUpLeg`, ...). A rig using different names is bound
//! through `[rig.bone_aliases]` in the config.

use serde::{Deserialize, Serialize};

/// Body side, either of the tracked user or of the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

/// How the user's sides map onto the avatar's sides.
///
/// `Mirrored` treats the avatar as the user's reflection: the user's left arm
/// drives the avatar's right arm, face labels swap sides, and yaw/roll keep the
/// sign they are computed with. `Direct` maps sides one-to-one and negates the
/// spine yaw and the neck yaw/roll to compensate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirroring {
    #[default]
    Mirrored,
    Direct,
}

impl Mirroring {
    /// Avatar side driven by the given user side.
    pub fn avatar_side(self, user: Side) -> Side {
        match self {
            Mirroring::Mirrored => user.opposite(),
            Mirroring::Direct => user,
        }
    }

    /// Sign applied to yaw-like angles derived from landmark frames.
    pub fn yaw_sign(self) -> f32 {
        match self {
            Mirroring::Mirrored => 1.0,
            Mirroring::Direct => -1.0,
        }
    }
}

/// The five digits of a hand, in landmark order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digit {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Digit {
    pub const ALL: [Digit; 5] = [
        Digit::Thumb,
        Digit::Index,
        Digit::Middle,
        Digit::Ring,
        Digit::Pinky,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Digit::Thumb => "Thumb",
            Digit::Index => "Index",
            Digit::Middle => "Middle",
            Digit::Ring => "Ring",
            Digit::Pinky => "Pinky",
        }
    }

    /// Hand landmark index of this digit's first joint (phalanx 1).
    ///
    /// Phalanx `n` of a digit sits at `base_landmark() + n - 1`, matching the
    /// 21-point hand topology.
    pub fn base_landmark(self) -> usize {
        match self {
            Digit::Thumb => 1,
            Digit::Index => 5,
            Digit::Middle => 9,
            Digit::Ring => 13,
            Digit::Pinky => 17,
        }
    }
}

/// A bone the retargeters drive or read rest positions from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bone {
    /// Skeleton root; receives yaw and horizontal translation
    Hips,
    Spine,
    Neck,
    /// Upper arm (`LeftArm`)
    Shoulder(Side),
    /// Forearm (`LeftForeArm`)
    Elbow(Side),
    /// Hand (`LeftHand`)
    Wrist(Side),
    /// Thigh (`LeftUpLeg`)
    Hip(Side),
    /// Shin (`LeftLeg`)
    Knee(Side),
    /// `LeftFoot`
    Ankle(Side),
    /// `LeftToeBase`; only its rest position is used
    Toe(Side),
    /// Finger phalanx, numbered 1..=4 from the knuckle outward
    Finger(Side, Digit, u8),
}

impl Bone {
    /// Every canonical bone, in a stable order.
    pub fn all() -> Vec<Bone> {
        let mut bones = vec![Bone::Hips, Bone::Spine, Bone::Neck];
        for side in Side::BOTH {
            bones.extend([
                Bone::Shoulder(side),
                Bone::Elbow(side),
                Bone::Wrist(side),
                Bone::Hip(side),
                Bone::Knee(side),
                Bone::Ankle(side),
                Bone::Toe(side),
            ]);
            for digit in Digit::ALL {
                for phalanx in 1..=4 {
                    bones.push(Bone::Finger(side, digit, phalanx));
                }
            }
        }
        bones
    }

    /// Canonical rig name of this bone.
    pub fn canonical_name(&self) -> String {
        match *self {
            Bone::Hips => "Hips".to_string(),
            Bone::Spine => "Spine".to_string(),
            Bone::Neck => "Neck".to_string(),
            Bone::Shoulder(s) => format!("{}Arm", s.as_str()),
            Bone::Elbow(s) => format!("{}ForeArm", s.as_str()),
            Bone::Wrist(s) => format!("{}Hand", s.as_str()),
            Bone::Hip(s) => format!("{}UpLeg", s.as_str()),
            Bone::Knee(s) => format!("{}Leg", s.as_str()),
            Bone::Ankle(s) => format!("{}Foot", s.as_str()),
            Bone::Toe(s) => format!("{}ToeBase", s.as_str()),
            Bone::Finger(s, d, n) => format!("{}Hand{}{}", s.as_str(), d.as_str(), n),
        }
    }

    /// Leg bones that are reset to identity when hip tracking is lost.
    pub fn leg_chain(side: Side) -> [Bone; 3] {
        [Bone::Hip(side), Bone::Knee(side), Bone::Ankle(side)]
    }
}

/// The meshes that carry facial morph targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshSlot {
    Head,
    Teeth,
}

/// A blend shape on one of the face meshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MorphTarget {
    pub mesh: MeshSlot,
    pub name: String,
}

impl MorphTarget {
    pub fn head(name: impl Into<String>) -> Self {
        Self {
            mesh: MeshSlot::Head,
            name: name.into(),
        }
    }

    pub fn teeth(name: impl Into<String>) -> Self {
        Self {
            mesh: MeshSlot::Teeth,
            name: name.into(),
        }
    }
}
