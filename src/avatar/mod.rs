//! Avatar side of retargeting
//!
//! Canonical bone names, the rig description a host exports, and the
//! per-avatar binding that owns all pose state.

pub mod binding;
pub mod bones;
pub mod rig;

pub use binding::{AvatarBinding, BoneState, PoseSnapshot};
pub use bones::{Bone, Digit, MeshSlot, Mirroring, MorphTarget, Side};
pub use rig::{RigBone, RigDescription, RigMesh};
