//! mocap-rig - Landmark retargeting for rigged 3D avatars
//!
//! Turns per-frame body, hand and face landmarks from a MediaPipe Holistic
//! style detector into avatar pose state:
//! - Spine, root and arm/leg chain rotations from body landmarks
//! - Single-axis finger flexion from hand landmarks
//! - Neck orientation and expression morph weights from the face mesh
//!
//! Usage: bind an avatar once with [`AvatarBinding::bind`], build a
//! [`Retargeter`] from a [`Config`], then call [`Retargeter::apply`] for every
//! [`DetectionFrame`].

pub mod avatar;
pub mod config;
pub mod error;
pub mod retarget;
pub mod tracking;

pub use avatar::{AvatarBinding, PoseSnapshot, RigDescription};
pub use config::Config;
pub use error::{MocapError, Result};
pub use retarget::{FrameReport, Retargeter, SubsystemOutcome};
pub use tracking::DetectionFrame;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
