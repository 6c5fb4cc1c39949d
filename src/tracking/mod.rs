//! Tracking module
//!
//! Detector output consumed by the retargeters:
//! - Landmark types and the fixed MediaPipe Holistic topology
//! - Per-frame detection results (body, hands, face)

pub mod frame;
pub mod landmarks;

pub use frame::DetectionFrame;
pub use landmarks::{face_index, HandLandmark, Landmark, PoseLandmark, Topology};
