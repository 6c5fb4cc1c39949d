//! Description of the external avatar rig.
//!
//! The rig itself (scene graph, skinned meshes) belongs to the renderer. The
//! retargeter only needs each bone's rest transform and each face mesh's
//! morph target names, which the host exports once as a [`RigDescription`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{MocapError, RigError};

/// Rest transform of one rig bone, local to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigBone {
    pub rest_position: [f32; 3],
    /// Quaternion `[x, y, z, w]`
    #[serde(default = "identity_rotation")]
    pub rest_rotation: [f32; 4],
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl RigBone {
    pub fn at(rest_position: [f32; 3]) -> Self {
        Self {
            rest_position,
            rest_rotation: identity_rotation(),
        }
    }
}

/// A skinned mesh's morph targets, in influence-array order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigMesh {
    pub morph_targets: Vec<String>,
}

/// Everything the binding step reads from the rig, keyed by rig names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigDescription {
    pub bones: HashMap<String, RigBone>,
    pub meshes: HashMap<String, RigMesh>,
}

impl RigDescription {
    /// Load a rig description from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MocapError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_json(&contents)
    }

    /// Parse a rig description from a JSON string
    pub fn from_json(s: &str) -> Result<Self, MocapError> {
        serde_json::from_str(s).map_err(|e| RigError::Parse(e.to_string()).into())
    }

    pub fn with_bone(mut self, name: impl Into<String>, bone: RigBone) -> Self {
        self.bones.insert(name.into(), bone);
        self
    }

    pub fn with_mesh<I, S>(mut self, name: impl Into<String>, morph_targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meshes.insert(
            name.into(),
            RigMesh {
                morph_targets: morph_targets.into_iter().map(Into::into).collect(),
            },
        );
        self
    }
}
