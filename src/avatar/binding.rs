//! Avatar binding: the per-avatar handle set and pose state.
//!
//! Binding resolves canonical bone and mesh names against a
//! [`RigDescription`] once. Anything the rig lacks is left unbound, and every
//! feature that needs it quietly does nothing for the rest of the session.
//! The binding then owns all mutable retargeting state (bone rotations, root
//! position, morph weights) so several avatars can be driven side by side
//! without sharing anything.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::bones::{Bone, MeshSlot, MorphTarget};
use super::rig::RigDescription;
use crate::config::RigConfig;
use crate::retarget::smoothing::{ema, smooth_euler, smooth_rotation, EulerTarget};

/// Pose state of one bound bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneState {
    /// Name of the bone in the rig
    pub rig_name: String,
    /// Rest position relative to the parent bone
    pub rest_position: Vec3,
    pub rest_rotation: Quat,
    /// Current local rotation
    pub rotation: Quat,
    /// Current local position
    pub position: Vec3,
}

/// Morph weights of one bound face mesh.
#[derive(Debug, Clone, PartialEq)]
struct MeshState {
    rig_name: String,
    name_to_index: HashMap<String, usize>,
    weights: Vec<f32>,
}

/// Per-avatar binding and pose state.
#[derive(Debug, Clone)]
pub struct AvatarBinding {
    bones: HashMap<Bone, BoneState>,
    meshes: HashMap<MeshSlot, MeshState>,
}

impl AvatarBinding {
    /// Resolve every canonical bone and face mesh against `rig`.
    pub fn bind(rig: &RigDescription, config: &RigConfig) -> Self {
        let mut bones = HashMap::new();
        let all = Bone::all();

        for bone in &all {
            let canonical = bone.canonical_name();
            let rig_name = config.resolve(&canonical);
            match rig.bones.get(rig_name) {
                Some(rig_bone) => {
                    let rest_position = Vec3::from_array(rig_bone.rest_position);
                    let rest_rotation = Quat::from_array(rig_bone.rest_rotation).normalize();
                    let rest_rotation = if rest_rotation.is_finite() {
                        rest_rotation
                    } else {
                        Quat::IDENTITY
                    };
                    bones.insert(
                        *bone,
                        BoneState {
                            rig_name: rig_name.to_string(),
                            rest_position,
                            rest_rotation,
                            rotation: rest_rotation,
                            position: rest_position,
                        },
                    );
                }
                None => tracing::debug!("Rig has no bone '{}', disabling it", rig_name),
            }
        }

        let mut meshes = HashMap::new();
        for (slot, rig_name) in [
            (MeshSlot::Head, &config.head_mesh),
            (MeshSlot::Teeth, &config.teeth_mesh),
        ] {
            match rig.meshes.get(rig_name) {
                Some(mesh) => {
                    let name_to_index = mesh
                        .morph_targets
                        .iter()
                        .enumerate()
                        .map(|(i, name)| (name.clone(), i))
                        .collect();
                    meshes.insert(
                        slot,
                        MeshState {
                            rig_name: rig_name.clone(),
                            name_to_index,
                            weights: vec![0.0; mesh.morph_targets.len()],
                        },
                    );
                }
                None => tracing::debug!("Rig has no mesh '{}', disabling its morphs", rig_name),
            }
        }

        tracing::info!(
            "Bound {} of {} bones and {} face meshes",
            bones.len(),
            all.len(),
            meshes.len()
        );

        Self { bones, meshes }
    }

    pub fn has_bone(&self, bone: Bone) -> bool {
        self.bones.contains_key(&bone)
    }

    pub fn bone(&self, bone: Bone) -> Option<&BoneState> {
        self.bones.get(&bone)
    }

    pub fn bound_bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn rest_position(&self, bone: Bone) -> Option<Vec3> {
        self.bones.get(&bone).map(|b| b.rest_position)
    }

    pub fn rotation(&self, bone: Bone) -> Option<Quat> {
        self.bones.get(&bone).map(|b| b.rotation)
    }

    /// Current local position of the skeleton root.
    pub fn root_position(&self) -> Option<Vec3> {
        self.bones.get(&Bone::Hips).map(|b| b.position)
    }

    /// Overwrite a bone's rotation with no smoothing.
    pub fn set_rotation(&mut self, bone: Bone, rotation: Quat) {
        if !rotation.is_finite() {
            return;
        }
        if let Some(state) = self.bones.get_mut(&bone) {
            state.rotation = rotation;
        }
    }

    /// Slerp a bone's rotation toward `target`.
    pub fn slerp_rotation(&mut self, bone: Bone, target: Quat, alpha: f32) {
        if !target.is_finite() {
            return;
        }
        if let Some(state) = self.bones.get_mut(&bone) {
            state.rotation = smooth_rotation(state.rotation, target, alpha);
        }
    }

    /// Blend selected Euler axes of a bone's rotation toward `target`.
    pub fn smooth_euler(&mut self, bone: Bone, target: EulerTarget, alpha: f32) {
        if let Some(state) = self.bones.get_mut(&bone) {
            state.rotation = smooth_euler(state.rotation, target, alpha);
        }
    }

    /// Blend the root's horizontal position toward `x`.
    pub fn smooth_root_x(&mut self, x: f32, alpha: f32) {
        if !x.is_finite() {
            return;
        }
        if let Some(state) = self.bones.get_mut(&Bone::Hips) {
            state.position.x = ema(state.position.x, x, alpha);
        }
    }

    pub fn has_morph(&self, target: &MorphTarget) -> bool {
        self.morph_index(target).is_some()
    }

    pub fn morph_weight(&self, target: &MorphTarget) -> Option<f32> {
        let idx = self.morph_index(target)?;
        self.meshes.get(&target.mesh).map(|m| m.weights[idx])
    }

    /// Blend a morph weight toward `value`. Unbound targets are skipped.
    pub fn smooth_morph(&mut self, target: &MorphTarget, value: f32, alpha: f32) {
        if !value.is_finite() {
            return;
        }
        let Some(idx) = self.morph_index(target) else {
            return;
        };
        if let Some(mesh) = self.meshes.get_mut(&target.mesh) {
            let w = &mut mesh.weights[idx];
            *w = ema(*w, value, alpha).clamp(0.0, 1.0);
        }
    }

    /// Morph influence array of a mesh, in rig order.
    pub fn morph_weights(&self, mesh: MeshSlot) -> Option<&[f32]> {
        self.meshes.get(&mesh).map(|m| m.weights.as_slice())
    }

    fn morph_index(&self, target: &MorphTarget) -> Option<usize> {
        self.meshes
            .get(&target.mesh)
            .and_then(|m| m.name_to_index.get(&target.name).copied())
    }

    /// Serializable view of the current pose, keyed by rig names.
    pub fn snapshot(&self) -> PoseSnapshot {
        let bones = self
            .bones
            .values()
            .map(|b| (b.rig_name.clone(), b.rotation.to_array()))
            .collect();

        let morphs = self
            .meshes
            .values()
            .map(|m| {
                let weights = m
                    .name_to_index
                    .iter()
                    .map(|(name, &i)| (name.clone(), m.weights[i]))
                    .collect();
                (m.rig_name.clone(), weights)
            })
            .collect();

        PoseSnapshot {
            bones,
            root_position: self.root_position().map(|p| p.to_array()),
            morphs,
        }
    }
}

/// Pose of a bound avatar at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    /// Rig bone name → local rotation `[x, y, z, w]`
    pub bones: BTreeMap<String, [f32; 4]>,
    /// Local position of the root bone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_position: Option<[f32; 3]>,
    /// Rig mesh name → morph target name → weight
    pub morphs: BTreeMap<String, BTreeMap<String, f32>>,
}
