//! Local coordinate frames and the bone rotation primitive.
//!
//! A [`Basis`] holds three axes expressed in landmark space. Every chain
//! converts a world-space limb direction into the joint's frame with the basis
//! inverse, then finds the shortest arc from the avatar's rest direction to
//! the observed one.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How basis axes are laid out in the change-of-basis matrix.
///
/// `Columns` stores x/y/z as the matrix columns, so the matrix maps
/// frame-local vectors into landmark space. `Permuted` is the signed
/// permutation used by the arm-only tracker, which swaps the x/z components
/// and flips several signs to match a rig whose arms rest along a different
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasisLayout {
    #[default]
    Columns,
    Permuted,
}

/// Three axes describing the orientation of a body region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Basis {
    pub fn from_axes(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self { x, y, z }
    }

    /// Change-of-basis matrix (frame-local → landmark space) for `layout`.
    pub fn matrix(&self, layout: BasisLayout) -> Mat3 {
        let (x, y, z) = (self.x, self.y, self.z);
        match layout {
            BasisLayout::Columns => Mat3::from_cols(x, y, z),
            // Row-major: [ x.z  y.z -z.z ]
            //            [ x.y -y.y  z.y ]
            //            [-x.x  y.x -z.x ]
            BasisLayout::Permuted => Mat3::from_cols(
                Vec3::new(x.z, x.y, -x.x),
                Vec3::new(y.z, -y.y, y.x),
                Vec3::new(-z.z, z.y, -z.x),
            ),
        }
    }

    /// Inverse of [`Basis::matrix`], or `None` when the frame is singular.
    ///
    /// Frames built from landmarks are not always orthogonal (the shoulder y
    /// axis is a midpoint direction), so this is a full inverse rather than a
    /// transpose. For an orthonormal basis the two agree.
    pub fn inverse(&self, layout: BasisLayout, eps: f32) -> Option<Mat3> {
        let m = self.matrix(layout);
        let det = m.determinant();
        if !det.is_finite() || det.abs() < eps {
            return None;
        }
        Some(m.inverse())
    }

    /// Re-orient every axis by `rotation`. Used between joints of one chain.
    pub fn rotated(&self, rotation: Quat) -> Self {
        Self {
            x: rotation * self.x,
            y: rotation * self.y,
            z: rotation * self.z,
        }
    }
}

/// Normalize `v`, or `None` if it is too short to carry a direction.
pub fn direction(v: Vec3, eps: f32) -> Option<Vec3> {
    if !v.is_finite() || v.length_squared() <= eps * eps {
        return None;
    }
    Some(v.normalize())
}

/// Normalize `v`, collapsing near-zero vectors to zero.
///
/// Frame axes that feed `acos` angle formulas use this so that a degenerate
/// secondary axis still yields finite angles.
pub fn direction_or_zero(v: Vec3, eps: f32) -> Vec3 {
    direction(v, eps).unwrap_or(Vec3::ZERO)
}

/// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
pub fn shortest_arc(from: Vec3, to: Vec3) -> Quat {
    Quat::from_rotation_arc(from, to)
}

/// Rotation a joint needs so the avatar limb points where the user's does.
///
/// `joint`/`child` are landmark positions, `rest_child` is the child bone's
/// rest position local to the joint, and `basis` is the joint's frame.
/// Returns `None` if the limb has no length, the rest offset is zero, or the
/// basis is singular.
pub fn rotate_bone(
    joint: Vec3,
    child: Vec3,
    rest_child: Vec3,
    basis: &Basis,
    layout: BasisLayout,
    eps: f32,
) -> Option<Quat> {
    let to_local = basis.inverse(layout, eps)?;
    let user_limb = direction(to_local * (child - joint), eps)?;
    let avatar_limb = direction(rest_child, eps)?;
    let rotation = shortest_arc(avatar_limb, user_limb);
    rotation.is_finite().then_some(rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn identity_basis() -> Basis {
        Basis::from_axes(Vec3::X, Vec3::Y, Vec3::Z)
    }

    #[test]
    fn test_shortest_arc_maps_a_onto_b() {
        let pairs = [
            (Vec3::X, Vec3::Y),
            (Vec3::new(1.0, 2.0, 3.0).normalize(), Vec3::new(-2.0, 0.5, 1.0).normalize()),
            (Vec3::Z, -Vec3::Z),
        ];
        for (a, b) in pairs {
            let q = shortest_arc(a, b);
            assert!(approx_vec(q * a, b), "{:?} -> {:?} gave {:?}", a, b, q * a);
        }
    }

    #[test]
    fn test_shortest_arc_equal_vectors_is_identity() {
        let a = Vec3::new(0.3, -0.4, 0.5).normalize();
        let q = shortest_arc(a, a);
        assert!(q.angle_between(Quat::IDENTITY) < 1e-4);
    }

    #[test]
    fn test_rotate_bone_identity_basis() {
        let rot = rotate_bone(
            Vec3::ZERO,
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            &identity_basis(),
            BasisLayout::Columns,
            EPS,
        )
        .unwrap();
        assert!(approx_vec(rot * Vec3::X, Vec3::Y));
    }

    #[test]
    fn test_rotate_bone_uses_local_frame() {
        // Frame rotated 90° about Z: local x points along world y.
        let basis = Basis::from_axes(Vec3::Y, -Vec3::X, Vec3::Z);
        // Limb along world y is local +x, same as the rest direction.
        let rot = rotate_bone(
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::X,
            &basis,
            BasisLayout::Columns,
            EPS,
        )
        .unwrap();
        assert!(rot.angle_between(Quat::IDENTITY) < 1e-4);
    }

    #[test]
    fn test_rotate_bone_degenerate_limb() {
        let p = Vec3::new(0.1, 0.2, 0.3);
        let rot = rotate_bone(p, p, Vec3::Y, &identity_basis(), BasisLayout::Columns, EPS);
        assert!(rot.is_none());
    }

    #[test]
    fn test_rotate_bone_zero_rest_offset() {
        let rot = rotate_bone(
            Vec3::ZERO,
            Vec3::Y,
            Vec3::ZERO,
            &identity_basis(),
            BasisLayout::Columns,
            EPS,
        );
        assert!(rot.is_none());
    }

    #[test]
    fn test_rotate_bone_singular_basis() {
        let basis = Basis::from_axes(Vec3::X, Vec3::ZERO, Vec3::ZERO);
        let rot = rotate_bone(Vec3::ZERO, Vec3::Y, Vec3::X, &basis, BasisLayout::Columns, EPS);
        assert!(rot.is_none());
    }

    #[test]
    fn test_inverse_of_orthonormal_is_transpose() {
        let q = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1);
        let basis = identity_basis().rotated(q);
        let inv = basis.inverse(BasisLayout::Columns, EPS).unwrap();
        let t = basis.matrix(BasisLayout::Columns).transpose();
        assert!(inv.abs_diff_eq(t, 1e-4));
    }

    #[test]
    fn test_permuted_layout_matrix() {
        let basis = Basis::from_axes(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let m = basis.matrix(BasisLayout::Permuted);
        assert_eq!(m.row(0), Vec3::new(3.0, 6.0, -9.0));
        assert_eq!(m.row(1), Vec3::new(2.0, -5.0, 8.0));
        assert_eq!(m.row(2), Vec3::new(-1.0, 4.0, -7.0));
    }

    #[test]
    fn test_rotated_basis() {
        let q = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let b = identity_basis().rotated(q);
        assert!(approx_vec(b.x, Vec3::Y));
        assert!(approx_vec(b.y, -Vec3::X));
        assert!(approx_vec(b.z, Vec3::Z));
    }

    #[test]
    fn test_direction_guards() {
        assert!(direction(Vec3::ZERO, EPS).is_none());
        assert!(direction(Vec3::splat(1e-9), EPS).is_none());
        assert!(direction(Vec3::new(f32::NAN, 0.0, 0.0), EPS).is_none());
        assert_eq!(direction_or_zero(Vec3::ZERO, EPS), Vec3::ZERO);
        assert!(approx_vec(direction(Vec3::new(0.0, 3.0, 0.0), EPS).unwrap(), Vec3::Y));
    }
}
