use crate::{Mat4, Quat, Vec3};

/// Orientation fix for exported splatting assets, Euler XYZ in degrees.
pub const ASSET_ORIENTATION_DEG: Vec3 = Vec3::new(151.20, -2.70, -1.35);

/// Rigid transform with uniform or non-uniform scale (Euler XYZ).
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians, applied as `Rx * Ry * Rz`.
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale,
        }
    }

    /// Pure rotation given in degrees.
    pub fn from_euler_degrees(degrees: Vec3) -> Self {
        Self {
            rotation_euler: Vec3::new(
                degrees.x.to_radians(),
                degrees.y.to_radians(),
                degrees.z.to_radians(),
            ),
            ..Self::identity()
        }
    }

    /// Model transform applied to every loaded mesh.
    pub fn asset_orientation() -> Self {
        Self::from_euler_degrees(ASSET_ORIENTATION_DEG)
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.rotation_euler.x)
            * Quat::from_rotation_y(self.rotation_euler.y)
            * Quat::from_rotation_z(self.rotation_euler.z)
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
