//! Core types: math re-exports, Transform, Camera, movement keys.

pub use glam::{Mat4, Quat, Vec2, Vec3, vec3};

pub mod camera;
pub mod input;
pub mod transform;

pub use camera::{Camera, Projection};
pub use input::{Key, KeySet};
pub use transform::Transform;

/// Full per-frame transform: `projection * view * model`.
#[inline]
pub fn model_view_projection(proj: &Projection, camera: &Camera, model: &Transform) -> Mat4 {
    proj.matrix() * camera.view() * model.matrix()
}
