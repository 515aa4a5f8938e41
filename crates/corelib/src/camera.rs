use crate::input::{Key, KeySet, axis};
use crate::{Mat4, Vec2, Vec3};

/// Fixed vertical axis; the camera never rolls.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Pitch stays inside `±PITCH_LIMIT_DEG` so `forward` never aligns with `WORLD_UP`.
pub const PITCH_LIMIT_DEG: f32 = 89.0;

/// Free-fly first-person camera (right-handed). Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of pointer motion.
    pub sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 20.0),
            yaw: -90.0,
            pitch: 0.0,
            speed: 5.0,
            sensitivity: 0.1,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position,
            speed,
            ..Self::default()
        }
    }

    /// Unit look direction, rebuilt from yaw/pitch on every call.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(WORLD_UP).normalize()
    }

    /// Apply one frame of input: pointer motion turns, held keys translate.
    ///
    /// Axes compose without renormalization, so diagonal movement is faster
    /// than moving along a single axis.
    pub fn process_input(&mut self, keys: &KeySet, pointer_delta: Vec2, dt: f32) {
        self.yaw += pointer_delta.x * self.sensitivity;
        self.pitch = (self.pitch - pointer_delta.y * self.sensitivity)
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);

        let forward = self.forward();
        let right = forward.cross(WORLD_UP).normalize();
        let velocity = self.speed * dt;

        let step = forward * axis(keys, Key::Forward, Key::Backward)
            + right * axis(keys, Key::Right, Key::Left)
            + WORLD_UP * axis(keys, Key::Up, Key::Down);
        self.position += step * velocity;
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), WORLD_UP)
    }
}

/// Fixed perspective projection; only the aspect follows the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        let mut proj = Self {
            fov_y_deg: 45.0,
            aspect: 1.0,
            z_near: 0.1,
            z_far: 1000.0,
        };
        proj.set_viewport(width, height);
        proj
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Depth maps to `[0, 1]`, which is what wgpu expects.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn keys(list: &[Key]) -> KeySet {
        list.iter().copied().collect()
    }

    #[test]
    fn default_looks_down_negative_z() {
        let cam = Camera::default();
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, EPS));
        assert!(cam.right().abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.process_input(&KeySet::new(), Vec2::new(0.0, -10_000.0), 0.016);
        assert_eq!(cam.pitch, PITCH_LIMIT_DEG);
        cam.process_input(&KeySet::new(), Vec2::new(0.0, 50_000.0), 0.016);
        assert_eq!(cam.pitch, -PITCH_LIMIT_DEG);
        for dy in [3.0, -7.5, 900.0, -1e6, 12.0] {
            cam.process_input(&KeySet::new(), Vec2::new(1.0, dy), 0.016);
            assert!((-PITCH_LIMIT_DEG..=PITCH_LIMIT_DEG).contains(&cam.pitch));
        }
    }

    #[test]
    fn pointer_up_looks_up() {
        let mut cam = Camera::default();
        cam.process_input(&KeySet::new(), Vec2::new(0.0, -100.0), 0.0);
        assert!((cam.pitch - 10.0).abs() < EPS);
        assert!(cam.forward().y > 0.0);
    }

    #[test]
    fn forward_is_unit_for_any_orientation() {
        let mut cam = Camera::default();
        for (dx, dy) in [(0.0, 0.0), (1234.5, -77.0), (-9999.0, 880.0), (3.3, 3.3)] {
            cam.process_input(&KeySet::new(), Vec2::new(dx, dy), 0.016);
            assert!((cam.forward().length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn zero_input_changes_nothing() {
        let mut cam = Camera {
            pitch: 30.0,
            yaw: 12.0,
            ..Camera::default()
        };
        let before = cam;
        cam.process_input(&keys(&[Key::Forward, Key::Right]), Vec2::ZERO, 0.0);
        assert_eq!(cam.position, before.position);
        assert_eq!(cam.yaw, before.yaw);
        assert_eq!(cam.pitch, before.pitch);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut cam = Camera::default();
        let start = cam.position;
        cam.process_input(&keys(&[Key::Forward, Key::Backward]), Vec2::ZERO, 0.5);
        cam.process_input(&keys(&[Key::Left, Key::Right]), Vec2::ZERO, 0.5);
        cam.process_input(&keys(&[Key::Up, Key::Down]), Vec2::ZERO, 0.5);
        assert_eq!(cam.position, start);
    }

    #[test]
    fn forward_key_moves_speed_times_dt() {
        let mut cam = Camera::default();
        cam.process_input(&keys(&[Key::Forward]), Vec2::ZERO, 0.5);
        let expected = Vec3::new(0.0, 2.0, 20.0 - 2.5);
        assert!(cam.position.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn up_moves_along_world_up_even_when_pitched() {
        let mut cam = Camera {
            pitch: 60.0,
            ..Camera::default()
        };
        cam.process_input(&keys(&[Key::Up]), Vec2::ZERO, 1.0);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 7.0, 20.0), EPS));
    }

    #[test]
    fn diagonal_movement_is_not_renormalized() {
        let mut cam = Camera::default();
        let start = cam.position;
        cam.process_input(&keys(&[Key::Forward, Key::Right]), Vec2::ZERO, 1.0);
        let travelled = (cam.position - start).length();
        assert!((travelled - 5.0 * 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn view_maps_position_to_origin() {
        let cam = Camera::default();
        let eye = cam.view().transform_point3(cam.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, EPS));
        let ahead = cam.view().transform_point3(cam.position + cam.forward());
        assert!(ahead.abs_diff_eq(Vec3::NEG_Z, EPS));
    }

    #[test]
    fn projection_tracks_aspect() {
        let mut proj = Projection::new(1280, 720);
        assert!((proj.aspect - 16.0 / 9.0).abs() < EPS);
        proj.set_viewport(800, 0);
        assert_eq!(proj.aspect, 800.0);
        assert!(proj.matrix().to_cols_array().iter().all(|f| f.is_finite()));
    }
}
