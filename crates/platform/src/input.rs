//! Raw input collected between frames.

use std::collections::HashSet;

use corelib::{Key, KeySet, Vec2};
use winit::keyboard::KeyCode;

/// Physical key binding for camera movement.
pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::Forward),
        KeyCode::KeyS => Some(Key::Backward),
        KeyCode::KeyA => Some(Key::Left),
        KeyCode::KeyD => Some(Key::Right),
        KeyCode::Space => Some(Key::Up),
        KeyCode::ControlLeft | KeyCode::ShiftLeft => Some(Key::Down),
        _ => None,
    }
}

/// Held physical keys plus pointer motion accumulated since the last frame.
#[derive(Debug, Default)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
    pointer_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(code);
        } else {
            self.pressed.remove(&code);
        }
    }

    /// Forget held keys, e.g. when focus is lost and releases won't arrive.
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    pub fn add_pointer_motion(&mut self, dx: f64, dy: f64) {
        self.pointer_delta += Vec2::new(dx as f32, dy as f32);
    }

    /// Movement keys currently held. Two physical keys may map to one [`Key`].
    pub fn keys(&self) -> KeySet {
        self.pressed.iter().copied().filter_map(map_key).collect()
    }

    /// Pointer motion since the previous call.
    pub fn take_pointer_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.pointer_delta)
    }
}
