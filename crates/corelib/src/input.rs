//! Movement keys understood by the camera (platform-agnostic).

use std::collections::HashSet;

/// Logical movement key. The platform layer maps physical keys onto these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Keys held down during the current frame.
pub type KeySet = HashSet<Key>;

/// Net direction along one axis: `1` for `positive` only, `-1` for `negative`
/// only, `0` for neither or both.
#[inline]
pub fn axis(keys: &KeySet, positive: Key, negative: Key) -> f32 {
    match (keys.contains(&positive), keys.contains(&negative)) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}
