//! Human control plumbing.
//!
//! The core never touches an input device. Each human agent carries a
//! [`KeyMap`] of key names; once per tick the match asks an [`InputSource`]
//! which of those keys are held and turns the answer into an intent.

use std::collections::HashSet;

use serde::Deserialize;

use crate::Direction;

/// Key names bound to the four directional controls.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct KeyMap {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl KeyMap {
    pub fn new(up: &str, down: &str, left: &str, right: &str) -> Self {
        Self {
            up: up.to_string(),
            down: down.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Built-in layout for roster slot `slot` (WASD, YGHJ, P L ; ', arrows).
    pub fn default_for_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(Self::new("KeyW", "KeyS", "KeyA", "KeyD")),
            1 => Some(Self::new("KeyY", "KeyH", "KeyG", "KeyJ")),
            2 => Some(Self::new("KeyP", "Semicolon", "KeyL", "Quote")),
            3 => Some(Self::new("ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight")),
            _ => None,
        }
    }

    /// A map is usable only if every control is bound.
    pub fn is_complete(&self) -> bool {
        self.keys().iter().all(|k| !k.trim().is_empty())
    }

    /// All four key names, in `up, down, left, right` order.
    pub fn keys(&self) -> [&str; 4] {
        [self.up.as_str(), self.down.as_str(), self.left.as_str(), self.right.as_str()]
    }
}

/// Snapshot of which directional controls are held this tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Controls {
    pub fn pressing(dir: Direction) -> Self {
        let mut c = Self::default();
        match dir {
            Direction::Up => c.up = true,
            Direction::Down => c.down = true,
            Direction::Left => c.left = true,
            Direction::Right => c.right = true,
        }
        c
    }

    /// The requested direction: first held control in `up, down, left, right`
    /// priority. Lower-priority controls are ignored even when the winning
    /// one later turns out to be an illegal reversal.
    pub fn intent(&self) -> Option<Direction> {
        if self.up {
            Some(Direction::Up)
        } else if self.down {
            Some(Direction::Down)
        } else if self.left {
            Some(Direction::Left)
        } else if self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// Per-tick source of human control state.
pub trait InputSource {
    fn controls(&self, keymap: &KeyMap) -> Controls;
}

impl<F> InputSource for F
where
    F: Fn(&KeyMap) -> Controls,
{
    fn controls(&self, keymap: &KeyMap) -> Controls {
        self(keymap)
    }
}

/// Input source backed by a set of currently held key names.
#[derive(Clone, Debug, Default)]
pub struct HeldKeys(HashSet<String>);

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: &str) {
        self.0.insert(key.to_string());
    }

    pub fn release(&mut self, key: &str) {
        self.0.remove(key);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

impl<'a> FromIterator<&'a str> for HeldKeys {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl InputSource for HeldKeys {
    fn controls(&self, keymap: &KeyMap) -> Controls {
        Controls {
            up: self.is_held(&keymap.up),
            down: self.is_held(&keymap.down),
            left: self.is_held(&keymap.left),
            right: self.is_held(&keymap.right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_follows_priority_order() {
        let all = Controls { up: true, down: true, left: true, right: true };
        assert_eq!(all.intent(), Some(Direction::Up));
        let lr = Controls { left: true, right: true, ..Default::default() };
        assert_eq!(lr.intent(), Some(Direction::Left));
        assert_eq!(Controls::default().intent(), None);
        assert_eq!(Controls::pressing(Direction::Right).intent(), Some(Direction::Right));
    }

    #[test]
    fn held_keys_map_through_keymap() {
        let map = KeyMap::default_for_slot(0).unwrap();
        let held: HeldKeys = ["KeyA", "Space"].into_iter().collect();
        let c = held.controls(&map);
        assert!(c.left);
        assert!(!c.up && !c.down && !c.right);
    }

    #[test]
    fn incomplete_keymap_detected() {
        assert!(KeyMap::default_for_slot(3).unwrap().is_complete());
        assert!(!KeyMap::new("KeyW", "", "KeyA", "KeyD").is_complete());
        assert!(KeyMap::default_for_slot(4).is_none());
    }

    #[test]
    fn closures_act_as_input_sources() {
        let always_left = |_: &KeyMap| Controls::pressing(Direction::Left);
        let map = KeyMap::default_for_slot(1).unwrap();
        assert_eq!(always_left.controls(&map).intent(), Some(Direction::Left));
    }
}
