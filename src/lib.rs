//! lightcycles — renderer-agnostic light-cycle arena simulation.
//!
//! Up to four agents move one cell per tick on a bounded arena, leaving a
//! permanent trail. Touching any trail or leaving the arena is fatal; the
//! last agent alive wins. Everything here is synchronous and deterministic:
//! the front end owns the clock and calls [`Match::tick`] once per frame.
//!
//! # Example
//! ```
//! use lightcycles::{AgentDescriptor, Arena, Cell, Controller, Difficulty, HeldKeys, Match};
//! let mut game = Match::new(Arena::new(100, 100, 4).unwrap(), false);
//! game.register(AgentDescriptor::new(Cell::new(20, 80), Controller::autonomous(Difficulty::Easy))).unwrap();
//! game.register(AgentDescriptor::new(Cell::new(80, 20), Controller::autonomous(Difficulty::Hard))).unwrap();
//! game.start().unwrap();
//! game.tick(&HeldKeys::default());
//! ```

use serde::Deserialize;

pub mod agent;
pub mod autopilot;
pub mod config;
pub mod controls;
pub mod game;
pub mod hud;
pub mod occupancy;

pub use agent::{Agent, AgentDescriptor, AgentId, Controller, Rgb};
pub use autopilot::{Autopilot, Difficulty};
pub use config::{Config, ConfigError};
pub use controls::{Controls, HeldKeys, InputSource, KeyMap};
pub use game::{Death, Frame, Match, Phase, PresentationSink, SetupError, TickReport, MAX_AGENTS};
pub use occupancy::OccupancyGrid;

/// Integer arena coordinate. `y` grows downward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `distance` units away along `dir`.
    #[inline]
    pub fn offset(self, dir: Direction, distance: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx * distance, self.y + dy * distance)
    }
}

/// One of the four movement directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step in arena coordinates.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn is_horizontal(self) -> bool {
        !self.is_vertical()
    }
}

/// Playfield bounds and step size.
///
/// Both edges are part of the arena: a head at `x == 0` or `x == width` is
/// still in bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Arena {
    width: i32,
    height: i32,
    cell_size: i32,
}

impl Arena {
    /// Returns `None` when any dimension is not strictly positive, or when
    /// an autopilot probe from the far edge would leave the `i32` range.
    pub fn new(width: i32, height: i32, cell_size: i32) -> Option<Self> {
        if width <= 0 || height <= 0 || cell_size <= 0 {
            return None;
        }
        // Easy probes farthest
        let reach = Difficulty::Easy.reach(cell_size)?;
        width.checked_add(reach)?;
        height.checked_add(reach)?;
        Some(Self { width, height, cell_size })
    }

    #[inline]
    pub fn width(&self) -> i32 { self.width }
    #[inline]
    pub fn height(&self) -> i32 { self.height }
    /// Side length of a cell; also the distance an agent moves per tick.
    #[inline]
    pub fn cell_size(&self) -> i32 { self.cell_size }

    pub fn contains(&self, cell: Cell) -> bool {
        (0..=self.width).contains(&cell.x) && (0..=self.height).contains(&cell.y)
    }

    /// Spawns in the bottom half head up, everything else heads down.
    pub fn spawn_heading(&self, spawn: Cell) -> Direction {
        if spawn.y > self.height / 2 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

// ---------- tests ----------
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_bounds_are_inclusive() {
        let arena = Arena::new(100, 60, 4).unwrap();
        assert!(arena.contains(Cell::new(0, 0)));
        assert!(arena.contains(Cell::new(100, 60)));
        assert!(!arena.contains(Cell::new(-4, 10)));
        assert!(!arena.contains(Cell::new(10, 64)));
        assert!(!arena.contains(Cell::new(104, 0)));
    }

    #[test]
    fn degenerate_arena_is_rejected() {
        assert!(Arena::new(0, 10, 4).is_none());
        assert!(Arena::new(10, 10, 0).is_none());
        assert!(Arena::new(10, -1, 2).is_none());
    }

    #[test]
    fn oversized_arena_is_rejected() {
        assert!(Arena::new(200_000, 200_000, 40_000).is_none());
        assert!(Arena::new(i32::MAX, 10, 1).is_none());
        assert!(Arena::new(10, i32::MAX - 1, 1).is_none());
        assert!(Arena::new(1_000_000, 1_000_000, 16).is_some());
    }

    #[test]
    fn spawn_heading_depends_on_vertical_half() {
        let arena = Arena::new(100, 100, 4).unwrap();
        assert_eq!(arena.spawn_heading(Cell::new(50, 80)), Direction::Up);
        assert_eq!(arena.spawn_heading(Cell::new(50, 10)), Direction::Down);
        // exactly on the midline counts as top half
        assert_eq!(arena.spawn_heading(Cell::new(50, 50)), Direction::Down);
    }

    #[test]
    fn offset_scales_by_distance() {
        let c = Cell::new(10, 10);
        assert_eq!(c.offset(Direction::Up, 4), Cell::new(10, 6));
        assert_eq!(c.offset(Direction::Right, 8), Cell::new(18, 10));
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert!(Direction::Down.is_vertical());
        assert!(Direction::Left.is_horizontal());
    }
}
