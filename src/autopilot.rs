//! Lookahead steering for computer-controlled agents.
//!
//! The autopilot probes a fixed distance ahead on its current heading. When
//! the probe lands on a trail, or comes within that distance of the wall it
//! is driving towards, it turns towards the roomier half of the arena.
//! There is no randomness: two autopilots started from mirrored positions
//! keep mirroring each other for as long as they both live.

use log::debug;
use serde::Deserialize;

use crate::{Arena, Cell, Direction, OccupancyGrid};

/// Named skill tier for an autonomous agent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Steps probed ahead. Harder tiers look less far, so they turn late
    /// but hug obstacles tightly.
    pub fn lookahead_steps(&self, cell_size: i32) -> i32 {
        let steps = match self {
            Difficulty::Easy => cell_size.saturating_mul(2),
            Difficulty::Medium => cell_size,
            Difficulty::Hard => cell_size / 2,
        };
        steps.max(1)
    }

    /// Probe distance in arena units, `None` if it overflows an `i32`.
    pub fn reach(&self, cell_size: i32) -> Option<i32> {
        self.lookahead_steps(cell_size).checked_mul(cell_size)
    }
}

/// Steering strategy for one autonomous agent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Autopilot {
    reach: i32,
}

impl Autopilot {
    /// [`Arena::new`] only accepts arenas where every tier's reach fits.
    pub fn new(difficulty: Difficulty, arena: &Arena) -> Self {
        Self {
            reach: difficulty.reach(arena.cell_size()).unwrap_or(i32::MAX),
        }
    }

    /// Pick this tick's heading.
    ///
    /// A vertical heading is checked first; if that check turns the agent
    /// sideways, the new horizontal heading is checked in the same tick.
    /// A second turn that would reverse the starting heading is dropped.
    pub fn steer(
        &self,
        position: Cell,
        heading: Option<Direction>,
        arena: &Arena,
        grid: &OccupancyGrid,
    ) -> Option<Direction> {
        let start = heading?;
        let reach = self.reach;

        let mut current = start;
        if current.is_vertical() {
            if let Some(turn) = self.avoid(position, current, reach, arena, grid) {
                current = turn;
            }
        }
        if current.is_horizontal() {
            if let Some(turn) = self.avoid(position, current, reach, arena, grid) {
                if turn != start.opposite() {
                    current = turn;
                }
            }
        }
        Some(current)
    }

    /// Turn to take when driving along `dir`, if the probe sees a hazard.
    fn avoid(
        &self,
        position: Cell,
        dir: Direction,
        reach: i32,
        arena: &Arena,
        grid: &OccupancyGrid,
    ) -> Option<Direction> {
        let probe = position.offset(dir, reach);
        let near_wall = match dir {
            Direction::Up => probe.y <= reach,
            Direction::Down => probe.y >= arena.height() - reach,
            Direction::Left => probe.x <= reach,
            Direction::Right => probe.x >= arena.width() - reach,
        };
        if !near_wall && !grid.contains(probe) {
            return None;
        }

        let turn = if dir.is_vertical() {
            if probe.x > arena.width() / 2 {
                Direction::Left
            } else {
                Direction::Right
            }
        } else if probe.y > arena.height() / 2 {
            Direction::Up
        } else {
            Direction::Down
        };
        debug!("{:?} probe at ({}, {}) hit, turning {:?}", dir, probe.x, probe.y, turn);
        Some(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(100, 100, 4).unwrap()
    }

    #[test]
    fn harder_tiers_look_less_far() {
        assert_eq!(Difficulty::Easy.lookahead_steps(4), 8);
        assert_eq!(Difficulty::Medium.lookahead_steps(4), 4);
        assert_eq!(Difficulty::Hard.lookahead_steps(4), 2);
        assert_eq!(Difficulty::Hard.lookahead_steps(1), 1);
        assert_eq!(Difficulty::Easy.reach(4), Some(32));
        assert_eq!(Difficulty::Easy.reach(40_000), None);
        assert_eq!(Difficulty::Hard.reach(40_000), Some(800_000_000));
    }

    #[test]
    fn largest_accepted_arena_steers_without_overflow() {
        // Easy reach on cell 32767 is 2147352578; 131069 more is i32::MAX
        let arena = Arena::new(131_069, 131_069, 32_767).unwrap();
        let pilot = Autopilot::new(Difficulty::Easy, &arena);
        let grid = OccupancyGrid::new();
        let corner = Cell::new(131_069, 131_069);
        assert_eq!(pilot.steer(corner, Some(Direction::Down), &arena, &grid), Some(Direction::Left));
        assert_eq!(pilot.steer(corner, Some(Direction::Right), &arena, &grid), Some(Direction::Up));
        assert!(Arena::new(131_070, 131_069, 32_767).is_none());
    }

    #[test]
    fn clear_path_keeps_heading() {
        let pilot = Autopilot::new(Difficulty::Hard, &arena());
        let grid = OccupancyGrid::new();
        let next = pilot.steer(Cell::new(50, 50), Some(Direction::Up), &arena(), &grid);
        assert_eq!(next, Some(Direction::Up));
    }

    #[test]
    fn vertical_hazard_turns_toward_open_half() {
        let pilot = Autopilot::new(Difficulty::Hard, &arena());
        let mut grid = OccupancyGrid::new();
        // Hard on cell 4 probes 2 steps = 8 units ahead
        grid.insert(Cell::new(72, 42));
        grid.insert(Cell::new(20, 42));
        let right_side = pilot.steer(Cell::new(72, 50), Some(Direction::Up), &arena(), &grid);
        assert_eq!(right_side, Some(Direction::Left));
        let left_side = pilot.steer(Cell::new(20, 50), Some(Direction::Up), &arena(), &grid);
        assert_eq!(left_side, Some(Direction::Right));
    }

    #[test]
    fn wall_ahead_counts_as_hazard() {
        let pilot = Autopilot::new(Difficulty::Hard, &arena());
        let grid = OccupancyGrid::new();
        // probe y = 92 >= 100 - 8
        let next = pilot.steer(Cell::new(30, 84), Some(Direction::Down), &arena(), &grid);
        assert_eq!(next, Some(Direction::Right));
        // moving right near the east wall in the top half turns down
        let next = pilot.steer(Cell::new(90, 20), Some(Direction::Right), &arena(), &grid);
        assert_eq!(next, Some(Direction::Down));
        // bottom half turns up
        let next = pilot.steer(Cell::new(4, 80), Some(Direction::Left), &arena(), &grid);
        assert_eq!(next, Some(Direction::Up));
    }

    #[test]
    fn cascaded_turn_never_reverses() {
        let pilot = Autopilot::new(Difficulty::Hard, &arena());
        let mut grid = OccupancyGrid::new();
        // heading up in the top half: up-probe blocked, then left-probe blocked
        // would request Down, which is a reversal
        grid.insert(Cell::new(60, 22));
        grid.insert(Cell::new(52, 30));
        let next = pilot.steer(Cell::new(60, 30), Some(Direction::Up), &arena(), &grid);
        assert_eq!(next, Some(Direction::Left));
    }

    #[test]
    fn cascaded_turn_allowed_when_not_a_reversal() {
        let pilot = Autopilot::new(Difficulty::Hard, &arena());
        let mut grid = OccupancyGrid::new();
        // heading down in the bottom half: blocked below, then blocked left;
        // second check asks for Up, which reverses Down and is dropped
        grid.insert(Cell::new(60, 78));
        grid.insert(Cell::new(52, 70));
        let next = pilot.steer(Cell::new(60, 70), Some(Direction::Down), &arena(), &grid);
        assert_eq!(next, Some(Direction::Left));

        // heading up in the bottom half: second check asks for Up again
        grid.insert(Cell::new(60, 62));
        let next = pilot.steer(Cell::new(60, 70), Some(Direction::Up), &arena(), &grid);
        assert_eq!(next, Some(Direction::Up));
    }

    #[test]
    fn stationary_agent_is_left_alone() {
        let pilot = Autopilot::new(Difficulty::Medium, &arena());
        let grid = OccupancyGrid::new();
        assert_eq!(pilot.steer(Cell::new(0, 0), None, &arena(), &grid), None);
    }
}
