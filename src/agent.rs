use std::collections::HashMap;

use serde::Deserialize;

use crate::autopilot::{Autopilot, Difficulty};
use crate::controls::{InputSource, KeyMap};
use crate::{Arena, Cell, Direction, OccupancyGrid};

/// Roster slot of an agent, in registration order.
pub type AgentId = usize;

/// Plain 8-bit RGB colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(255, 64, 64);
    pub const GREEN: Rgb = Rgb(64, 255, 64);
    pub const BLUE: Rgb = Rgb(64, 64, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 128);

    /// Fallback colour for roster slot `slot`.
    pub fn for_slot(slot: usize) -> Rgb {
        [Rgb::RED, Rgb::GREEN, Rgb::BLUE, Rgb::YELLOW][slot % 4]
    }
}

/// Who decides where an agent goes, as declared at setup.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Controller {
    Human {
        #[serde(default)]
        keymap: Option<KeyMap>,
    },
    Autonomous {
        #[serde(default)]
        difficulty: Difficulty,
    },
}

impl Controller {
    pub fn human(keymap: KeyMap) -> Self {
        Controller::Human { keymap: Some(keymap) }
    }

    pub fn autonomous(difficulty: Difficulty) -> Self {
        Controller::Autonomous { difficulty }
    }
}

/// Everything needed to put an agent on the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub spawn: Cell,
    pub controller: Controller,
    pub name: Option<String>,
    pub color: Option<Rgb>,
    /// Overrides the half-of-arena spawn heading.
    pub heading: Option<Direction>,
}

impl AgentDescriptor {
    pub fn new(spawn: Cell, controller: Controller) -> Self {
        Self { spawn, controller, name: None, color: None, heading: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_heading(mut self, heading: Direction) -> Self {
        self.heading = Some(heading);
        self
    }
}

/// Resolved per-tick intent strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pilot {
    Human(KeyMap),
    Autonomous(Autopilot),
}

/// A single light cycle.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    name: String,
    color: Rgb,
    pilot: Pilot,
    position: Cell,
    heading: Option<Direction>,
    speed: i32,
    trail: Vec<Cell>,
    alive: bool,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        name: String,
        color: Rgb,
        pilot: Pilot,
        spawn: Cell,
        heading: Direction,
        speed: i32,
    ) -> Self {
        Self {
            id,
            name,
            color,
            pilot,
            position: spawn,
            heading: Some(heading),
            speed,
            trail: vec![spawn],
            alive: true,
        }
    }

    pub fn id(&self) -> AgentId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn color(&self) -> Rgb { self.color }
    pub fn pilot(&self) -> &Pilot { &self.pilot }
    pub fn position(&self) -> Cell { self.position }
    pub fn heading(&self) -> Option<Direction> { self.heading }
    pub fn speed(&self) -> i32 { self.speed }
    /// Every cell occupied since spawn, oldest first.
    pub fn trail(&self) -> &[Cell] { &self.trail }
    pub fn is_alive(&self) -> bool { self.alive }

    /// Requested direction for this tick.
    pub fn intent(
        &self,
        input: &dyn InputSource,
        arena: &Arena,
        grid: &OccupancyGrid,
    ) -> Option<Direction> {
        match &self.pilot {
            Pilot::Human(keymap) => input.controls(keymap).intent(),
            Pilot::Autonomous(autopilot) => autopilot.steer(self.position, self.heading, arena, grid),
        }
    }

    /// Adopt `intent` unless it would turn straight back into the trail.
    fn reconcile(&mut self, intent: Option<Direction>) {
        if let Some(dir) = intent {
            if self.heading != Some(dir.opposite()) {
                self.heading = Some(dir);
            }
        }
    }

    /// Apply `intent`, then return the cell one step along the heading.
    pub fn compute_next_cell(&mut self, intent: Option<Direction>) -> Cell {
        self.reconcile(intent);
        match self.heading {
            Some(dir) => self.position.offset(dir, self.speed),
            None => self.position,
        }
    }

    /// Mark the agent dead if `cell` is on any trail, its own included, or
    /// outside the arena. Returns whether it is still alive.
    ///
    /// A living agent's trail is entirely in-bounds and entirely in `grid`,
    /// so the grid lookup covers self-collision.
    pub fn check_collision(&mut self, cell: Cell, arena: &Arena, grid: &OccupancyGrid) -> bool {
        if grid.contains(cell) || !arena.contains(cell) {
            self.alive = false;
        }
        self.alive
    }

    /// One tick of movement.
    ///
    /// The move is always committed: a fatal cell still lands on the trail.
    /// Cells outside the arena never enter the shared grid.
    pub fn advance(&mut self, intent: Option<Direction>, arena: &Arena, grid: &mut OccupancyGrid) -> bool {
        let next = self.compute_next_cell(intent);
        self.position = next;
        let alive = self.check_collision(next, arena, grid);
        self.trail.push(next);
        if arena.contains(next) {
            grid.insert(next);
        }
        alive
    }

    /// Gather intent and advance.
    pub fn step(&mut self, input: &dyn InputSource, arena: &Arena, grid: &mut OccupancyGrid) -> bool {
        let intent = self.intent(input, arena, grid);
        self.advance(intent, arena, grid)
    }

    /// Trail entries still claimed in `grid`, one per claim, trail order.
    pub fn erase_set(&self, grid: &OccupancyGrid) -> Vec<Cell> {
        let mut taken: HashMap<Cell, u32> = HashMap::new();
        let mut erased = Vec::new();
        for &cell in &self.trail {
            let used = taken.entry(cell).or_insert(0);
            if *used < grid.claims(cell) {
                *used += 1;
                erased.push(cell);
            }
        }
        erased
    }

    /// Withdraw this agent's trail from `grid` and return the cells removed.
    pub fn on_death(&self, grid: &mut OccupancyGrid) -> Vec<Cell> {
        let erased = self.erase_set(grid);
        for &cell in &erased {
            grid.remove(cell);
        }
        erased
    }
}
