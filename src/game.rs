//! Match controller: roster, phases and the per-tick loop.

use log::{info, trace, warn};

use crate::agent::{Agent, AgentDescriptor, AgentId, Controller, Pilot, Rgb};
use crate::autopilot::Autopilot;
use crate::controls::InputSource;
use crate::{Arena, Cell, OccupancyGrid};

/// Roster capacity.
pub const MAX_AGENTS: usize = 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("arena dimensions and cell size must be positive and within steering range")]
    InvalidArena,
    #[error("spawn cell ({x}, {y}) lies outside the arena")]
    SpawnOutOfBounds { x: i32, y: i32 },
    #[error("spawn cell ({x}, {y}) is already taken")]
    SpawnOccupied { x: i32, y: i32 },
    #[error("human agent '{0}' has no complete key mapping")]
    MissingKeymap(String),
    #[error("roster is full ({} agents)", MAX_AGENTS)]
    RosterFull,
    #[error("need at least 2 agents outside sandbox mode, got {0}")]
    NotEnoughAgents(usize),
    #[error("match has already left setup")]
    NotInSetup,
}

/// Match lifecycle.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Phase {
    #[default]
    Setup,
    Running,
    Finished,
}

/// An agent that died this tick, with the cells withdrawn from the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Death {
    pub agent: AgentId,
    pub erased: Vec<Cell>,
}

/// What happened during one call to [`Match::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1. Zero when the match was not running.
    pub tick: u64,
    /// Agents that moved, in the order they moved.
    pub moved: Vec<AgentId>,
    pub deaths: Vec<Death>,
    /// Set on the tick the match finished.
    pub finished: bool,
}

/// Read-only view handed to presentation once per tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub phase: Phase,
    pub tick: u64,
    pub sandbox: bool,
    pub arena: &'a Arena,
    pub agents: &'a [Agent],
    pub winner: Option<&'a str>,
}

/// Consumer of per-tick frames: draws trails, heads and the outcome.
pub trait PresentationSink {
    fn present(&mut self, frame: &Frame<'_>);
}

/// One game, from roster setup to a winner. Restarting means building a new
/// `Match`; nothing carries over.
#[derive(Debug, Clone)]
pub struct Match {
    arena: Arena,
    sandbox: bool,
    phase: Phase,
    agents: Vec<Agent>,
    grid: OccupancyGrid,
    tick: u64,
    winner: Option<AgentId>,
}

impl Match {
    pub fn new(arena: Arena, sandbox: bool) -> Self {
        Self {
            arena,
            sandbox,
            phase: Phase::Setup,
            agents: Vec::with_capacity(MAX_AGENTS),
            grid: OccupancyGrid::new(),
            tick: 0,
            winner: None,
        }
    }

    pub fn arena(&self) -> &Arena { &self.arena }
    pub fn phase(&self) -> Phase { self.phase }
    pub fn tick_count(&self) -> u64 { self.tick }
    pub fn grid(&self) -> &OccupancyGrid { &self.grid }
    pub fn agents(&self) -> &[Agent] { &self.agents }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    /// Name of the sole survivor once finished. `None` before then, and for
    /// a match where the last agents died together.
    pub fn winner(&self) -> Option<&str> {
        self.winner.and_then(|id| self.agent(id)).map(Agent::name)
    }

    /// Add an agent to the roster. Its spawn cell joins the grid right away.
    pub fn register(&mut self, desc: AgentDescriptor) -> Result<AgentId, SetupError> {
        if self.phase != Phase::Setup {
            return Err(SetupError::NotInSetup);
        }
        if self.agents.len() >= MAX_AGENTS {
            return Err(SetupError::RosterFull);
        }
        let spawn = desc.spawn;
        if !self.arena.contains(spawn) {
            return Err(SetupError::SpawnOutOfBounds { x: spawn.x, y: spawn.y });
        }
        if self.grid.contains(spawn) {
            return Err(SetupError::SpawnOccupied { x: spawn.x, y: spawn.y });
        }

        let id = self.agents.len();
        let mut name = desc.name.unwrap_or_else(|| format!("Player {}", id + 1));
        let pilot = match desc.controller {
            Controller::Human { keymap: Some(keymap) } if keymap.is_complete() => Pilot::Human(keymap),
            Controller::Human { .. } => return Err(SetupError::MissingKeymap(name)),
            Controller::Autonomous { difficulty } => {
                name.push_str(" (CPU)");
                Pilot::Autonomous(Autopilot::new(difficulty, &self.arena))
            }
        };
        let color = desc.color.unwrap_or_else(|| Rgb::for_slot(id));
        let heading = desc.heading.unwrap_or_else(|| self.arena.spawn_heading(spawn));

        info!("{} joins at ({}, {}) heading {:?}", name, spawn.x, spawn.y, heading);
        self.grid.insert(spawn);
        self.agents.push(Agent::new(id, name, color, pilot, spawn, heading, self.arena.cell_size()));
        Ok(id)
    }

    /// Leave setup. Outside sandbox mode a match needs two agents.
    pub fn start(&mut self) -> Result<(), SetupError> {
        if self.phase != Phase::Setup {
            return Err(SetupError::NotInSetup);
        }
        if !self.sandbox && self.agents.len() < 2 {
            return Err(SetupError::NotEnoughAgents(self.agents.len()));
        }
        self.phase = Phase::Running;
        info!(
            "match started: {} agents on {}x{}{}",
            self.agents.len(),
            self.arena.width(),
            self.arena.height(),
            if self.sandbox { " (sandbox)" } else { "" }
        );
        Ok(())
    }

    /// Run one tick: move every living agent in roster order, erase the
    /// trails of agents that died, then check for a winner.
    pub fn tick(&mut self, input: &dyn InputSource) -> TickReport {
        if self.phase != Phase::Running {
            return TickReport::default();
        }
        self.tick += 1;
        let mut report = TickReport { tick: self.tick, ..Default::default() };

        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            agent.step(input, &self.arena, &mut self.grid);
            report.moved.push(agent.id());
        }

        for &id in &report.moved {
            let agent = &self.agents[id];
            if !agent.is_alive() {
                let erased = agent.on_death(&mut self.grid);
                info!("{} has died at ({}, {})", agent.name(), agent.position().x, agent.position().y);
                report.deaths.push(Death { agent: id, erased });
            }
        }

        if !self.sandbox && self.alive_count() <= 1 {
            self.finish();
            report.finished = true;
        }
        trace!(
            "tick {}: {} alive, {} cells claimed",
            self.tick,
            self.alive_count(),
            self.grid.len()
        );
        report
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.winner = self.agents.iter().find(|a| a.is_alive()).map(Agent::id);
        match self.winner() {
            Some(name) => info!("{} won the game after {} ticks!", name, self.tick),
            None => warn!("every agent died on tick {}; no winner", self.tick),
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            phase: self.phase,
            tick: self.tick,
            sandbox: self.sandbox,
            arena: &self.arena,
            agents: &self.agents,
            winner: self.winner(),
        }
    }

    pub fn present(&self, sink: &mut dyn PresentationSink) {
        sink.present(&self.frame());
    }
}
