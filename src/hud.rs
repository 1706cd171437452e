use bevy::prelude::*;

use crate::game::{Frame, Phase};

/// HUD component for displaying match information
#[derive(Component)]
pub struct HudComponent {
    pub show: bool,
}

impl Default for HudComponent {
    fn default() -> Self {
        Self { show: true }
    }
}

impl HudComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.show = !self.show;
    }
}

/// HUD display data, rebuilt from a frame every tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudData {
    pub tick: u64,
    pub phase: Phase,
    pub sandbox: bool,
    pub alive: usize,
    pub roster: usize,
    pub winner: Option<String>,
}

impl HudData {
    pub fn from_frame(frame: &Frame<'_>) -> Self {
        Self {
            tick: frame.tick,
            phase: frame.phase,
            sandbox: frame.sandbox,
            alive: frame.agents.iter().filter(|a| a.is_alive()).count(),
            roster: frame.agents.len(),
            winner: frame.winner.map(str::to_string),
        }
    }

    /// One-line status for the corner of the screen.
    pub fn status_line(&self) -> String {
        let mode = if self.sandbox { " | sandbox" } else { "" };
        format!("tick {} | {}/{} alive{}", self.tick, self.alive, self.roster, mode)
    }

    /// Centre-screen banner, only once the match is over.
    pub fn banner(&self) -> Option<String> {
        if self.phase != Phase::Finished {
            return None;
        }
        let outcome = match &self.winner {
            Some(name) => format!("{} wins!", name),
            None => "Nobody survived!".to_string(),
        };
        Some(format!("{}\nPress Space to restart!", outcome))
    }
}
