//! Configuration loader for lightcycles.
//!
//! * Looks for `lightcycles.toml` in the cwd unless overridden by `--config`.
//! * Provides defaults so the file is optional.
//!
//! Extend this struct whenever you add new tunables.

use std::fs;

use log::warn;
use serde::Deserialize;

use crate::agent::{AgentDescriptor, Controller, Rgb};
use crate::controls::KeyMap;
use crate::game::{Match, SetupError};
use crate::{Arena, Cell, Difficulty, Direction};

pub const DEFAULT_PATH: &str = "lightcycles.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ArenaConfig {
    #[serde(default = "default_extent")]
    pub width: i32,
    #[serde(default = "default_extent")]
    pub height: i32,
    /// Side of one cell; also the per-tick step.
    #[serde(default = "default_cell_size")]
    pub cell_size: i32,
}

fn default_extent() -> i32 { 500 }
fn default_cell_size() -> i32 { 4 }

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: default_extent(),
            height: default_extent(),
            cell_size: default_cell_size(),
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    pub spawn: Cell,
    pub control: Controller,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub heading: Option<Direction>,
}

impl AgentConfig {
    pub fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor {
            spawn: self.spawn,
            controller: self.control.clone(),
            name: self.name.clone(),
            color: self.color,
            heading: self.heading,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Simulation ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    #[serde(default)]
    pub arena: ArenaConfig,
    /// Disable the win condition.
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,
}

fn default_tick_rate() -> u32 { 60 }

/// A human on WASD in the lower right against a hard CPU in the upper left.
fn default_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig {
            spawn: Cell::new(400, 400),
            control: Controller::Human { keymap: KeyMap::default_for_slot(0) },
            name: None,
            color: Some(Rgb::RED),
            heading: None,
        },
        AgentConfig {
            spawn: Cell::new(100, 100),
            control: Controller::autonomous(Difficulty::Hard),
            name: None,
            color: Some(Rgb(171, 235, 52)),
            heading: None,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            arena: ArenaConfig::default(),
            sandbox: false,
            agents: default_agents(),
        }
    }
}

impl Config {
    /// Load from a TOML file. With no explicit path a missing default file
    /// yields the built-in defaults; an explicit path must exist.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match fs::read_to_string(DEFAULT_PATH) {
                Ok(text) => Self::from_toml(&text),
                Err(_) => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn arena(&self) -> Result<Arena, SetupError> {
        Arena::new(self.arena.width, self.arena.height, self.arena.cell_size)
            .ok_or(SetupError::InvalidArena)
    }

    /// Build a fresh match in the running phase. Entries past the roster
    /// limit are skipped with a warning; every other problem is an error.
    pub fn build_match(&self) -> Result<Match, SetupError> {
        let mut game = Match::new(self.arena()?, self.sandbox);
        for (i, agent) in self.agents.iter().enumerate() {
            match game.register(agent.descriptor()) {
                Ok(_) => {}
                Err(SetupError::RosterFull) => {
                    warn!("ignoring agent #{}: roster is full", i + 1);
                }
                Err(e) => return Err(e),
            }
        }
        game.start()?;
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;

    const TWO_PLAYERS: &str = r#"
        tick_rate = 30
        sandbox = false

        [arena]
        width = 200
        height = 120
        cell_size = 5

        [[agents]]
        spawn = { x = 20, y = 100 }
        name = "Alice"
        color = [255, 0, 0]
        control = { kind = "human", keymap = { up = "ArrowUp", down = "ArrowDown", left = "ArrowLeft", right = "ArrowRight" } }

        [[agents]]
        spawn = { x = 180, y = 20 }
        heading = "left"
        control = { kind = "autonomous", difficulty = "medium" }
    "#;

    #[test]
    fn defaults_when_file_absent() {
        let cfg = Config::default();
        assert_eq!(cfg.tick_rate, 60);
        assert_eq!(cfg.arena, ArenaConfig { width: 500, height: 500, cell_size: 4 });
        assert_eq!(cfg.agents.len(), 2);
        let game = cfg.build_match().unwrap();
        assert_eq!(game.phase(), Phase::Running);
        assert_eq!(game.agents()[1].name(), "Player 2 (CPU)");
    }

    #[test]
    fn parses_full_file() {
        let cfg = Config::from_toml(TWO_PLAYERS).unwrap();
        assert_eq!(cfg.tick_rate, 30);
        assert_eq!(cfg.arena.cell_size, 5);
        assert_eq!(cfg.agents[0].color, Some(Rgb(255, 0, 0)));
        assert_eq!(cfg.agents[1].control, Controller::autonomous(Difficulty::Medium));
        assert_eq!(cfg.agents[1].heading, Some(Direction::Left));

        let game = cfg.build_match().unwrap();
        assert_eq!(game.agents()[0].name(), "Alice");
        assert_eq!(game.agents()[0].heading(), Some(Direction::Up));
        assert_eq!(game.agents()[1].heading(), Some(Direction::Left));
        assert_eq!(game.agents()[1].speed(), 5);
    }

    #[test]
    fn example_file_builds_a_full_roster() {
        let cfg = Config::from_toml(include_str!("../lightcycles.example.toml")).unwrap();
        let game = cfg.build_match().unwrap();
        assert_eq!(game.agents().len(), 4);
        assert_eq!(game.agents()[1].name(), "Blue");
        assert_eq!(game.agents()[3].name(), "Player 4 (CPU)");
        assert_eq!(game.agents()[3].heading(), Some(Direction::Left));
    }

    #[test]
    fn missing_sections_fall_back() {
        let cfg = Config::from_toml("sandbox = true").unwrap();
        assert!(cfg.sandbox);
        assert_eq!(cfg.arena, ArenaConfig::default());
        assert_eq!(cfg.agents.len(), 2);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(Config::from_toml("tick_rate = \"fast\""), Err(ConfigError::Parse(_))));
        let unknown_kind = r#"
            [[agents]]
            spawn = { x = 1, y = 1 }
            control = { kind = "telepathic" }
        "#;
        assert!(Config::from_toml(unknown_kind).is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Config::load(Some("/nonexistent/lightcycles.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn human_without_keymap_fails_before_running() {
        let text = r#"
            [[agents]]
            spawn = { x = 10, y = 10 }
            control = { kind = "human" }

            [[agents]]
            spawn = { x = 90, y = 90 }
            control = { kind = "autonomous" }
        "#;
        let cfg = Config::from_toml(text).unwrap();
        assert_eq!(cfg.build_match().unwrap_err(), SetupError::MissingKeymap("Player 1".into()));
    }

    #[test]
    fn extra_agents_are_skipped() {
        let mut cfg = Config::default();
        for x in [150, 200, 250] {
            cfg.agents.push(AgentConfig {
                spawn: Cell::new(x, 300),
                control: Controller::autonomous(Difficulty::Easy),
                name: None,
                color: None,
                heading: None,
            });
        }
        let game = cfg.build_match().unwrap();
        assert_eq!(game.agents().len(), crate::MAX_AGENTS);
    }

    #[test]
    fn lone_agent_needs_sandbox() {
        let mut cfg = Config::default();
        cfg.agents.truncate(1);
        assert_eq!(cfg.build_match().unwrap_err(), SetupError::NotEnoughAgents(1));
        cfg.sandbox = true;
        assert!(cfg.build_match().is_ok());
    }

    #[test]
    fn bad_arena_rejected() {
        let cfg = Config::from_toml("[arena]\ncell_size = 0").unwrap();
        assert_eq!(cfg.build_match().unwrap_err(), SetupError::InvalidArena);
    }

    #[test]
    fn oversized_arena_rejected_before_the_first_tick() {
        let cfg = Config::from_toml(
            "[arena]\nwidth = 200000\nheight = 200000\ncell_size = 40000",
        )
        .unwrap();
        assert_eq!(cfg.build_match().unwrap_err(), SetupError::InvalidArena);
    }
}
