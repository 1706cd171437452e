use std::process::ExitCode;

use bevy::{log::LogPlugin, prelude::*};
use clap::Parser;
use log::{debug, error, info};

use lightcycles::agent::Pilot;
use lightcycles::hud::{HudComponent, HudData};
use lightcycles::{
    AgentId, Arena, Cell, Config, Controls, Frame, HeldKeys, InputSource, KeyMap, Match, Phase,
    PresentationSink, Rgb, SetupError,
};

#[derive(Parser, Debug)]
#[command(name = "lightcycles", version, about = "Light-cycle arena for up to four players")]
struct Cli {
    /// TOML configuration file (defaults to ./lightcycles.toml when present)
    #[arg(short, long)]
    config: Option<String>,
    /// Disable the win condition
    #[arg(long)]
    sandbox: bool,
    /// Run without a window; human agents get no input
    #[arg(long)]
    headless: bool,
    /// Give up on a headless match after this many ticks
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,
}

/// Live match plus the configuration used to rebuild it on restart.
#[derive(Resource)]
struct Session {
    config: Config,
    game: Match,
}

impl Session {
    fn restart(&mut self) -> Result<(), SetupError> {
        self.game = self.config.build_match()?;
        info!("match restarted");
        Ok(())
    }
}

#[derive(Component)]
struct TrailSprite {
    agent: AgentId,
}

#[derive(Component)]
struct HeadSprite {
    agent: AgentId,
}

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct BannerText;

/// Shows and hides the status line. Must stay off every default key map.
const HUD_TOGGLE_KEY: KeyCode = KeyCode::F1;
const RESTART_KEY: KeyCode = KeyCode::Space;
const QUIT_KEY: KeyCode = KeyCode::Escape;

/// Translate a config key name (`KeyW`, `ArrowUp`, `Semicolon`, ...) to a key code.
fn key_code(name: &str) -> Option<KeyCode> {
    let code = match name {
        "KeyA" => KeyCode::KeyA,
        "KeyB" => KeyCode::KeyB,
        "KeyC" => KeyCode::KeyC,
        "KeyD" => KeyCode::KeyD,
        "KeyE" => KeyCode::KeyE,
        "KeyF" => KeyCode::KeyF,
        "KeyG" => KeyCode::KeyG,
        "KeyH" => KeyCode::KeyH,
        "KeyI" => KeyCode::KeyI,
        "KeyJ" => KeyCode::KeyJ,
        "KeyK" => KeyCode::KeyK,
        "KeyL" => KeyCode::KeyL,
        "KeyM" => KeyCode::KeyM,
        "KeyN" => KeyCode::KeyN,
        "KeyO" => KeyCode::KeyO,
        "KeyP" => KeyCode::KeyP,
        "KeyQ" => KeyCode::KeyQ,
        "KeyR" => KeyCode::KeyR,
        "KeyS" => KeyCode::KeyS,
        "KeyT" => KeyCode::KeyT,
        "KeyU" => KeyCode::KeyU,
        "KeyV" => KeyCode::KeyV,
        "KeyW" => KeyCode::KeyW,
        "KeyX" => KeyCode::KeyX,
        "KeyY" => KeyCode::KeyY,
        "KeyZ" => KeyCode::KeyZ,
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "Semicolon" => KeyCode::Semicolon,
        "Quote" => KeyCode::Quote,
        "Comma" => KeyCode::Comma,
        "Period" => KeyCode::Period,
        "Slash" => KeyCode::Slash,
        "Numpad8" => KeyCode::Numpad8,
        "Numpad2" => KeyCode::Numpad2,
        "Numpad4" => KeyCode::Numpad4,
        "Numpad6" => KeyCode::Numpad6,
        _ => return None,
    };
    Some(code)
}

/// Every human key map must name keys we can poll.
fn check_keymaps(game: &Match) -> Result<(), String> {
    for agent in game.agents() {
        if let Pilot::Human(keymap) = agent.pilot() {
            if let Some(bad) = keymap.keys().into_iter().find(|k| key_code(k).is_none()) {
                return Err(format!("{}: unknown key '{}'", agent.name(), bad));
            }
        }
    }
    Ok(())
}

/// Held keyboard state as an input source.
struct Keyboard<'a>(&'a ButtonInput<KeyCode>);

impl InputSource for Keyboard<'_> {
    fn controls(&self, keymap: &KeyMap) -> Controls {
        let held = |name: &str| key_code(name).is_some_and(|k| self.0.pressed(k));
        Controls {
            up: held(keymap.up.as_str()),
            down: held(keymap.down.as_str()),
            left: held(keymap.left.as_str()),
            right: held(keymap.right.as_str()),
        }
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::srgb_u8(rgb.0, rgb.1, rgb.2)
}

/// Arena coordinates (origin top-left, y down) to world space (origin centre, y up).
fn to_world(arena: &Arena, cell: Cell, z: f32) -> Vec3 {
    let half = arena.cell_size() as f32 / 2.0;
    Vec3::new(
        cell.x as f32 - arena.width() as f32 / 2.0 + half,
        arena.height() as f32 / 2.0 - cell.y as f32 - half,
        z,
    )
}

fn spawn_trail_cell(commands: &mut Commands, arena: &Arena, agent: AgentId, color: Rgb, cell: Cell) {
    commands.spawn((
        Sprite::from_color(to_color(color), Vec2::splat(arena.cell_size() as f32)),
        Transform::from_translation(to_world(arena, cell, 0.0)),
        TrailSprite { agent },
    ));
}

/// Sprites for the spawn cells and one head marker per agent.
fn spawn_field(commands: &mut Commands, game: &Match) {
    let arena = game.arena();
    for agent in game.agents() {
        spawn_trail_cell(commands, arena, agent.id(), agent.color(), agent.position());
        commands.spawn((
            Sprite::from_color(Color::WHITE, Vec2::splat(arena.cell_size() as f32)),
            Transform::from_translation(to_world(arena, agent.position(), 1.0)),
            HeadSprite { agent: agent.id() },
        ));
    }
}

fn setup(mut commands: Commands, session: Res<Session>) {
    commands.spawn(Camera2d);

    let arena = session.game.arena();
    let border = arena.cell_size() as f32;
    commands.spawn((
        Sprite::from_color(
            Color::srgb(0.15, 0.15, 0.15),
            Vec2::new(arena.width() as f32 + border, arena.height() as f32 + border),
        ),
        Transform::from_xyz(0.0, 0.0, -1.0),
    ));
    spawn_field(&mut commands, &session.game);

    commands.spawn((
        Text::new(""),
        TextFont { font_size: 16.0, ..default() },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
        StatusText,
        HudComponent::new(),
    ));
    commands.spawn((
        Text::new(""),
        TextFont { font_size: 32.0, ..default() },
        TextColor(Color::BLACK),
        TextLayout::new_with_justify(JustifyText::Center),
        BackgroundColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            align_self: AlignSelf::Center,
            justify_self: JustifySelf::Center,
            ..default()
        },
        Visibility::Hidden,
        BannerText,
    ));
}

/// Advance the match one tick and mirror the result into sprites.
fn simulate(
    mut commands: Commands,
    mut session: ResMut<Session>,
    keys: Res<ButtonInput<KeyCode>>,
    trails: Query<(Entity, &TrailSprite)>,
) {
    if session.game.phase() != Phase::Running {
        return;
    }
    let report = session.game.tick(&Keyboard(&keys));
    let game = &session.game;

    for &id in &report.moved {
        if let Some(agent) = game.agent(id).filter(|a| a.is_alive()) {
            spawn_trail_cell(&mut commands, game.arena(), id, agent.color(), agent.position());
        }
    }
    for death in &report.deaths {
        debug!("erasing {} cells of agent {}", death.erased.len(), death.agent);
        for (entity, trail) in &trails {
            if trail.agent == death.agent {
                commands.entity(entity).despawn();
            }
        }
    }
}

fn update_heads(session: Res<Session>, mut heads: Query<(&HeadSprite, &mut Transform, &mut Visibility)>) {
    let game = &session.game;
    for (head, mut transform, mut visibility) in &mut heads {
        let Some(agent) = game.agent(head.agent) else { continue };
        transform.translation = to_world(game.arena(), agent.position(), 1.0);
        *visibility = if agent.is_alive() { Visibility::Inherited } else { Visibility::Hidden };
    }
}

/// Bevy side of the presentation boundary: collects HUD text from a frame.
#[derive(Default)]
struct HudSink {
    data: Option<HudData>,
}

impl PresentationSink for HudSink {
    fn present(&mut self, frame: &Frame<'_>) {
        self.data = Some(HudData::from_frame(frame));
    }
}

fn update_hud(
    session: Res<Session>,
    mut status: Query<(&mut Text, &HudComponent, &mut Visibility), (With<StatusText>, Without<BannerText>)>,
    mut banner: Query<(&mut Text, &mut Visibility), (With<BannerText>, Without<StatusText>)>,
) {
    let mut sink = HudSink::default();
    session.game.present(&mut sink);
    let Some(data) = sink.data else { return };

    for (mut text, hud, mut visibility) in &mut status {
        text.0 = data.status_line();
        *visibility = if hud.show { Visibility::Inherited } else { Visibility::Hidden };
    }
    for (mut text, mut visibility) in &mut banner {
        match data.banner() {
            Some(message) => {
                text.0 = message;
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

/// Space restarts the match, F1 toggles the status line, Escape quits.
fn handle_game_input(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    mut session: ResMut<Session>,
    sprites: Query<Entity, Or<(With<TrailSprite>, With<HeadSprite>)>>,
    mut hud: Query<&mut HudComponent>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(QUIT_KEY) {
        exit.send(AppExit::Success);
        return;
    }
    if keys.just_pressed(HUD_TOGGLE_KEY) {
        for mut h in &mut hud {
            h.toggle();
        }
    }
    if keys.just_pressed(RESTART_KEY) {
        if let Err(e) = session.restart() {
            error!("restart failed: {}", e);
            return;
        }
        for entity in &sprites {
            commands.entity(entity).despawn();
        }
        spawn_field(&mut commands, &session.game);
    }
}

/// Presentation for headless runs: logs the status line each tick.
struct LogSink;

impl PresentationSink for LogSink {
    fn present(&mut self, frame: &Frame<'_>) {
        debug!("{}", HudData::from_frame(frame).status_line());
    }
}

fn run_headless(mut game: Match, max_ticks: u64) -> ExitCode {
    let idle = HeldKeys::new();
    let mut sink = LogSink;
    while game.phase() == Phase::Running && game.tick_count() < max_ticks {
        game.tick(&idle);
        game.present(&mut sink);
    }

    let data = HudData::from_frame(&game.frame());
    match (data.phase, &data.winner) {
        (Phase::Finished, Some(name)) => info!("{} won after {} ticks", name, data.tick),
        (Phase::Finished, None) => info!("no survivors after {} ticks", data.tick),
        _ => info!("stopped after {} ticks with {} agents alive", data.tick, data.alive),
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    config.sandbox |= cli.sandbox;

    let game = match config.build_match() {
        Ok(game) => game,
        Err(e) => {
            error!("cannot start match: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = check_keymaps(&game) {
        error!("invalid key mapping: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.headless {
        return run_headless(game, cli.max_ticks);
    }

    let arena = *game.arena();
    let margin = arena.cell_size() as f32;
    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Light Cycles".into(),
                        resolution: (arena.width() as f32 + margin, arena.height() as f32 + margin).into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Time::<Fixed>::from_hz(config.tick_rate.max(1) as f64))
        .insert_resource(Session { config, game })
        .add_systems(Startup, setup)
        .add_systems(FixedUpdate, simulate)
        .add_systems(Update, (handle_game_input, update_heads, update_hud).chain())
        .run();
    match exit {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_keys_stay_off_default_keymaps() {
        for slot in 0..lightcycles::MAX_AGENTS {
            let keymap = KeyMap::default_for_slot(slot).unwrap();
            for name in keymap.keys() {
                let code = key_code(name).unwrap();
                assert_ne!(code, HUD_TOGGLE_KEY, "slot {} binds {}", slot, name);
                assert_ne!(code, RESTART_KEY, "slot {} binds {}", slot, name);
                assert_ne!(code, QUIT_KEY, "slot {} binds {}", slot, name);
            }
        }
    }
}
