/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub lava: LavaConfig,
    pub gamepad: GamepadConfig,
    /// Level file used when none is given on the command line.
    pub level: Option<PathBuf>,
    /// Redirect log output here (the game owns the terminal).
    pub log_file: Option<PathBuf>,
}

/// How simulation time advances each frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timestep {
    /// Fixed `step_ms` slices through an accumulator: deterministic.
    Fixed,
    /// Measured wall-clock delta straight into the update: frame-rate dependent.
    Variable,
}

/// World units are pixels of a 800x450 reference view; times are seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub run_speed: f32,
    pub run_accel: f32,
    pub jump_velocity: f32,
    pub terminal_velocity: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub timestep: Timestep,
    pub step_ms: u32,
    pub max_steps_per_frame: u32,
}

#[derive(Clone, Debug)]
pub struct LavaConfig {
    pub period_ms: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub debug: Vec<String>,
    pub monochrome: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let t = TomlPhysics::default();
        PhysicsConfig::from(t)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    lava: TomlLava,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_run_speed")]
    run_speed: f32,
    #[serde(default = "default_run_accel")]
    run_accel: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_terminal_velocity")]
    terminal_velocity: f32,
    #[serde(default = "default_player_size")]
    player_width: f32,
    #[serde(default = "default_player_size")]
    player_height: f32,
    #[serde(default = "default_timestep")]
    timestep: Timestep,
    #[serde(default = "default_step_ms")]
    step_ms: u32,
    #[serde(default = "default_max_steps")]
    max_steps_per_frame: u32,
}

#[derive(Deserialize, Debug)]
struct TomlLava {
    #[serde(default = "default_lava_period")]
    period_ms: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_debug")]
    debug: Vec<String>,
    #[serde(default = "default_monochrome")]
    monochrome: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_gravity() -> f32 { 1500.0 }
fn default_run_speed() -> f32 { 500.0 }
fn default_run_accel() -> f32 { 4000.0 }
fn default_jump_velocity() -> f32 { 750.0 }
fn default_terminal_velocity() -> f32 { 1200.0 }
fn default_player_size() -> f32 { 25.0 }
fn default_timestep() -> Timestep { Timestep::Fixed }
fn default_step_ms() -> u32 { 17 }    // round(1000 / 60)
fn default_max_steps() -> u32 { 5 }   // drop time rather than spiral after a stall
fn default_lava_period() -> u32 { 1000 }

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_debug() -> Vec<String> { vec!["Y".into()] }
fn default_monochrome() -> Vec<String> { vec!["X".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            run_speed: default_run_speed(),
            run_accel: default_run_accel(),
            jump_velocity: default_jump_velocity(),
            terminal_velocity: default_terminal_velocity(),
            player_width: default_player_size(),
            player_height: default_player_size(),
            timestep: default_timestep(),
            step_ms: default_step_ms(),
            max_steps_per_frame: default_max_steps(),
        }
    }
}

impl Default for TomlLava {
    fn default() -> Self {
        TomlLava { period_ms: default_lava_period() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            debug: default_debug(),
            monochrome: default_monochrome(),
            restart: default_restart(),
            quit: default_quit(),
        }
    }
}

impl From<TomlPhysics> for PhysicsConfig {
    fn from(t: TomlPhysics) -> Self {
        PhysicsConfig {
            gravity: t.gravity,
            run_speed: t.run_speed,
            run_accel: t.run_accel,
            jump_velocity: t.jump_velocity,
            terminal_velocity: t.terminal_velocity,
            player_width: t.player_width.max(0.0),
            player_height: t.player_height.max(0.0),
            timestep: t.timestep,
            step_ms: t.step_ms.max(1),
            max_steps_per_frame: t.max_steps_per_frame.max(1),
        }
    }
}

/// Something worth logging that happened while loading the config.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConfigNote {
    pub level: log::Level,
    pub message: String,
}

impl ConfigNote {
    fn info(message: String) -> Self {
        ConfigNote { level: log::Level::Info, message }
    }

    fn warn(message: String) -> Self {
        ConfigNote { level: log::Level::Warn, message }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    ///
    /// Runs before the logger exists, so diagnostics are returned for the
    /// caller to log once it is installed.
    pub fn load() -> (Self, Vec<ConfigNote>) {
        let search_dirs = candidate_dirs();
        let mut notes = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut notes);
        (GameConfig::from_toml(toml_cfg, &search_dirs), notes)
    }

    /// Parse config text directly (no file lookup). Paths stay as written.
    #[cfg(test)]
    fn from_str(text: &str) -> Result<Self, toml::de::Error> {
        Ok(GameConfig::from_toml(toml::from_str::<TomlConfig>(text)?, &[]))
    }

    fn from_toml(t: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            physics: PhysicsConfig::from(t.physics),
            lava: LavaConfig { period_ms: t.lava.period_ms.max(1) },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                debug: t.gamepad.debug,
                monochrome: t.gamepad.monochrome,
                restart: t.gamepad.restart,
                quit: t.gamepad.quit,
            },
            level: t.general.level.map(|l| resolve_path(&l, search_dirs)),
            log_file: t.general.log_file.map(PathBuf::from),
        }
    }
}

/// Absolute paths as-is; relative ones are looked up next to the config,
/// falling back to the CWD.
fn resolve_path(s: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = Path::new(s);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(p))
        .find(|c| c.exists())
        .unwrap_or_else(|| p.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its data.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], notes: &mut Vec<ConfigNote>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path, notes),
                Err(e) => notes.push(ConfigNote::warn(format!("could not read {}: {e}", path.display()))),
            }
        }
    }
    TomlConfig::default()
}

/// A bad file is reported and replaced by defaults as a whole.
fn parse_toml(text: &str, path: &Path, notes: &mut Vec<ConfigNote>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => {
            notes.push(ConfigNote::info(format!("loaded {}", path.display())));
            cfg
        }
        Err(e) => {
            notes.push(ConfigNote::warn(format!(
                "{} parse error: {e}; using default settings",
                path.display()
            )));
            TomlConfig::default()
        }
    }
}
