/// Game session: owns the camera, player, platforms and lava for one level
/// and advances them frame by frame.
///
/// ## Frame order
///   1. commands (`handle`)
///   2. simulation (`advance`), per step:
///        lava phase → player update → lava contact → camera follow
///   3. `render`: lava → platforms → player
///
/// ## Phases
///   Playing ──(lava contact)──▶ Dying ──(death animation done)──▶ GameOver
///   `Restart` returns to Playing from anywhere; `Quit` ends the session.
///
/// ## Timestep
///   `Fixed`: frame time feeds an accumulator drained in `step_ms` slices,
///   at most `max_steps_per_frame` per frame; any further backlog is dropped.
///   `Variable`: the frame time is one step.

use crate::config::{PhysicsConfig, Timestep};
use crate::domain::camera::Camera;
use crate::domain::draw::Renderer;
use crate::domain::lava::LavaField;
use crate::domain::platforms::Platforms;
use crate::domain::player::{Player, DEATH_ANIM_MS};
use crate::error::Result;
use super::event::GameEvent;
use super::level::Level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Stop,
    Jump,
    ToggleDebug,
    ToggleMonochrome,
    Restart,
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Dying,
    GameOver,
}

pub struct Game {
    camera: Camera,
    player: Player,
    platforms: Platforms,
    lava: LavaField,
    phase: Phase,
    running: bool,
    timestep: Timestep,
    step_ms: u32,
    max_steps: u32,
    accumulator_ms: u32,
    /// Simulation steps taken since the session (or last restart) began.
    pub ticks: u64,
}

impl Game {
    pub fn new(level: Level, physics: &PhysicsConfig) -> Self {
        let mut camera = Camera::new(level.player.rect().center());
        level.player.focus_camera(&mut camera);
        Game {
            camera,
            player: level.player,
            platforms: level.platforms,
            lava: level.lava,
            phase: Phase::Playing,
            running: true,
            timestep: physics.timestep,
            step_ms: physics.step_ms.max(1),
            max_steps: physics.max_steps_per_frame.max(1),
            accumulator_ms: 0,
            ticks: 0,
        }
    }

    #[allow(dead_code)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[allow(dead_code)]
    pub fn player(&self) -> &Player {
        &self.player
    }

    #[allow(dead_code)]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    // ── Commands ──

    pub fn handle(&mut self, cmd: Command) -> Option<GameEvent> {
        match cmd {
            Command::Quit => {
                self.running = false;
            }
            Command::Restart => {
                self.restart();
                return Some(GameEvent::LevelRestarted);
            }
            Command::ToggleDebug => self.camera.toggle_debug_mode(),
            Command::ToggleMonochrome => self.camera.toggle_monochrome_mode(),
            // The player ignores movement once dead.
            Command::MoveLeft => self.player.move_left(),
            Command::MoveRight => self.player.move_right(),
            Command::Stop => self.player.stop(),
            Command::Jump => {
                if self.player.jump() {
                    return Some(GameEvent::PlayerJumped);
                }
            }
        }
        None
    }

    fn restart(&mut self) {
        self.player.reset();
        self.player.focus_camera(&mut self.camera);
        self.phase = Phase::Playing;
        self.accumulator_ms = 0;
        self.ticks = 0;
        log::info!("level restarted");
    }

    // ── Simulation ──

    /// Advance by one frame of wall-clock time.
    pub fn advance(&mut self, frame_ms: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.timestep {
            Timestep::Variable => self.step(frame_ms, &mut events),
            Timestep::Fixed => {
                self.accumulator_ms = self.accumulator_ms.saturating_add(frame_ms);
                let mut steps = 0;
                while self.accumulator_ms >= self.step_ms && steps < self.max_steps {
                    self.step(self.step_ms, &mut events);
                    self.accumulator_ms -= self.step_ms;
                    steps += 1;
                }
                if self.accumulator_ms >= self.step_ms {
                    log::debug!("dropping {} ms of simulation backlog", self.accumulator_ms - self.accumulator_ms % self.step_ms);
                    self.accumulator_ms %= self.step_ms;
                }
            }
        }
        events
    }

    fn step(&mut self, delta_ms: u32, events: &mut Vec<GameEvent>) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.ticks += 1;
        self.lava.update(delta_ms);

        let was_grounded = self.player.is_grounded();
        self.player.update(&self.platforms, delta_ms);
        if self.player.is_alive() && !was_grounded && self.player.is_grounded() {
            events.push(GameEvent::PlayerLanded);
        }

        if self.player.is_alive() {
            self.player.die_from_lava(&self.lava);
            if !self.player.is_alive() {
                log::info!("player died at {:?}", self.player.rect().origin());
                self.phase = Phase::Dying;
                events.push(GameEvent::PlayerKilled);
            }
        } else if self.phase == Phase::Dying && self.player.death_elapsed_ms() >= DEATH_ANIM_MS {
            self.phase = Phase::GameOver;
        }

        self.player.focus_camera(&mut self.camera);
    }

    // ── Rendering ──

    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<()> {
        self.lava.render(renderer, &self.camera)?;
        self.platforms.render(renderer, &self.camera)?;
        self.player.render(renderer, &self.camera)
    }

    /// One-line summary for the status bar.
    pub fn status_line(&self) -> String {
        let mut s = match self.phase {
            Phase::Playing => String::from("←/→ move  Space jump  Tab debug  M mono  R restart  Q quit"),
            Phase::Dying => String::from("Burned!"),
            Phase::GameOver => String::from("GAME OVER  R restart  Q quit"),
        };
        if self.camera.is_debug() {
            let r = self.player.rect();
            let v = self.player.velocity();
            s = format!(
                "pos ({:.1}, {:.1})  vel ({:.1}, {:.1})  {}  tick {}",
                r.x, r.y, v.x, v.y,
                if self.player.is_grounded() { "grounded" } else { "airborne" },
                self.ticks,
            );
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::draw::testing::{Call, RecordingRenderer};

    /// Player standing over a floor, lava off to the right.
    const SAFE: &str = "0 -25 ffffff\n1\n-100 0 200 10 808080\n1\nrect 300 0 50 50 ff0000\n";
    /// Player dropping straight into lava.
    const DOOMED: &str = "0 -30 ffffff\n0\n1\nrect -100 0 200 50 ff0000\n";

    fn game(text: &str, timestep: Timestep) -> Game {
        let mut config = GameConfig::default();
        config.physics.timestep = timestep;
        let level = Level::from_text(text, &config).unwrap();
        Game::new(level, &config.physics)
    }

    #[test]
    fn fixed_step_accumulates_remainders() {
        let mut g = game(SAFE, Timestep::Fixed);
        g.advance(10);
        assert_eq!(g.ticks, 0);
        g.advance(30); // 40 ms → 2 steps, 6 ms left
        assert_eq!(g.ticks, 2);
        g.advance(11); // 17 ms → 1 step
        assert_eq!(g.ticks, 3);
        assert_eq!(g.lava.hazards()[0].phase_ms(), 51);
    }

    #[test]
    fn fixed_step_caps_catch_up() {
        let mut g = game(SAFE, Timestep::Fixed);
        g.advance(1000);
        assert_eq!(g.ticks, 5);
        assert!(g.accumulator_ms < g.step_ms);
        g.advance(0);
        assert_eq!(g.ticks, 5);
    }

    #[test]
    fn variable_step_uses_frame_time() {
        let mut g = game(SAFE, Timestep::Variable);
        g.advance(40);
        g.advance(3);
        assert_eq!(g.ticks, 2);
        assert_eq!(g.lava.hazards()[0].phase_ms(), 43);
    }

    #[test]
    fn landing_then_jump_events() {
        let mut g = game(SAFE, Timestep::Fixed);
        assert_eq!(g.handle(Command::Jump), None);
        let events = g.advance(17);
        assert_eq!(events, vec![GameEvent::PlayerLanded]);
        assert_eq!(g.handle(Command::Jump), Some(GameEvent::PlayerJumped));
        assert!(g.advance(17).is_empty());
    }

    #[test]
    fn death_leads_to_game_over() {
        let mut g = game(DOOMED, Timestep::Fixed);
        let mut killed = 0;
        for _ in 0..20 {
            killed += g.advance(17).iter().filter(|e| **e == GameEvent::PlayerKilled).count();
        }
        assert_eq!(killed, 1);
        assert_eq!(g.phase(), Phase::Dying);
        assert!(!g.player().is_alive());

        let frozen = g.player().rect();
        g.handle(Command::MoveRight);
        for _ in 0..(DEATH_ANIM_MS / 17 + 2) {
            g.advance(17);
        }
        assert_eq!(g.phase(), Phase::GameOver);
        assert_eq!(g.player().rect(), frozen);

        let ticks = g.ticks;
        g.advance(17);
        assert_eq!(g.ticks, ticks);
        assert!(g.is_running());
    }

    #[test]
    fn restart_and_quit() {
        let mut g = game(DOOMED, Timestep::Fixed);
        for _ in 0..60 {
            g.advance(17);
        }
        assert_ne!(g.phase(), Phase::Playing);
        assert_eq!(g.handle(Command::Restart), Some(GameEvent::LevelRestarted));
        assert_eq!(g.phase(), Phase::Playing);
        assert!(g.player().is_alive());
        assert_eq!(g.player().rect().y, -30.0);

        g.handle(Command::Quit);
        assert!(!g.is_running());
    }

    #[test]
    fn toggles_reach_camera() {
        let mut g = game(SAFE, Timestep::Fixed);
        g.handle(Command::ToggleDebug);
        g.handle(Command::ToggleMonochrome);
        assert!(g.camera().is_debug());
        assert!(g.camera().is_monochrome());
        assert!(g.status_line().contains("airborne"));
        g.handle(Command::ToggleDebug);
        assert!(!g.camera().is_debug());
    }

    #[test]
    fn camera_follows_player() {
        let mut g = game(SAFE, Timestep::Fixed);
        g.advance(17);
        g.handle(Command::MoveRight);
        for _ in 0..10 {
            g.advance(17);
        }
        assert_eq!(g.camera().position(), g.player().rect().center());
        assert!(g.camera().position().x > 12.5);
    }

    #[test]
    fn renders_lava_then_platforms_then_player() {
        let g = game(SAFE, Timestep::Fixed);
        let mut r = RecordingRenderer::new(800.0, 450.0);
        g.render(&mut r).unwrap();
        let colors = r.colors();
        assert_eq!(colors.last().copied(), Some(crate::domain::geometry::Rgba::WHITE));
        assert!(matches!(r.primitives().last(), Some(Call::FillRect(_))));
        let gray = crate::domain::geometry::Rgba::new(0x80, 0x80, 0x80, 255);
        let gray_at = colors.iter().position(|c| *c == gray).unwrap();
        assert!(gray_at > 0 && gray_at < colors.len() - 1);
    }
}
