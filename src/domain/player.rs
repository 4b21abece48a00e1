/// Player kinematics: intent, gravity, jumping, and death.
///
/// ## State
///
/// | Life  | Vertical  | Allowed                                  |
/// |-------|-----------|------------------------------------------|
/// | Alive | Grounded  | move, stop, jump                         |
/// | Alive | Airborne  | move, stop                               |
/// | Dead  | (frozen)  | nothing; only the death clock advances   |
///
/// Death is terminal. Only `reset` (a level restart) brings the player back.
///
/// ## Per-update integration
///
///   1. `vx` approaches `intent * run_speed` by at most `run_accel * dt`
///   2. `vy += gravity * dt`, clamped to `terminal_velocity`
///   3. candidate rect = rect + velocity * dt, resolved through the platforms

use std::io::Read;

use crate::config::PhysicsConfig;
use crate::domain::camera::Camera;
use crate::domain::draw::Renderer;
use crate::domain::geometry::{Rect, Rgba, Triangle, Vec2};
use crate::domain::lava::LavaField;
use crate::domain::platforms::Platforms;
use crate::domain::records::TokenReader;
use crate::error::Result;

/// Length of the death animation; the session ends after it.
pub const DEATH_ANIM_MS: u32 = 1000;
/// Outward speed of the death shards (world units per second).
const SHARD_SPEED: f32 = 120.0;
/// Downward pull on the shards (world units per second squared).
const SHARD_FALL: f32 = 400.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Life {
    Alive,
    Dead,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Vertical {
    Airborne,
    Grounded,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    Idle,
    Left,
    Right,
}

impl Intent {
    fn sign(self) -> f32 {
        match self {
            Intent::Idle => 0.0,
            Intent::Left => -1.0,
            Intent::Right => 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    rect: Rect,
    spawn: Rect,
    velocity: Vec2,
    color: Rgba,
    intent: Intent,
    vertical: Vertical,
    life: Life,
    death_ms: u32,
    physics: PhysicsConfig,
}

impl Player {
    /// A live, airborne player with its top-left corner at `position`.
    pub fn new(position: Vec2, color: Rgba, physics: PhysicsConfig) -> Self {
        let rect = Rect::new(position.x, position.y, physics.player_width, physics.player_height);
        Player {
            rect,
            spawn: rect,
            velocity: Vec2::ZERO,
            color,
            intent: Intent::Idle,
            vertical: Vertical::Airborne,
            life: Life::Alive,
            death_ms: 0,
            physics,
        }
    }

    /// Parse a stream containing only a spawn record.
    #[allow(dead_code)]
    pub fn from_reader(reader: impl Read, physics: PhysicsConfig) -> Result<Self> {
        let mut tokens = TokenReader::from_reader(reader)?;
        let player = Self::from_records(&mut tokens, physics)?;
        tokens.finish()?;
        Ok(player)
    }

    /// Spawn record: `<x> <y> <color>`.
    pub fn from_records(tokens: &mut TokenReader, physics: PhysicsConfig) -> Result<Self> {
        let position = tokens.vec2("player position")?;
        let color = tokens.color("player color")?;
        Ok(Player::new(position, color, physics))
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_alive(&self) -> bool {
        self.life == Life::Alive
    }

    pub fn is_grounded(&self) -> bool {
        self.vertical == Vertical::Grounded
    }

    #[allow(dead_code)]
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Time since death; zero while alive.
    pub fn death_elapsed_ms(&self) -> u32 {
        self.death_ms
    }

    /// Back to the spawn point, alive and at rest.
    pub fn reset(&mut self) {
        self.rect = self.spawn;
        self.velocity = Vec2::ZERO;
        self.intent = Intent::Idle;
        self.vertical = Vertical::Airborne;
        self.life = Life::Alive;
        self.death_ms = 0;
    }

    // ── Commands ──

    pub fn move_left(&mut self) {
        self.set_intent(Intent::Left);
    }

    pub fn move_right(&mut self) {
        self.set_intent(Intent::Right);
    }

    pub fn stop(&mut self) {
        self.set_intent(Intent::Idle);
    }

    fn set_intent(&mut self, intent: Intent) {
        if self.is_alive() {
            self.intent = intent;
        }
    }

    /// Returns whether the jump happened.
    pub fn jump(&mut self) -> bool {
        if !self.is_alive() || !self.is_grounded() {
            return false;
        }
        self.velocity.y = -self.physics.jump_velocity;
        self.vertical = Vertical::Airborne;
        true
    }

    pub fn die(&mut self) {
        self.life = Life::Dead;
        self.velocity = Vec2::ZERO;
        self.intent = Intent::Idle;
    }

    pub fn die_from_lava(&mut self, lava: &LavaField) {
        if self.is_alive() && lava.overlaps_rect(self.rect) {
            self.die();
        }
    }

    pub fn focus_camera(&self, camera: &mut Camera) {
        camera.center_at(self.rect.center());
    }

    // ── Simulation ──

    pub fn update(&mut self, platforms: &Platforms, delta_ms: u32) {
        if !self.is_alive() {
            self.death_ms = self.death_ms.saturating_add(delta_ms);
            return;
        }
        let dt = delta_ms as f32 / 1000.0;
        let p = &self.physics;

        let target = self.intent.sign() * p.run_speed;
        let max_dv = p.run_accel * dt;
        self.velocity.x += (target - self.velocity.x).clamp(-max_dv, max_dv);
        self.velocity.y = (self.velocity.y + p.gravity * dt).min(p.terminal_velocity);

        let candidate = self.rect.translated(self.velocity * dt);
        let res = platforms.resolve(self.rect, candidate, self.velocity);
        self.rect = res.rect;
        self.velocity = res.velocity;
        self.vertical = if res.grounded { Vertical::Grounded } else { Vertical::Airborne };
    }

    // ── Rendering ──

    pub fn render(&self, renderer: &mut dyn Renderer, camera: &Camera) -> Result<()> {
        match self.life {
            Life::Alive => camera.fill_rect(renderer, self.rect, self.color),
            Life::Dead => self.render_death(renderer, camera),
        }
    }

    /// Four shards (one per edge, apex at the center) drifting outward and
    /// falling, fading out over `DEATH_ANIM_MS`.
    fn render_death(&self, renderer: &mut dyn Renderer, camera: &Camera) -> Result<()> {
        let progress = (self.death_ms as f32 / DEATH_ANIM_MS as f32).min(1.0);
        if progress >= 1.0 {
            return Ok(());
        }
        let s = self.death_ms as f32 / 1000.0;
        let fall = Vec2::new(0.0, 0.5 * SHARD_FALL * s * s);
        let r = self.rect;
        let c = r.center();
        let (tl, tr) = (Vec2::new(r.x, r.y), Vec2::new(r.right(), r.y));
        let (br, bl) = (Vec2::new(r.right(), r.bottom()), Vec2::new(r.x, r.bottom()));

        let color = Rgba {
            a: (self.color.a as f32 * (1.0 - progress)).round() as u8,
            ..self.color.darken(progress * 0.5)
        };
        let shards = [
            (Triangle::new(tl, tr, c), Vec2::new(0.0, -1.0)),
            (Triangle::new(tr, br, c), Vec2::new(1.0, 0.0)),
            (Triangle::new(br, bl, c), Vec2::new(0.0, 1.0)),
            (Triangle::new(bl, tl, c), Vec2::new(-1.0, 0.0)),
        ];
        for (shard, dir) in shards {
            let offset = dir * (SHARD_SPEED * s) + fall;
            camera.fill_triangle(renderer, shard.map(|v| v + offset), color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::draw::testing::{Call, RecordingRenderer};
    use crate::domain::lava::{Hazard, HazardShape};
    use crate::domain::platforms::Platform;
    use crate::error::Error;

    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const GRAY: Rgba = Rgba::new(128, 128, 128, 255);

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), RED, PhysicsConfig::default())
    }

    /// A wide floor whose top is at y = 0.
    fn floor() -> Platforms {
        Platforms::new(vec![Platform { rect: Rect::new(-1000.0, 0.0, 2000.0, 50.0), color: GRAY }])
    }

    fn lava(rect: Rect) -> LavaField {
        LavaField::new(vec![Hazard::new(HazardShape::Rect(rect), RED)])
    }

    /// A player standing on `floor()`.
    fn grounded_player() -> Player {
        let mut p = player_at(0.0, -25.0);
        p.update(&floor(), 17);
        assert!(p.is_grounded());
        p
    }

    #[test]
    fn lands_on_floor_through_update() {
        let mut p = player_at(0.0, -40.0);
        let floor = floor();
        for _ in 0..60 {
            p.update(&floor, 17);
        }
        assert!(p.is_grounded());
        assert_eq!(p.rect().bottom(), 0.0);
        assert_eq!(p.velocity().y, 0.0);
    }

    #[test]
    fn gravity_accelerates_until_terminal_velocity() {
        let mut p = player_at(0.0, 0.0);
        let empty = Platforms::default();
        p.update(&empty, 100);
        assert!((p.velocity().y - 150.0).abs() < 1e-3);
        assert!(p.rect().y > 0.0);
        for _ in 0..100 {
            p.update(&empty, 100);
        }
        assert_eq!(p.velocity().y, PhysicsConfig::default().terminal_velocity);
        assert!(!p.is_grounded());
    }

    #[test]
    fn horizontal_speed_ramps_toward_intent() {
        let mut p = grounded_player();
        let floor = floor();
        p.move_right();
        p.update(&floor, 50);
        // 4000 * 0.05 = 200 per update
        assert!((p.velocity().x - 200.0).abs() < 1e-3);
        for _ in 0..10 {
            p.update(&floor, 50);
        }
        assert_eq!(p.velocity().x, 500.0);
        assert!(p.rect().x > 0.0);

        p.stop();
        for _ in 0..10 {
            p.update(&floor, 50);
        }
        assert_eq!(p.velocity().x, 0.0);
    }

    #[test]
    fn move_left_goes_negative() {
        let mut p = grounded_player();
        p.move_left();
        assert_eq!(p.intent(), Intent::Left);
        p.update(&floor(), 50);
        assert!(p.velocity().x < 0.0);
        assert!(p.rect().x < 0.0);
    }

    #[test]
    fn jump_requires_ground() {
        let mut airborne = player_at(0.0, -500.0);
        assert!(!airborne.jump());
        assert_eq!(airborne.velocity().y, 0.0);

        let mut p = grounded_player();
        assert!(p.jump());
        assert_eq!(p.velocity().y, -750.0);
        assert!(!p.is_grounded());
        // No double jump.
        assert!(!p.jump());

        p.update(&floor(), 17);
        assert!(p.rect().bottom() < 0.0);
    }

    #[test]
    fn death_is_terminal() {
        let mut p = grounded_player();
        p.move_right();
        p.die();
        let rect = p.rect();

        p.move_left();
        assert!(!p.jump());
        p.update(&floor(), 500);
        p.update(&Platforms::default(), 500);

        assert!(!p.is_alive());
        assert_eq!(p.rect(), rect);
        assert_eq!(p.velocity(), Vec2::ZERO);
        assert_eq!(p.intent(), Intent::Idle);
        assert_eq!(p.death_elapsed_ms(), 1000);
    }

    #[test]
    fn lava_contact_kills() {
        let mut p = player_at(0.0, 0.0);
        p.die_from_lava(&lava(Rect::new(100.0, 0.0, 10.0, 10.0)));
        assert!(p.is_alive());
        // Touching edge only.
        p.die_from_lava(&lava(Rect::new(25.0, 0.0, 10.0, 10.0)));
        assert!(p.is_alive());
        p.die_from_lava(&lava(Rect::new(20.0, 20.0, 10.0, 10.0)));
        assert!(!p.is_alive());
    }

    #[test]
    fn reset_restores_spawn() {
        let mut p = grounded_player();
        p.move_right();
        p.update(&floor(), 100);
        p.die();
        p.update(&floor(), 100);
        p.reset();
        assert!(p.is_alive());
        assert_eq!(p.rect(), Rect::new(0.0, -25.0, 25.0, 25.0));
        assert_eq!(p.velocity(), Vec2::ZERO);
        assert_eq!(p.death_elapsed_ms(), 0);
        assert!(!p.is_grounded());
    }

    #[test]
    fn camera_follows_center() {
        let p = player_at(100.0, 50.0);
        let mut cam = Camera::new(Vec2::ZERO);
        p.focus_camera(&mut cam);
        assert_eq!(cam.position(), Vec2::new(112.5, 62.5));
    }

    #[test]
    fn renders_body_while_alive() {
        let p = player_at(0.0, 0.0);
        let cam = Camera::new(Vec2::ZERO);
        let mut r = RecordingRenderer::new(800.0, 450.0);
        p.render(&mut r, &cam).unwrap();
        assert_eq!(r.colors(), vec![RED]);
        assert!(matches!(r.primitives().as_slice(), [Call::FillRect(_)]));
    }

    #[test]
    fn death_pose_fades_out() {
        let mut p = player_at(0.0, 0.0);
        let cam = Camera::new(Vec2::ZERO);
        p.die();
        p.update(&Platforms::default(), 250);

        let mut r = RecordingRenderer::new(800.0, 450.0);
        p.render(&mut r, &cam).unwrap();
        let prims = r.primitives();
        assert_eq!(prims.len(), 4);
        assert!(prims.iter().all(|c| matches!(c, Call::FillTriangle(_))));
        assert!(r.colors().iter().all(|c| c.a < RED.a));

        p.update(&Platforms::default(), DEATH_ANIM_MS);
        let mut r = RecordingRenderer::new(800.0, 450.0);
        p.render(&mut r, &cam).unwrap();
        assert!(r.calls.is_empty());
    }

    #[test]
    fn parses_spawn_record() {
        let p = Player::from_reader("10 -20 # spawn\n00ff00\n".as_bytes(), PhysicsConfig::default()).unwrap();
        assert_eq!(p.rect(), Rect::new(10.0, -20.0, 25.0, 25.0));
        assert!(p.is_alive());

        let err = Player::from_reader("10\nnope 00ff00".as_bytes(), PhysicsConfig::default());
        assert!(matches!(err, Err(Error::MalformedLevelData { line: 2, .. })));
    }
}
