/// Static solid platforms and the collision resolver that keeps a moving
/// actor out of them.
///
/// ## Resolution (axis-separated, swept)
///
///   1. Horizontal: move along x only. A platform blocks when its vertical
///      extent overlaps the actor's pre-move extent and the move crosses its
///      near edge. The actor is clamped flush to that edge and `vx` zeroed.
///   2. Vertical: from the horizontally corrected rect, move along y only.
///      Crossing a top edge while falling is a landing (grounded, `vy = 0`).
///      Crossing a bottom edge while rising is a head bump (`vy = 0`, not
///      grounded).
///   3. Depenetration: an actor that *started* inside a platform is pushed
///      out along the axis of least penetration.
///
/// Edges are swept, not sampled, so a fast actor cannot skip a thin
/// platform. When several platforms qualify in a pass the one reached with
/// the least travel wins. Zero-area platforms are ignored.

use std::io::Read;

use crate::domain::camera::Camera;
use crate::domain::draw::Renderer;
use crate::domain::geometry::{Rect, Rgba, Vec2};
use crate::domain::records::{self, TokenReader};
use crate::error::Result;

/// Contact tolerance: an actor resting within this distance of an edge is
/// considered in front of it.
const CONTACT_EPS: f32 = 1e-3;
/// Upper bound on depenetration pushes per resolve.
const MAX_PUSHES: usize = 4;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Platform {
    pub rect: Rect,
    pub color: Rgba,
}

/// Outcome of one resolver pass.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Resolution {
    pub rect: Rect,
    pub velocity: Vec2,
    pub grounded: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Platforms {
    platforms: Vec<Platform>,
}

impl Platforms {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Platforms { platforms }
    }

    /// Parse a stream containing only a platform section.
    #[allow(dead_code)]
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut tokens = TokenReader::from_reader(reader)?;
        let platforms = Self::from_records(&mut tokens)?;
        tokens.finish()?;
        Ok(platforms)
    }

    /// Platform section: `<count>` then `<x> <y> <w> <h> <color>` per platform.
    pub fn from_records(tokens: &mut TokenReader) -> Result<Self> {
        let n = tokens.count("platform count")?;
        let mut platforms = records::reserve(n, "platforms")?;
        for _ in 0..n {
            let rect = tokens.rect("platform rect")?;
            let color = tokens.color("platform color")?;
            platforms.push(Platform { rect, color });
        }
        Ok(Platforms::new(platforms))
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter()
    }

    fn solids(&self) -> impl Iterator<Item = Rect> + '_ {
        self.platforms.iter().map(|p| p.rect).filter(|r| !r.is_degenerate())
    }

    pub fn render(&self, renderer: &mut dyn Renderer, camera: &Camera) -> Result<()> {
        let visible = camera.visible_world_rect(renderer.viewport_size()?);
        for p in self.platforms.iter().filter(|p| p.rect.overlaps(&visible)) {
            camera.fill_rect(renderer, p.rect, p.color)?;
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════
    // Resolver
    // ══════════════════════════════════════════════════════════════

    /// Constrain the move `prev → candidate` against every platform.
    pub fn resolve(&self, prev: Rect, candidate: Rect, velocity: Vec2) -> Resolution {
        let mut velocity = velocity;

        // 1. Horizontal
        let mut rect = Rect::new(candidate.x, prev.y, prev.w, prev.h);
        if let Some(x) = self.sweep_x(prev, candidate.x) {
            rect.x = x;
            velocity.x = 0.0;
        }

        // 2. Vertical
        let moved = Rect::new(rect.x, prev.y, rect.w, rect.h);
        let mut grounded = false;
        rect.y = candidate.y;
        if let Some((y, contact)) = self.sweep_y(moved, candidate.y) {
            rect.y = y;
            velocity.y = 0.0;
            grounded = contact == Contact::Top;
        }

        // 3. Started inside something
        for _ in 0..MAX_PUSHES {
            let Some(push) = self.least_penetration(rect) else { break };
            rect = rect.translated(push);
            if push.x != 0.0 {
                velocity.x = 0.0;
            }
            if push.y < 0.0 {
                grounded = true;
                velocity.y = velocity.y.min(0.0);
            } else if push.y > 0.0 {
                velocity.y = velocity.y.max(0.0);
            }
        }

        Resolution { rect, velocity, grounded }
    }

    /// Clamped x for the nearest edge crossed moving `from.x → to_x`.
    fn sweep_x(&self, from: Rect, to_x: f32) -> Option<f32> {
        let dx = to_x - from.x;
        if dx == 0.0 {
            return None;
        }
        let mut best: Option<(f32, f32)> = None; // (travel, clamped x)
        for p in self.solids() {
            if !spans_overlap(from.y, from.bottom(), p.y, p.bottom()) {
                continue;
            }
            let hit = if dx > 0.0 {
                (from.right() <= p.x + CONTACT_EPS && to_x + from.w > p.x)
                    .then(|| p.x - from.w)
            } else {
                (from.x >= p.right() - CONTACT_EPS && to_x < p.right())
                    .then(|| p.right())
            };
            if let Some(x) = hit {
                let travel = (x - from.x).abs();
                if best.map_or(true, |(t, _)| travel < t) {
                    best = Some((travel, x));
                }
            }
        }
        best.map(|(_, x)| x)
    }

    /// Clamped y and contact side for the nearest edge crossed moving
    /// `from.y → to_y`.
    fn sweep_y(&self, from: Rect, to_y: f32) -> Option<(f32, Contact)> {
        let dy = to_y - from.y;
        if dy == 0.0 {
            return None;
        }
        let mut best: Option<(f32, f32, Contact)> = None;
        for p in self.solids() {
            if !spans_overlap(from.x, from.right(), p.x, p.right()) {
                continue;
            }
            let hit = if dy > 0.0 {
                (from.bottom() <= p.y + CONTACT_EPS && to_y + from.h > p.y)
                    .then(|| (p.y - from.h, Contact::Top))
            } else {
                (from.y >= p.bottom() - CONTACT_EPS && to_y < p.bottom())
                    .then(|| (p.bottom(), Contact::Bottom))
            };
            if let Some((y, contact)) = hit {
                let travel = (y - from.y).abs();
                if best.map_or(true, |(t, _, _)| travel < t) {
                    best = Some((travel, y, contact));
                }
            }
        }
        best.map(|(_, y, c)| (y, c))
    }

    /// Smallest push that separates `rect` from one overlapping platform.
    fn least_penetration(&self, rect: Rect) -> Option<Vec2> {
        let mut best: Option<Vec2> = None;
        let len = |v: Vec2| v.x.abs() + v.y.abs();
        for p in self.solids() {
            if !spans_overlap(rect.x, rect.right(), p.x, p.right())
                || !spans_overlap(rect.y, rect.bottom(), p.y, p.bottom())
            {
                continue;
            }
            let pushes = [
                Vec2::new(p.x - rect.right(), 0.0),
                Vec2::new(p.right() - rect.x, 0.0),
                Vec2::new(0.0, p.y - rect.bottom()),
                Vec2::new(0.0, p.bottom() - rect.y),
            ];
            for push in pushes {
                if best.map_or(true, |b| len(push) < len(b)) {
                    best = Some(push);
                }
            }
        }
        best
    }
}

/// Do `[a0, a1]` and `[b0, b1]` share more than `CONTACT_EPS`? Rounding
/// slivers left by clamping do not count, so flush floor seams stay smooth.
fn spans_overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> bool {
    a0 < b1 - CONTACT_EPS && b0 < a1 - CONTACT_EPS
}

/// Which platform edge a vertical sweep stopped at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Contact {
    Top,
    Bottom,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const GRAY: Rgba = Rgba::new(128, 128, 128, 255);

    fn platforms(rects: &[Rect]) -> Platforms {
        Platforms::new(rects.iter().map(|&rect| Platform { rect, color: GRAY }).collect())
    }

    fn step(p: &Platforms, prev: Rect, v: Vec2) -> Resolution {
        p.resolve(prev, prev.translated(v), v)
    }

    // ── Vertical ──

    #[test]
    fn falling_player_lands_on_top() {
        let p = platforms(&[Rect::new(-5.0, 11.0, 10.0, 1.0)]);
        let r = step(&p, Rect::new(0.0, 10.0, 1.0, 1.0), Vec2::new(0.0, 5.0));
        assert_eq!(r.rect.y, 10.0);
        assert!(r.grounded);
        assert_eq!(r.velocity.y, 0.0);
    }

    #[test]
    fn rising_player_bumps_head_without_grounding() {
        let p = platforms(&[Rect::new(-5.0, 11.0, 10.0, 1.0)]);
        let r = step(&p, Rect::new(0.0, 13.0, 1.0, 1.0), Vec2::new(0.0, -5.0));
        assert_eq!(r.rect.y, 12.0);
        assert!(!r.grounded);
        assert_eq!(r.velocity.y, 0.0);
    }

    #[test]
    fn free_fall_is_airborne() {
        let p = platforms(&[Rect::new(50.0, 11.0, 10.0, 1.0)]);
        let r = step(&p, Rect::new(0.0, 0.0, 1.0, 1.0), Vec2::new(0.0, 5.0));
        assert_eq!(r.rect, Rect::new(0.0, 5.0, 1.0, 1.0));
        assert!(!r.grounded);
        assert_eq!(r.velocity, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn standing_still_on_edge_is_not_penetration() {
        let p = platforms(&[Rect::new(-5.0, 11.0, 10.0, 1.0)]);
        let r = step(&p, Rect::new(0.0, 10.0, 1.0, 1.0), Vec2::ZERO);
        assert_eq!(r.rect, Rect::new(0.0, 10.0, 1.0, 1.0));
        assert!(!r.grounded);
    }

    #[test]
    fn fast_fall_does_not_tunnel_through_thin_platform() {
        let p = platforms(&[Rect::new(-5.0, 20.0, 10.0, 0.1)]);
        let r = step(&p, Rect::new(0.0, 0.0, 1.0, 1.0), Vec2::new(0.0, 500.0));
        assert_eq!(r.rect.y, 19.0);
        assert!(r.grounded);
    }

    #[test]
    fn nearest_of_stacked_platforms_wins() {
        let p = platforms(&[
            Rect::new(-5.0, 30.0, 10.0, 1.0),
            Rect::new(-5.0, 20.0, 10.0, 1.0),
            Rect::new(-5.0, 40.0, 10.0, 1.0),
        ]);
        let r = step(&p, Rect::new(0.0, 0.0, 1.0, 1.0), Vec2::new(0.0, 100.0));
        assert_eq!(r.rect.y, 19.0);
    }

    #[test]
    fn degenerate_platforms_are_ignored() {
        let p = platforms(&[Rect::new(-5.0, 11.0, 10.0, 0.0), Rect::new(3.0, -10.0, 0.0, 50.0)]);
        let r = step(&p, Rect::new(0.0, 10.0, 1.0, 1.0), Vec2::new(5.0, 5.0));
        assert_eq!(r.rect, Rect::new(5.0, 15.0, 1.0, 1.0));
        assert!(!r.grounded);
    }

    // ── Horizontal ──

    #[test]
    fn wall_stops_rightward_motion() {
        let p = platforms(&[Rect::new(10.0, 0.0, 5.0, 20.0)]);
        let r = step(&p, Rect::new(0.0, 5.0, 2.0, 2.0), Vec2::new(20.0, 0.0));
        assert_eq!(r.rect.x, 8.0);
        assert_eq!(r.velocity.x, 0.0);
    }

    #[test]
    fn wall_stops_leftward_motion() {
        let p = platforms(&[Rect::new(-15.0, 0.0, 5.0, 20.0)]);
        let r = step(&p, Rect::new(0.0, 5.0, 2.0, 2.0), Vec2::new(-20.0, 0.0));
        assert_eq!(r.rect.x, -10.0);
        assert_eq!(r.velocity.x, 0.0);
    }

    #[test]
    fn walking_along_floor_is_not_blocked_by_it() {
        let p = platforms(&[Rect::new(-50.0, 10.0, 100.0, 5.0)]);
        let r = step(&p, Rect::new(0.0, 8.0, 2.0, 2.0), Vec2::new(3.0, 1.0));
        assert_eq!(r.rect, Rect::new(3.0, 8.0, 2.0, 2.0));
        assert!(r.grounded);
        assert_eq!(r.velocity, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn horizontal_resolves_before_vertical() {
        // Wall to the right, floor below: both corrections apply.
        let p = platforms(&[
            Rect::new(10.0, -20.0, 5.0, 40.0),
            Rect::new(-50.0, 10.0, 60.0, 5.0),
        ]);
        let r = step(&p, Rect::new(5.0, 6.0, 2.0, 2.0), Vec2::new(10.0, 10.0));
        assert_eq!(r.rect, Rect::new(8.0, 8.0, 2.0, 2.0));
        assert!(r.grounded);
        assert_eq!(r.velocity, Vec2::ZERO);
    }

    // ── Depenetration ──

    #[test]
    fn embedded_actor_is_pushed_out_the_short_way() {
        let p = platforms(&[Rect::new(0.0, 10.0, 100.0, 10.0)]);
        let r = step(&p, Rect::new(50.0, 9.0, 2.0, 2.0), Vec2::ZERO);
        assert_eq!(r.rect, Rect::new(50.0, 8.0, 2.0, 2.0));
        assert!(r.grounded);
    }

    // ── Properties ──

    /// Deterministic LCG so the sweep below is reproducible.
    struct Lcg(u32);

    impl Lcg {
        fn next(&mut self, lo: f32, hi: f32) -> f32 {
            self.0 = self.0.wrapping_mul(1103515245).wrapping_add(12345);
            lo + (self.0 >> 8) as f32 / (1u32 << 24) as f32 * (hi - lo)
        }
    }

    #[test]
    fn resolved_rect_never_penetrates() {
        let mut rng = Lcg(12345);
        for _ in 0..200 {
            let rects: Vec<Rect> = (0..6)
                .map(|_| Rect::new(rng.next(-50.0, 50.0), rng.next(-50.0, 50.0), rng.next(0.5, 30.0), rng.next(0.5, 30.0)))
                .collect();
            let p = platforms(&rects);
            let actor = loop {
                let a = Rect::new(rng.next(-60.0, 60.0), rng.next(-60.0, 60.0), rng.next(0.5, 5.0), rng.next(0.5, 5.0));
                if !rects.iter().any(|r| r.overlaps(&a)) {
                    break a;
                }
            };
            let v = Vec2::new(rng.next(-80.0, 80.0), rng.next(-80.0, 80.0));
            let r = step(&p, actor, v);
            for plat in &rects {
                let inset = Rect::new(plat.x + 1e-3, plat.y + 1e-3, plat.w - 2e-3, plat.h - 2e-3);
                assert!(!r.rect.overlaps(&inset), "{actor:?} + {v:?} -> {:?} hits {plat:?}", r.rect);
            }
        }
    }

    #[test]
    fn grounded_only_when_landing_from_above() {
        let plat = Rect::new(-10.0, 0.0, 20.0, 2.0);
        let p = platforms(&[plat]);
        for speed in [0.5_f32, 3.0, 50.0] {
            let down = step(&p, Rect::new(0.0, -1.0, 1.0, 1.0), Vec2::new(0.0, speed));
            assert!(down.grounded, "falling at {speed}");
            let up = step(&p, Rect::new(0.0, 2.0, 1.0, 1.0), Vec2::new(0.0, -speed));
            assert!(!up.grounded, "rising at {speed}");
        }
    }

    // ── Parsing / drawing ──

    #[test]
    fn parses_platform_section() {
        let p = Platforms::from_reader("2\n0 0 10 1 808080\n-5 20 3 3 ffffff # ledge\n".as_bytes()).unwrap();
        assert_eq!(p.len(), 2);
        let second = p.iter().nth(1).unwrap();
        assert_eq!(second.rect, Rect::new(-5.0, 20.0, 3.0, 3.0));
        assert_eq!(second.color, Rgba::WHITE);
    }

    #[test]
    fn negative_platform_size_is_malformed() {
        let err = Platforms::from_reader("1\n0 0 -10 1 808080\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedLevelData { line: 2, .. }));
    }

    #[test]
    fn renders_visible_platforms_only() {
        use crate::domain::draw::testing::{Call, RecordingRenderer};
        let cam = Camera::new(Vec2::ZERO);
        let p = platforms(&[Rect::new(-10.0, 0.0, 20.0, 5.0), Rect::new(5000.0, 0.0, 20.0, 5.0)]);
        let mut r = RecordingRenderer::new(800.0, 600.0);
        p.render(&mut r, &cam).unwrap();
        assert_eq!(r.primitives().len(), 1);
        assert!(matches!(r.primitives()[0], Call::FillRect(_)));
        assert_eq!(r.colors(), vec![GRAY]);
    }
}
