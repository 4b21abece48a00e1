/// Viewport camera: maps world space to screen pixels at a fixed 16:9 aspect.
///
/// ## Transform
///
/// For a viewport of `w × h` pixels:
///   1. effective ratio — the largest 16:9 box that fits along the
///      constraining axis: `(16, h / (w/16))` if `w/16 > h/9`,
///      else `(w / (h/9), 9)`
///   2. effective scale — `(w, h) / (ratio * 50)`; 50 world units per ratio unit
///   3. point — `(p - focal) * scale + (w/2, h/2)`
///
/// Rects transform their origin as a point and scale their size. Triangles
/// transform each vertex. The scale is derived from the viewport on every
/// call and never cached.
///
/// ## Render modes
///
/// `debug` turns every fill into an outline, `monochrome` draws every color
/// desaturated. Both are resolved in `resolve_style`, nowhere else.

use crate::domain::draw::Renderer;
use crate::domain::geometry::{Rect, Rgba, Triangle, Vec2};
use crate::error::Result;

const RATIO_X: f32 = 16.0;
const RATIO_Y: f32 = 9.0;
/// World units per ratio unit.
const UNITS_PER_RATIO: f32 = 50.0;

/// Small bitset of toggleable rendering modes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RenderModes(u8);

impl RenderModes {
    pub const DEBUG: RenderModes = RenderModes(1 << 0);
    pub const MONOCHROME: RenderModes = RenderModes(1 << 1);

    pub fn contains(self, other: RenderModes) -> bool {
        self.0 & other.0 == other.0
    }

    fn toggle(&mut self, other: RenderModes) {
        self.0 ^= other.0;
    }
}

/// Which primitive a draw request ends up as.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stroke {
    Fill,
    Outline,
}

#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec2,
    modes: RenderModes,
}

impl Camera {
    pub fn new(position: Vec2) -> Self {
        Camera { position, modes: RenderModes::default() }
    }

    #[allow(dead_code)]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Replace the focal point. Takes effect on the next draw call.
    pub fn center_at(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn toggle_debug_mode(&mut self) {
        self.modes.toggle(RenderModes::DEBUG);
    }

    pub fn toggle_monochrome_mode(&mut self) {
        self.modes.toggle(RenderModes::MONOCHROME);
    }

    pub fn is_debug(&self) -> bool {
        self.modes.contains(RenderModes::DEBUG)
    }

    pub fn is_monochrome(&self) -> bool {
        self.modes.contains(RenderModes::MONOCHROME)
    }

    // ── Draw operations ──

    pub fn fill_rect(&self, renderer: &mut dyn Renderer, rect: Rect, color: Rgba) -> Result<()> {
        self.rect(renderer, rect, color, Stroke::Fill)
    }

    #[allow(dead_code)]
    pub fn draw_rect(&self, renderer: &mut dyn Renderer, rect: Rect, color: Rgba) -> Result<()> {
        self.rect(renderer, rect, color, Stroke::Outline)
    }

    pub fn fill_triangle(&self, renderer: &mut dyn Renderer, t: Triangle, color: Rgba) -> Result<()> {
        self.triangle(renderer, t, color, Stroke::Fill)
    }

    #[allow(dead_code)]
    pub fn draw_triangle(&self, renderer: &mut dyn Renderer, t: Triangle, color: Rgba) -> Result<()> {
        self.triangle(renderer, t, color, Stroke::Outline)
    }

    fn rect(&self, renderer: &mut dyn Renderer, rect: Rect, color: Rgba, wanted: Stroke) -> Result<()> {
        let viewport = renderer.viewport_size()?;
        if !has_area(viewport) {
            return Ok(());
        }
        let screen = self.project_rect(viewport, rect);
        let (stroke, color) = self.resolve_style(wanted, color);
        renderer.set_draw_color(color)?;
        match stroke {
            Stroke::Fill => renderer.fill_rect(screen)?,
            Stroke::Outline => renderer.draw_rect(screen)?,
        }
        Ok(())
    }

    fn triangle(&self, renderer: &mut dyn Renderer, t: Triangle, color: Rgba, wanted: Stroke) -> Result<()> {
        let viewport = renderer.viewport_size()?;
        if !has_area(viewport) {
            return Ok(());
        }
        let screen = self.project_triangle(viewport, t);
        let (stroke, color) = self.resolve_style(wanted, color);
        renderer.set_draw_color(color)?;
        match stroke {
            Stroke::Fill => renderer.fill_triangle(screen)?,
            Stroke::Outline => renderer.draw_triangle(screen)?,
        }
        Ok(())
    }

    /// The single place render modes affect drawing.
    fn resolve_style(&self, wanted: Stroke, color: Rgba) -> (Stroke, Rgba) {
        let stroke = if self.is_debug() { Stroke::Outline } else { wanted };
        let color = if self.is_monochrome() { color.desaturate() } else { color };
        (stroke, color)
    }

    // ── Transform ──

    pub fn project_point(&self, viewport: Vec2, p: Vec2) -> Vec2 {
        (p - self.position).entry_mul(effective_scale(viewport)) + viewport * 0.5
    }

    /// Inverse of `project_point`.
    pub fn unproject_point(&self, viewport: Vec2, screen: Vec2) -> Vec2 {
        (screen - viewport * 0.5).entry_div(effective_scale(viewport)) + self.position
    }

    pub fn project_rect(&self, viewport: Vec2, rect: Rect) -> Rect {
        Rect::from_vecs(
            self.project_point(viewport, rect.origin()),
            effective_scale(viewport).entry_mul(rect.size()),
        )
    }

    pub fn project_triangle(&self, viewport: Vec2, t: Triangle) -> Triangle {
        t.map(|p| self.project_point(viewport, p))
    }

    /// World-space rectangle covered by the viewport.
    pub fn visible_world_rect(&self, viewport: Vec2) -> Rect {
        let top_left = self.unproject_point(viewport, Vec2::ZERO);
        let size = viewport.entry_div(effective_scale(viewport));
        Rect::from_vecs(top_left, size)
    }
}

fn has_area(viewport: Vec2) -> bool {
    viewport.x > 0.0 && viewport.y > 0.0
}

pub fn effective_ratio(viewport: Vec2) -> Vec2 {
    let (w, h) = (viewport.x, viewport.y);
    if w / RATIO_X > h / RATIO_Y {
        Vec2::new(RATIO_X, h / (w / RATIO_X))
    } else {
        Vec2::new(w / (h / RATIO_Y), RATIO_Y)
    }
}

pub fn effective_scale(viewport: Vec2) -> Vec2 {
    viewport.entry_div(effective_ratio(viewport) * UNITS_PER_RATIO)
}
