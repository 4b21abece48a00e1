/// Geometry primitives shared by every layer: points/vectors, rectangles,
/// triangles and RGBA colors.
///
/// These are plain `Copy` values. Whether a `Rect` is in world or screen
/// space is decided by who holds it; only the camera converts between them.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

// ══════════════════════════════════════════════════════════════
// Vec2
// ══════════════════════════════════════════════════════════════

/// A point or a vector. Y grows downward, same as screen space.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Element-wise product.
    #[inline]
    pub fn entry_mul(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x * other.x, self.y * other.y)
    }

    /// Element-wise quotient.
    #[inline]
    pub fn entry_div(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x / other.x, self.y / other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

// ══════════════════════════════════════════════════════════════
// Rect
// ══════════════════════════════════════════════════════════════

/// Axis-aligned rectangle: origin at the top-left corner, `w, h >= 0`.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn from_vecs(origin: Vec2, size: Vec2) -> Self {
        Rect::new(origin.x, origin.y, size.x, size.y)
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn translated(&self, d: Vec2) -> Rect {
        Rect::new(self.x + d.x, self.y + d.y, self.w, self.h)
    }

    /// Zero (or negative) area: ignored by collision.
    pub fn is_degenerate(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }

    /// Do the x-extents overlap with positive length? Touching edges do not count.
    #[inline]
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right()
    }

    /// Do the y-extents overlap with positive length? Touching edges do not count.
    #[inline]
    pub fn overlaps_y(&self, other: &Rect) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }

    /// Positive-area intersection.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }
}

// ══════════════════════════════════════════════════════════════
// Triangle
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Triangle {
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl Triangle {
    pub const fn new(p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Triangle { p1, p2, p3 }
    }

    pub fn map(&self, f: impl Fn(Vec2) -> Vec2) -> Triangle {
        Triangle::new(f(self.p1), f(self.p2), f(self.p3))
    }

    pub fn bounding_rect(&self) -> Rect {
        let min_x = self.p1.x.min(self.p2.x).min(self.p3.x);
        let min_y = self.p1.y.min(self.p2.y).min(self.p3.y);
        let max_x = self.p1.x.max(self.p2.x).max(self.p3.x);
        let max_y = self.p1.y.max(self.p2.y).max(self.p3.y);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

// ══════════════════════════════════════════════════════════════
// Rgba
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// Parse `RRGGBB` or `RRGGBBAA` (an optional leading `#` is accepted).
    pub fn from_hex(s: &str) -> Option<Rgba> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() || (s.len() != 6 && s.len() != 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        let a = if s.len() == 8 { channel(6)? } else { 255 };
        Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Luminance-weighted gray (Rec. 601). Alpha is kept.
    pub fn desaturate(self) -> Rgba {
        let l = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        let l = l.round().clamp(0.0, 255.0) as u8;
        Rgba::new(l, l, l, self.a)
    }

    /// Blend toward white by `t` in `[0, 1]`. Alpha is kept.
    pub fn brighten(self, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let up = |c: u8| (c as f32 + (255.0 - c as f32) * t).round() as u8;
        Rgba::new(up(self.r), up(self.g), up(self.b), self.a)
    }

    /// Scale RGB toward black by `t` in `[0, 1]`. Alpha is kept.
    pub fn darken(self, t: f32) -> Rgba {
        let k = 1.0 - t.clamp(0.0, 1.0);
        let down = |c: u8| (c as f32 * k).round() as u8;
        Rgba::new(down(self.r), down(self.g), down(self.b), self.a)
    }
}
