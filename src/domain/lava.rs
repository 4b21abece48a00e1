/// Lava: a fixed layout of hazard shapes that pulse over time and kill the
/// player on contact.
///
/// ## Animation
///
/// Each hazard carries a phase accumulator in milliseconds, wrapped modulo
/// the field's period. The phase drives two effects:
///   - a breathing pulse of the fill color (all shapes)
///   - a travelling wave along the top surface (rectangles only)
///
/// ## Overlap
///
/// `overlaps_rect` tests against each hazard's bounding rectangle. Touching
/// edges do not count. Triangles use their bounding box, which errs on the
/// side of killing the player near a slope.

use std::f32::consts::TAU;
use std::io::Read;

use crate::domain::camera::Camera;
use crate::domain::draw::Renderer;
use crate::domain::geometry::{Rect, Rgba, Triangle};
use crate::domain::records::{self, TokenReader};
use crate::error::{Error, Result};

pub const DEFAULT_PERIOD_MS: u32 = 1000;

/// How far toward white the pulse brightens at its peak.
const PULSE_AMPLITUDE: f32 = 0.35;
/// Surface wave: column count and crest height (world units).
const WAVE_COLUMNS: usize = 12;
const WAVE_HEIGHT: f32 = 8.0;
const CREST_LIFT: f32 = 0.4;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum HazardShape {
    Rect(Rect),
    Triangle(Triangle),
}

impl HazardShape {
    pub fn bounds(&self) -> Rect {
        match self {
            HazardShape::Rect(r) => *r,
            HazardShape::Triangle(t) => t.bounding_rect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Hazard {
    pub shape: HazardShape,
    pub color: Rgba,
    phase_ms: u32,
}

impl Hazard {
    pub fn new(shape: HazardShape, color: Rgba) -> Self {
        Hazard { shape, color, phase_ms: 0 }
    }

    #[allow(dead_code)]
    pub fn phase_ms(&self) -> u32 {
        self.phase_ms
    }
}

#[derive(Clone, Debug)]
pub struct LavaField {
    hazards: Vec<Hazard>,
    period_ms: u32,
}

impl LavaField {
    pub fn new(hazards: Vec<Hazard>) -> Self {
        LavaField { hazards, period_ms: DEFAULT_PERIOD_MS }
    }

    /// Pulse period. Zero is bumped to 1 ms so the phase can always wrap.
    pub fn with_period(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms.max(1);
        for h in &mut self.hazards {
            h.phase_ms %= self.period_ms;
        }
        self
    }

    /// Parse a stream containing only a hazard section.
    #[allow(dead_code)]
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut tokens = TokenReader::from_reader(reader)?;
        let field = Self::from_records(&mut tokens)?;
        tokens.finish()?;
        Ok(field)
    }

    /// Hazard section:
    /// ```text
    /// <count>
    /// rect <x> <y> <w> <h> <color>
    /// tri <x1> <y1> <x2> <y2> <x3> <y3> <color>
    /// ```
    pub fn from_records(tokens: &mut TokenReader) -> Result<Self> {
        let n = tokens.count("hazard count")?;
        let mut hazards = records::reserve(n, "hazards")?;
        for _ in 0..n {
            let (line, kind) = tokens.next_token("hazard kind")?;
            let kind = kind.to_string();
            let shape = match kind.as_str() {
                "rect" => HazardShape::Rect(tokens.rect("hazard rect")?),
                "tri" => HazardShape::Triangle(Triangle::new(
                    tokens.vec2("hazard vertex")?,
                    tokens.vec2("hazard vertex")?,
                    tokens.vec2("hazard vertex")?,
                )),
                other => {
                    return Err(Error::malformed(line, format!("unknown hazard kind `{other}`, expected `rect` or `tri`")));
                }
            };
            let color = tokens.color("hazard color")?;
            hazards.push(Hazard::new(shape, color));
        }
        Ok(LavaField::new(hazards))
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    #[allow(dead_code)]
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Advance every phase accumulator, wrapping at the period.
    pub fn update(&mut self, delta_ms: u32) {
        let period = self.period_ms as u64;
        for h in &mut self.hazards {
            h.phase_ms = ((h.phase_ms as u64 + delta_ms as u64) % period) as u32;
        }
    }

    /// Does `rect` intersect the bounds of any hazard?
    pub fn overlaps_rect(&self, rect: Rect) -> bool {
        self.hazards.iter().any(|h| h.shape.bounds().overlaps(&rect))
    }

    pub fn render(&self, renderer: &mut dyn Renderer, camera: &Camera) -> Result<()> {
        let visible = camera.visible_world_rect(renderer.viewport_size()?);
        for h in &self.hazards {
            if !h.shape.bounds().overlaps(&visible) {
                continue;
            }
            let t = h.phase_ms as f32 / self.period_ms as f32;
            let body = h.color.brighten(pulse(t) * PULSE_AMPLITUDE);
            match h.shape {
                HazardShape::Rect(r) => {
                    camera.fill_rect(renderer, r, body)?;
                    render_surface(renderer, camera, r, t, body.brighten(CREST_LIFT))?;
                }
                HazardShape::Triangle(tri) => camera.fill_triangle(renderer, tri, body)?,
            }
        }
        Ok(())
    }
}

/// Breathing curve: 0 at phase 0, 1 at half period.
fn pulse(t: f32) -> f32 {
    0.5 * (1.0 - (TAU * t).cos())
}

/// Crest columns along the top of a rectangle, heights following a sine
/// wave that travels one column-span per period.
fn render_surface(renderer: &mut dyn Renderer, camera: &Camera, r: Rect, t: f32, color: Rgba) -> Result<()> {
    let band = WAVE_HEIGHT.min(r.h);
    if band <= 0.0 || r.w <= 0.0 {
        return Ok(());
    }
    let col_w = r.w / WAVE_COLUMNS as f32;
    for i in 0..WAVE_COLUMNS {
        let s = (TAU * (t + i as f32 / WAVE_COLUMNS as f32)).sin();
        let height = band * 0.5 * (1.0 + s);
        if height <= 0.0 {
            continue;
        }
        let col = Rect::new(r.x + i as f32 * col_w, r.y, col_w, height);
        camera.fill_rect(renderer, col, color)?;
    }
    Ok(())
}
