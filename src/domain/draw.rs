/// Renderer contract: the drawing capability handed to every render call.
///
/// The core never owns a renderer. Each draw operation receives one as
/// `&mut dyn Renderer`, so the terminal backend and the recording test
/// double are interchangeable. All coordinates passed here are screen space.

use crate::domain::geometry::{Rect, Rgba, Triangle, Vec2};
use crate::error::RenderError;

pub trait Renderer {
    /// Color used by the next primitive(s).
    fn set_draw_color(&mut self, color: Rgba) -> Result<(), RenderError>;
    fn fill_rect(&mut self, rect: Rect) -> Result<(), RenderError>;
    fn draw_rect(&mut self, rect: Rect) -> Result<(), RenderError>;
    fn fill_triangle(&mut self, t: Triangle) -> Result<(), RenderError>;
    fn draw_triangle(&mut self, t: Triangle) -> Result<(), RenderError>;
    /// Current viewport size in pixels, queried fresh on every draw call.
    fn viewport_size(&self) -> Result<Vec2, RenderError>;
}
