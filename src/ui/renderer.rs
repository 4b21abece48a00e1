/// Presentation layer: half-block pixel canvas over a diff-based terminal.
///
/// How it works:
///   1. Game primitives are rasterized into a `Canvas` of RGB pixels
///   2. Each terminal cell shows two stacked pixels as `▀`
///      (foreground = upper pixel, background = lower pixel)
///   3. The composed cells are compared with the previous frame and only
///      changed cells are emitted, batched with `queue!` and flushed once
///   4. Swap front/back
///
/// The bottom terminal row is a text status bar, not part of the canvas.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::draw::Renderer;
use crate::domain::geometry::{Rect, Rgba, Triangle, Vec2};
use crate::error::RenderError;

const BASE_BG: Rgba = Rgba::new(22, 22, 35, 255);
const STATUS_FG: Color = Color::Rgb { r: 200, g: 200, b: 210 };
const UPPER_HALF: char = '▀';
/// Rows reserved below the canvas.
const STATUS_ROWS: usize = 1;

// ══════════════════════════════════════════════════════════════
// Canvas: RGB pixels + rasterizer
// ══════════════════════════════════════════════════════════════

pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
    color: Rgba,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, pixels: vec![BASE_BG; width * height], color: Rgba::WHITE }
    }

    fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![BASE_BG; width * height];
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(BASE_BG);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            BASE_BG
        }
    }

    /// Source-over blend of the current draw color.
    fn plot(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = y as usize * self.width + x as usize;
        self.pixels[i] = blend(self.pixels[i], self.color);
    }

    /// Pixels whose centers fall inside `[lo, hi)`, clipped to `[0, max)`.
    fn span(lo: f32, hi: f32, max: usize) -> (i64, i64) {
        let a = (lo - 0.5).ceil().clamp(0.0, max as f32) as i64;
        let b = (hi - 0.5).ceil().clamp(0.0, max as f32) as i64;
        (a, b)
    }

    fn fill_area(&mut self, rect: Rect) {
        let (x0, x1) = Self::span(rect.x, rect.right(), self.width);
        let (y0, y1) = Self::span(rect.y, rect.bottom(), self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.plot(x, y);
            }
        }
    }

    /// One-pixel border of the pixels `fill_area` would cover. Edges outside
    /// the canvas are not drawn.
    fn outline_area(&mut self, rect: Rect) {
        let (x0, x1) = Self::unclipped_span(rect.x, rect.right());
        let (y0, y1) = Self::unclipped_span(rect.y, rect.bottom());
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let (w, h) = (self.width as i64, self.height as i64);
        for x in x0.max(0)..x1.min(w) {
            self.plot(x, y0);
            if y1 - 1 != y0 {
                self.plot(x, y1 - 1);
            }
        }
        for y in (y0 + 1).max(0)..(y1 - 1).min(h) {
            self.plot(x0, y);
            if x1 - 1 != x0 {
                self.plot(x1 - 1, y);
            }
        }
    }

    fn unclipped_span(lo: f32, hi: f32) -> (i64, i64) {
        // Keep far-off edges from overflowing the loop bounds.
        const LIMIT: f32 = 1.0e6;
        let a = (lo - 0.5).ceil().clamp(-LIMIT, LIMIT) as i64;
        let b = (hi - 0.5).ceil().clamp(-LIMIT, LIMIT) as i64;
        (a, b)
    }

    /// Edge-function fill over the triangle's clipped bounding box.
    /// Winding does not matter; zero-area triangles draw nothing.
    fn fill_tri(&mut self, t: Triangle) {
        let area = edge(t.p1, t.p2, t.p3);
        if area == 0.0 {
            return;
        }
        let b = t.bounding_rect();
        let (x0, x1) = Self::span(b.x, b.right() + 1.0, self.width);
        let (y0, y1) = Self::span(b.y, b.bottom() + 1.0, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(t.p2, t.p3, p) * area.signum();
                let w1 = edge(t.p3, t.p1, p) * area.signum();
                let w2 = edge(t.p1, t.p2, p) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.plot(x, y);
                }
            }
        }
    }

    /// Bresenham from pixel to pixel.
    fn line(&mut self, a: Vec2, b: Vec2) {
        const LIMIT: f32 = 1.0e6;
        let to_px = |v: f32| v.floor().clamp(-LIMIT, LIMIT) as i64;
        let (mut x, mut y) = (to_px(a.x), to_px(a.y));
        let (x1, y1) = (to_px(b.x), to_px(b.y));
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn blend(dst: Rgba, src: Rgba) -> Rgba {
    if src.a == 255 {
        return Rgba { a: 255, ..src };
    }
    let a = src.a as f32 / 255.0;
    let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
    Rgba::new(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), 255)
}

fn check_rect(rect: &Rect, op: &'static str) -> Result<(), RenderError> {
    if rect.origin().is_finite() && rect.size().is_finite() {
        Ok(())
    } else {
        Err(RenderError::NonFinite(op))
    }
}

fn check_tri(t: &Triangle, op: &'static str) -> Result<(), RenderError> {
    if [t.p1, t.p2, t.p3].iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(RenderError::NonFinite(op))
    }
}

impl Renderer for Canvas {
    fn set_draw_color(&mut self, color: Rgba) -> Result<(), RenderError> {
        self.color = color;
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect) -> Result<(), RenderError> {
        check_rect(&rect, "fill_rect")?;
        self.fill_area(rect);
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect) -> Result<(), RenderError> {
        check_rect(&rect, "draw_rect")?;
        self.outline_area(rect);
        Ok(())
    }

    fn fill_triangle(&mut self, t: Triangle) -> Result<(), RenderError> {
        check_tri(&t, "fill_triangle")?;
        self.fill_tri(t);
        Ok(())
    }

    fn draw_triangle(&mut self, t: Triangle) -> Result<(), RenderError> {
        check_tri(&t, "draw_triangle")?;
        self.line(t.p1, t.p2);
        self.line(t.p2, t.p3);
        self.line(t.p3, t.p1);
        Ok(())
    }

    fn viewport_size(&self) -> Result<Vec2, RenderError> {
        Ok(Vec2::new(self.width as f32, self.height as f32))
    }
}

// ══════════════════════════════════════════════════════════════
// Terminal cells
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: to_color(BASE_BG) };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

const fn to_color(c: Rgba) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell { ch, fg, bg: Cell::BLANK.bg });
        }
    }
}

/// Fold pairs of canvas rows into half-block cells.
fn compose_canvas(canvas: &Canvas, buf: &mut FrameBuffer) {
    let rows = canvas.height.div_ceil(2);
    for row in 0..rows.min(buf.height) {
        for col in 0..canvas.width.min(buf.width) {
            let top = canvas.pixel(col, row * 2);
            let bottom = canvas.pixel(col, row * 2 + 1);
            let cell = if top == bottom && top == BASE_BG {
                Cell::BLANK
            } else {
                Cell { ch: UPPER_HALF, fg: to_color(top), bg: to_color(bottom) }
            };
            buf.set(col, row, cell);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// TerminalRenderer
// ══════════════════════════════════════════════════════════════

/// Owns the terminal for its lifetime: raw mode and the alternate screen
/// are entered in `new` and restored on drop.
pub struct TerminalRenderer {
    writer: BufWriter<io::Stdout>,
    canvas: Canvas,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    active: bool,
    keyboard_enhanced: bool,
}

impl TerminalRenderer {
    pub fn new() -> io::Result<Self> {
        let mut r = TerminalRenderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            canvas: Canvas::new(0, 0),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            active: false,
            keyboard_enhanced: false,
        };
        terminal::enable_raw_mode()?;
        r.active = true;
        execute!(
            r.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BLANK.bg),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(r.writer, PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES))?;
            r.keyboard_enhanced = true;
        }
        log::info!("terminal ready (key release events: {})", r.keyboard_enhanced);
        r.sync_size()?;
        Ok(r)
    }

    /// Whether the terminal reports key releases.
    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    /// Restore the terminal. Safe to call more than once.
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Start a frame: pick up terminal resizes and hand out a cleared canvas.
    pub fn begin_frame(&mut self) -> io::Result<&mut Canvas> {
        self.sync_size()?;
        self.canvas.clear();
        Ok(&mut self.canvas)
    }

    /// Compose the canvas and status text, then emit changed cells.
    pub fn present(&mut self, status: &str) -> io::Result<()> {
        self.front.cells.fill(Cell::BLANK);
        compose_canvas(&self.canvas, &mut self.front);
        if self.term_h > 0 {
            self.front.put_str(1, self.term_h - 1, status, STATUS_FG);
        }
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size()?;
        let (tw, th) = (tw as usize, th as usize);
        if tw == self.term_w && th == self.term_h {
            return Ok(());
        }
        log::debug!("terminal resized to {tw}x{th}");
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.canvas.resize(tw, th.saturating_sub(STATUS_ROWS) * 2);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BLANK.bg), Clear(ClearType::All))?;
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BLANK.bg;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            log::error!("terminal cleanup failed: {e}");
        }
    }
}
