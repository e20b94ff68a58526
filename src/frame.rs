use std::io::{self, Write};

type Rgb = (u8, u8, u8);

/// Raster the show draws into each tick. One cell is one half-block
/// "pixel"; world coordinates are mapped onto cells by `cell_size`.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    cell_size: f32,
    background: Rgb,
    cells: Vec<[f32; 3]>,
    output_buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, cell_size: f32, background: Rgb) -> Self {
        let mut frame = Self {
            width,
            height,
            cell_size,
            background,
            cells: Vec::new(),
            output_buf: Vec::new(),
        };
        frame.resize(width, height);
        frame
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Width of the surface in world units.
    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.cell_size
    }

    /// Height of the surface in world units.
    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.cell_size
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![Self::to_linear(self.background); width * height];
        self.output_buf = Vec::with_capacity(width * height * 25);
    }

    pub fn clear(&mut self) {
        let bg = Self::to_linear(self.background);
        self.cells.fill(bg);
    }

    /// Source-over blends a filled disc centred at world `(x, y)`.
    ///
    /// Cells whose centre falls inside the disc are painted, and the cell
    /// under the centre always is, so sub-cell sparks stay visible.
    pub fn fill_disc(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 || !x.is_finite() || !y.is_finite() {
            return;
        }

        let cx = x / self.cell_size;
        let cy = y / self.cell_size;
        let r = radius.max(0.0) / self.cell_size;

        let min_x = (cx - r).floor().max(0.0);
        let max_x = (cx + r).floor().min(self.width as f32 - 1.0);
        let min_y = (cy - r).floor().max(0.0);
        let max_y = (cy + r).floor().min(self.height as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let center = (cx.floor(), cy.floor());
        let src = Self::to_linear(color);

        for row in min_y as usize..=max_y as usize {
            for col in min_x as usize..=max_x as usize {
                let dx = col as f32 + 0.5 - cx;
                let dy = row as f32 + 0.5 - cy;
                let inside = dx * dx + dy * dy <= r * r;
                if !inside && (col as f32, row as f32) != center {
                    continue;
                }

                let cell = &mut self.cells[row * self.width + col];
                for (dst, src) in cell.iter_mut().zip(src) {
                    *dst = *dst * (1.0 - alpha) + src * alpha;
                }
            }
        }
    }

    /// Colour of the cell at `(col, row)`, if on the surface.
    pub fn pixel(&self, col: usize, row: usize) -> Option<Rgb> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let [r, g, b] = self.cells[row * self.width + col];
        Some((r as u8, g as u8, b as u8))
    }

    /// Writes the frame as rows of half blocks: background carries the top
    /// cell, foreground the bottom one.
    pub fn present(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top: Rgb = (255, 255, 255);
        let mut prev_bot: Rgb = (255, 255, 255);
        // Force the first colour codes of every row
        let mut fresh_row = true;

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top = self.pixel(x, y).unwrap_or(self.background);
                let bot = self.pixel(x, y + 1).unwrap_or(self.background);

                if fresh_row || top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if fresh_row || bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                fresh_row = false;
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            fresh_row = true;
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()
    }

    fn to_linear(color: Rgb) -> [f32; 3] {
        [color.0 as f32, color.1 as f32, color.2 as f32]
    }
}
