use crate::canvas::Canvas;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

/// Half-block glyph: foreground paints the top pixel, background the bottom
const UPPER_HALF: char = '▀';

/// A single cell in the terminal buffer
#[derive(Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
        }
    }
}

/// Terminal abstraction for rendering
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
}

impl Terminal {
    /// Enter the alternate screen in raw mode; restored on drop
    pub fn new() -> io::Result<Self> {
        let (width, height) = size()?;

        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)?;

        Ok(Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
        })
    }

    /// Get terminal dimensions
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Canvas size that fills the screen: one pixel per column, two per row
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32 * 2)
    }

    /// Track a terminal resize; returns true if the size changed
    pub fn sync_size(&mut self) -> io::Result<bool> {
        let (width, height) = size()?;
        if width == self.width && height == self.height {
            return Ok(false);
        }
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(true)
    }

    /// Set a character at position with optional colors
    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bg: Option<Color>) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bg };
        }
    }

    /// Set a string starting at position
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bg: Option<Color>) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bg);
        }
    }

    /// Copy the canvas into the cell buffer, two pixel rows per cell
    pub fn blit(&mut self, canvas: &Canvas) {
        blit_halfblock(&mut self.buffer, canvas);
    }

    /// Write the whole buffer to the screen
    pub fn present(&self) -> io::Result<()> {
        let mut out = stdout().lock();

        for (y, row) in self.buffer.iter().enumerate() {
            queue!(out, MoveTo(0, y as u16))?;

            for cell in row {
                if let Some(bg) = cell.bg {
                    queue!(out, SetBackgroundColor(bg))?;
                }
                if let Some(fg) = cell.fg {
                    queue!(out, SetForegroundColor(fg))?;
                }
                queue!(out, Print(cell.ch))?;
                if cell.fg.is_some() || cell.bg.is_some() {
                    queue!(out, ResetColor)?;
                }
            }
        }

        out.flush()
    }

    /// Check for keypress (non-blocking), returns (code, modifiers)
    pub fn check_key(&self) -> io::Result<Option<(KeyCode, KeyModifiers)>> {
        if poll(Duration::from_millis(0))? {
            if let Event::Key(key_event) = read()? {
                if key_event.kind != KeyEventKind::Release {
                    return Ok(Some((key_event.code, key_event.modifiers)));
                }
            }
        }
        Ok(None)
    }

    /// Sleep for specified duration
    pub fn sleep(&self, seconds: f32) {
        if seconds > 0.0 {
            std::thread::sleep(Duration::from_secs_f32(seconds));
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(stdout(), ResetColor, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Helper to create RGB colors
pub fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

/// Fill `cells` from `canvas`; cell (x, y) shows pixels (x, 2y) over (x, 2y+1)
fn blit_halfblock(cells: &mut [Vec<Cell>], canvas: &Canvas) {
    for (cy, row) in cells.iter_mut().enumerate() {
        let top_y = cy as u32 * 2;
        if top_y >= canvas.height() {
            break;
        }
        let bottom_y = top_y + 1;

        for (cx, cell) in row.iter_mut().enumerate() {
            let cx = cx as u32;
            if cx >= canvas.width() {
                break;
            }
            let top = canvas.pixel(cx, top_y);
            let bottom = if bottom_y < canvas.height() {
                canvas.pixel(cx, bottom_y)
            } else {
                top
            };
            *cell = Cell {
                ch: UPPER_HALF,
                fg: Some(rgb(top.r, top.g, top.b)),
                bg: Some(rgb(bottom.r, bottom.g, bottom.b)),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn halfblock_pairs_pixel_rows() {
        let mut canvas = Canvas::new(2, 4);
        canvas.fill(Rgb::BLACK);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Rgb::WHITE, None);
        let mut cells = vec![vec![Cell::default(); 2]; 2];
        blit_halfblock(&mut cells, &canvas);

        assert_eq!(cells[0][0].ch, UPPER_HALF);
        assert_eq!(cells[0][0].fg, Some(rgb(255, 255, 255)));
        assert_eq!(cells[0][0].bg, Some(rgb(0, 0, 0)));
        assert_eq!(cells[1][1].fg, Some(rgb(0, 0, 0)));
    }

    #[test]
    fn halfblock_ignores_cells_past_canvas() {
        let canvas = Canvas::new(1, 1);
        let mut cells = vec![vec![Cell::default(); 3]; 3];
        blit_halfblock(&mut cells, &canvas);
        assert_eq!(cells[0][0].bg, cells[0][0].fg);
        assert!(cells[0][1] == Cell::default());
        assert!(cells[2][0] == Cell::default());
    }
}
