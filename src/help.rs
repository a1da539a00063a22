use crate::terminal::Terminal;
use crossterm::style::Color;

/// Keybinding summary shown by the `h` overlay
pub const HELP: &str = "\
RINGVIZ
─────────────
Space  Pause
h      Toggle help
q/Esc  Quit";

const BORDER: Color = Color::White;
const TEXT: Color = Color::Grey;
const PANEL: Color = Color::Black;

/// Render a centered box with the provided text over the current buffer
pub fn render_overlay(term: &mut Terminal, text: &str) {
    if text.is_empty() {
        return;
    }
    let (width, height) = term.size();

    let lines: Vec<&str> = text.lines().collect();
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4;
    let box_height = lines.len() + 2;

    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;
    let bottom_y = start_y + box_height - 1;

    let set = |term: &mut Terminal, x: usize, y: usize, ch: char, fg: Color| {
        term.set(x as i32, y as i32, ch, Some(fg), Some(PANEL));
    };

    set(term, start_x, start_y, '┌', BORDER);
    set(term, start_x + box_width - 1, start_y, '┐', BORDER);
    set(term, start_x, bottom_y, '└', BORDER);
    set(term, start_x + box_width - 1, bottom_y, '┘', BORDER);
    for x in 1..box_width - 1 {
        set(term, start_x + x, start_y, '─', BORDER);
        set(term, start_x + x, bottom_y, '─', BORDER);
    }

    for (i, line) in lines.iter().enumerate() {
        let y = start_y + 1 + i;
        set(term, start_x, y, '│', BORDER);
        let padding = max_width.saturating_sub(line.chars().count());
        let padded = format!(" {}{} ", line, " ".repeat(padding));
        for (j, ch) in padded.chars().enumerate() {
            set(term, start_x + 1 + j, y, ch, TEXT);
        }
        set(term, start_x + box_width - 1, y, '│', BORDER);
    }
}

/// Single-line message centered near the top, used for the audio resume prompt
pub fn render_banner(term: &mut Terminal, text: &str) {
    let (width, _) = term.size();
    let x = (width as usize).saturating_sub(text.chars().count() + 2) / 2;
    term.set_str(x as i32, 1, &format!(" {} ", text), Some(Color::Black), Some(Color::White));
}
