//! Hex color parsing, HSL hue rotation, and the cycling bar color.

use crate::config::constants::{COLOR_PERIOD, HUE_STEP};

/// An opaque 8-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Expand `#rgb` / `rgb` into `rrggbb` and drop the leading `#`.
fn expand_hex(hex: &str) -> String {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    }
}

/// Parse a hex color. Only the leading run of hex digits counts, so
/// malformed input degrades to a (possibly black) color instead of failing.
pub fn parse_hex(hex: &str) -> Rgb {
    let value = expand_hex(hex)
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0u32, |acc, d| acc.wrapping_mul(16).wrapping_add(d));
    Rgb {
        r: ((value >> 16) & 255) as u8,
        g: ((value >> 8) & 255) as u8,
        b: (value & 255) as u8,
    }
}

/// RGB (0.0-1.0) to HSL with hue in degrees
fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h * 60.0, s, l)
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let t = h / 360.0;
    let to_byte = |x: f64| (x * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: to_byte(hue_to_channel(p, q, t + 1.0 / 3.0)),
        g: to_byte(hue_to_channel(p, q, t)),
        b: to_byte(hue_to_channel(p, q, t - 1.0 / 3.0)),
    }
}

/// Advance the HSL hue of `hex` by `deg` degrees, keeping saturation and
/// lightness. Always returns a 6-digit lower-case `#rrggbb` string.
pub fn rotate_hex_hue(hex: &str, deg: f64) -> String {
    let rgb = parse_hex(hex);
    let (h, s, l) = rgb_to_hsl(
        rgb.r as f64 / 255.0,
        rgb.g as f64 / 255.0,
        rgb.b as f64 / 255.0,
    );

    let mut hue = (h + deg) % 360.0;
    if hue < 0.0 {
        hue += 360.0;
    }

    hsl_to_rgb(hue, s, l).to_hex()
}

/// The bar color and its countdown to the next hue step
#[derive(Clone, Debug, PartialEq)]
pub struct ColorState {
    pub hex: String,
    pub timer: u32,
    period: u32,
    step: f64,
}

impl ColorState {
    /// Starts with an expired timer, so the first tick rotates.
    pub fn new(hex: &str) -> Self {
        Self::with_schedule(hex, COLOR_PERIOD, HUE_STEP)
    }

    pub fn with_schedule(hex: &str, period: u32, step: f64) -> Self {
        Self {
            hex: hex.to_string(),
            timer: 0,
            period: period.max(1),
            step,
        }
    }

    /// One frame: count down, and on reaching zero rotate the hue and
    /// restart the countdown. Returns true when the color changed.
    pub fn tick(&mut self) -> bool {
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return false;
        }
        self.hex = rotate_hex_hue(&self.hex, self.step);
        self.timer = self.period;
        true
    }

    pub fn rgb(&self) -> Rgb {
        parse_hex(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [&str; 7] = [
        "#009dff", "#ff0000", "#123456", "#abcdef", "#00ff00", "#336699", "#808080",
    ];

    fn channel_distance(a: &str, b: &str) -> u8 {
        let (a, b) = (parse_hex(a), parse_hex(b));
        a.r.abs_diff(b.r).max(a.g.abs_diff(b.g)).max(a.b.abs_diff(b.b))
    }

    #[test]
    fn parse_full_and_short_forms() {
        assert_eq!(parse_hex("#009dff"), Rgb::new(0x00, 0x9d, 0xff));
        assert_eq!(parse_hex("009DFF"), Rgb::new(0x00, 0x9d, 0xff));
        assert_eq!(parse_hex("#abc"), Rgb::new(0xaa, 0xbb, 0xcc));
        assert_eq!(parse_hex("fff"), Rgb::WHITE);
    }

    #[test]
    fn malformed_input_does_not_panic() {
        assert_eq!(parse_hex("zz"), Rgb::BLACK);
        assert_eq!(parse_hex(""), Rgb::BLACK);
        // leading digits only: 0x12
        assert_eq!(parse_hex("#12zz"), Rgb::new(0, 0, 0x12));
        assert_eq!(rotate_hex_hue("not a color", 15.0), "#000000");
        assert_eq!(rotate_hex_hue("#12", 10.0).len(), 7);
    }

    #[test]
    fn zero_rotation_is_identity() {
        for hex in SAMPLES {
            assert_eq!(rotate_hex_hue(hex, 0.0), hex);
        }
        assert_eq!(rotate_hex_hue("#abc", 0.0), "#aabbcc");
    }

    #[test]
    fn full_turn_returns_original() {
        for hex in SAMPLES {
            assert_eq!(rotate_hex_hue(hex, 360.0), hex);
            for (steps, deg) in [(2, 180.0), (3, 120.0), (6, 60.0)] {
                let mut color = hex.to_string();
                for _ in 0..steps {
                    color = rotate_hex_hue(&color, deg);
                }
                assert!(
                    channel_distance(&color, hex) <= 1,
                    "{} via {}x{} gave {}",
                    hex, steps, deg, color
                );
            }
        }
    }

    #[test]
    fn primaries_rotate_around_the_wheel() {
        assert_eq!(rotate_hex_hue("#ff0000", 120.0), "#00ff00");
        assert_eq!(rotate_hex_hue("#00ff00", 120.0), "#0000ff");
        assert_eq!(rotate_hex_hue("#ff0000", -120.0), "#0000ff");
    }

    #[test]
    fn grey_has_no_hue_to_rotate() {
        assert_eq!(rotate_hex_hue("#808080", 45.0), "#808080");
        assert_eq!(rotate_hex_hue("#ffffff", 200.0), "#ffffff");
    }

    #[test]
    fn one_degree_step_from_start_color() {
        assert_eq!(rotate_hex_hue("#009dff", 1.0), "#0099ff");
    }

    #[test]
    fn color_state_schedule() {
        let mut state = ColorState::new("#009dff");
        assert_eq!(state.timer, 0);

        assert!(state.tick());
        let first = rotate_hex_hue("#009dff", 1.0);
        assert_eq!(state.hex, first);
        assert_eq!(state.timer, 6);

        for _ in 0..5 {
            assert!(!state.tick());
            assert_eq!(state.hex, first);
        }
        assert!(state.tick());
        assert_eq!(state.hex, rotate_hex_hue(&first, 1.0));
        assert_eq!(state.timer, 6);
    }

    #[test]
    fn color_state_exposes_rgb() {
        let state = ColorState::new("#336699");
        assert_eq!(state.rgb(), Rgb::new(0x33, 0x66, 0x99));
    }
}
