//! A small RGBA raster with a 2D transform stack, enough to paint the ring:
//! solid fills, rectangles and discs with a soft glow, and image blits.

use crate::color::Rgb;
use crate::config::constants::REFERENCE_EXTENT;
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Peak opacity of a glow right at the shape's edge
const GLOW_STRENGTH: f32 = 0.6;

/// Affine transform in canvas convention: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    fn translated(self, tx: f32, ty: f32) -> Self {
        Self {
            e: self.a * tx + self.c * ty + self.e,
            f: self.b * tx + self.d * ty + self.f,
            ..self
        }
    }

    fn rotated(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    fn inverse(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Soft halo drawn around a shape
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
    pub color: Rgb,
    pub blur: f32,
}

pub struct Canvas {
    image: RgbaImage,
    transform: Transform,
    saved: Vec<Transform>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 255])),
            transform: Transform::IDENTITY,
            saved: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width() as f32 / 2.0, self.height() as f32 / 2.0)
    }

    /// Pixels per design unit
    pub fn scale(&self) -> f32 {
        self.width().min(self.height()) as f32 / REFERENCE_EXTENT
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width.max(1) != self.width() || height.max(1) != self.height() {
            self.image = RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 255]));
        }
    }

    pub fn save(&mut self) {
        self.saved.push(self.transform);
    }

    pub fn restore(&mut self) {
        if let Some(t) = self.saved.pop() {
            self.transform = t;
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transform = self.transform.translated(x, y);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.transform = self.transform.rotated(radians);
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let p = self.image.get_pixel(x, y).0;
        Rgb::new(p[0], p[1], p[2])
    }

    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        self.image.save(path)
    }

    /// Fill the whole surface, ignoring the transform
    pub fn fill(&mut self, color: Rgb) {
        for p in self.image.pixels_mut() {
            *p = Rgba([color.r, color.g, color.b, 255]);
        }
    }

    /// Fill an axis-aligned rectangle given in current user space
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, glow: Option<Glow>) {
        let (x0, x1) = (x.min(x + w), x.max(x + w));
        let (y0, y1) = (y.min(y + h), y.max(y + h));
        let corners = [(x0, y0), (x1, y0), (x0, y1), (x1, y1)];
        self.paint_shape(&corners, color, glow, |lx, ly| {
            let dx = (x0 - lx).max(lx - x1).max(0.0);
            let dy = (y0 - ly).max(ly - y1).max(0.0);
            (dx * dx + dy * dy).sqrt()
        });
    }

    /// Fill a disc given in current user space
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, glow: Option<Glow>) {
        let r = radius.abs();
        let corners = [(cx - r, cy - r), (cx + r, cy - r), (cx - r, cy + r), (cx + r, cy + r)];
        self.paint_shape(&corners, color, glow, |lx, ly| {
            ((lx - cx).powi(2) + (ly - cy).powi(2)).sqrt() - r
        });
    }

    /// Alpha-blend `src` with its top-left corner at (x, y) in user space.
    /// The image is not rotated. A glow follows the image's opaque pixels.
    pub fn draw_image(&mut self, src: &RgbaImage, x: f32, y: f32, glow: Option<Glow>) {
        let (dx, dy) = self.transform.apply(x, y);
        let (ox, oy) = (dx.round() as i64, dy.round() as i64);
        if let Some(g) = glow {
            self.paint_image_glow(src, ox, oy, g);
        }
        for (sx, sy, p) in src.enumerate_pixels() {
            let tx = ox + sx as i64;
            let ty = oy + sy as i64;
            if tx < 0 || ty < 0 || tx >= self.width() as i64 || ty >= self.height() as i64 {
                continue;
            }
            let alpha = p.0[3] as f32 / 255.0;
            self.blend(tx as u32, ty as u32, Rgb::new(p.0[0], p.0[1], p.0[2]), alpha);
        }
    }

    /// Halo around the opaque (alpha >= 128) pixels of `src` placed at
    /// pixel offset (ox, oy). Distances run from the nearest opaque pixel's edge.
    fn paint_image_glow(&mut self, src: &RgbaImage, ox: i64, oy: i64, glow: Glow) {
        let blur = glow.blur.max(0.0);
        let reach = blur.ceil() as i64;
        if reach == 0 {
            return;
        }
        let (w, h) = (src.width() as i64, src.height() as i64);
        let opaque = |sx: i64, sy: i64| {
            sx >= 0 && sy >= 0 && sx < w && sy < h && src.get_pixel(sx as u32, sy as u32).0[3] >= 128
        };

        for sy in -reach..h + reach {
            let ty = oy + sy;
            if ty < 0 || ty >= self.height() as i64 {
                continue;
            }
            for sx in -reach..w + reach {
                let tx = ox + sx;
                if tx < 0 || tx >= self.width() as i64 || opaque(sx, sy) {
                    continue;
                }
                let mut nearest = f32::MAX;
                for ny in -reach..=reach {
                    for nx in -reach..=reach {
                        if opaque(sx + nx, sy + ny) {
                            nearest = nearest.min(((nx * nx + ny * ny) as f32).sqrt());
                        }
                    }
                }
                let d = nearest - 0.5;
                if d < blur {
                    let falloff = 1.0 - d / blur;
                    self.blend(tx as u32, ty as u32, glow.color, GLOW_STRENGTH * falloff * falloff);
                }
            }
        }
    }

    /// Rasterize a shape given its user-space bounding corners and a distance
    /// function (user units, <= 0 inside). Transforms here are rigid, so user
    /// distances equal pixel distances.
    fn paint_shape<F>(&mut self, corners: &[(f32, f32)], color: Rgb, glow: Option<Glow>, distance: F)
    where
        F: Fn(f32, f32) -> f32,
    {
        let inverse = match self.transform.inverse() {
            Some(inv) => inv,
            None => return,
        };
        let blur = glow.map(|g| g.blur.max(0.0)).unwrap_or(0.0);

        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for &(cx, cy) in corners {
            let (px, py) = self.transform.apply(cx, cy);
            min_x = min_x.min(px);
            min_y = min_y.min(py);
            max_x = max_x.max(px);
            max_y = max_y.max(py);
        }

        let x_start = (min_x - blur).floor().max(0.0) as u32;
        let y_start = (min_y - blur).floor().max(0.0) as u32;
        let x_end = ((max_x + blur).ceil().max(0.0) as u32).min(self.width());
        let y_end = ((max_y + blur).ceil().max(0.0) as u32).min(self.height());

        for py in y_start..y_end {
            for px in x_start..x_end {
                let (lx, ly) = inverse.apply(px as f32 + 0.5, py as f32 + 0.5);
                let d = distance(lx, ly);
                if d <= 0.0 {
                    self.blend(px, py, color, 1.0);
                } else if let Some(g) = glow {
                    if d < blur {
                        let falloff = 1.0 - d / blur;
                        self.blend(px, py, g.color, GLOW_STRENGTH * falloff * falloff);
                    }
                }
            }
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let dst = self.image.get_pixel_mut(x, y);
        let mix = |d: u8, s: u8| (d as f32 * (1.0 - alpha) + s as f32 * alpha).round() as u8;
        *dst = Rgba([
            mix(dst.0[0], color.r),
            mix(dst.0[1], color.g),
            mix(dst.0[2], color.b),
            255,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREY: Rgb = Rgb::new(0x22, 0x22, 0x22);

    #[test]
    fn fill_covers_everything() {
        let mut canvas = Canvas::new(8, 4);
        canvas.fill(GREY);
        assert_eq!(canvas.pixel(0, 0), GREY);
        assert_eq!(canvas.pixel(7, 3), GREY);
    }

    #[test]
    fn rect_in_translated_space() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(Rgb::BLACK);
        canvas.translate(10.0, 10.0);
        canvas.fill_rect(-2.0, -6.0, 4.0, 6.0, RED, None);
        assert_eq!(canvas.pixel(10, 7), RED);
        assert_eq!(canvas.pixel(10, 12), Rgb::BLACK);
        assert_eq!(canvas.pixel(15, 7), Rgb::BLACK);
    }

    #[test]
    fn rotation_turns_upward_bar_to_the_right() {
        let mut canvas = Canvas::new(40, 40);
        canvas.fill(Rgb::BLACK);
        canvas.translate(20.0, 20.0);
        canvas.rotate(FRAC_PI_2);
        canvas.fill_rect(-1.0, -15.0, 2.0, 15.0, RED, None);
        // a bar pointing up, turned a quarter clockwise, points right
        assert_eq!(canvas.pixel(30, 20), RED);
        assert_eq!(canvas.pixel(20, 10), Rgb::BLACK);
    }

    #[test]
    fn save_restore_isolates_transforms() {
        let mut canvas = Canvas::new(10, 10);
        canvas.save();
        canvas.translate(3.0, 4.0);
        canvas.rotate(1.0);
        canvas.restore();
        assert_eq!(canvas.transform(), Transform::IDENTITY);
        // unbalanced restore is ignored
        canvas.restore();
        assert_eq!(canvas.transform(), Transform::IDENTITY);
    }

    #[test]
    fn circle_and_glow() {
        let mut canvas = Canvas::new(40, 40);
        canvas.fill(GREY);
        let glow = Glow { color: Rgb::WHITE, blur: 6.0 };
        canvas.fill_circle(20.0, 20.0, 8.0, Rgb::BLACK, Some(glow));
        assert_eq!(canvas.pixel(20, 20), Rgb::BLACK);
        let halo = canvas.pixel(20, 30);
        assert!(halo.r > GREY.r, "glow should brighten the background");
        assert_eq!(canvas.pixel(0, 0), GREY);
    }

    #[test]
    fn image_blends_by_alpha_and_clips() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(Rgb::BLACK);
        let mut src = RgbaImage::new(3, 3);
        src.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        src.put_pixel(1, 0, Rgba([255, 255, 255, 0]));
        canvas.draw_image(&src, 2.0, 2.0, None);
        assert_eq!(canvas.pixel(2, 2), Rgb::WHITE);
        assert_eq!(canvas.pixel(3, 2), Rgb::BLACK);
        canvas.draw_image(&src, -10.0, -10.0, None);
    }

    #[test]
    fn image_glow_hugs_opaque_pixels() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(Rgb::BLACK);
        let mut src = RgbaImage::new(4, 4);
        for y in 0..4 {
            src.put_pixel(0, y, Rgba([255, 255, 255, 255]));
        }
        let glow = Glow { color: Rgb::WHITE, blur: 4.0 };
        canvas.draw_image(&src, 8.0, 8.0, Some(glow));
        assert_eq!(canvas.pixel(8, 9), Rgb::WHITE);
        // left of the opaque column, and inside the image's transparent part
        assert!(canvas.pixel(7, 9).r > 0);
        assert!(canvas.pixel(9, 9).r > 0);
        assert!(canvas.pixel(7, 9).r > canvas.pixel(5, 9).r);
        assert_eq!(canvas.pixel(2, 9), Rgb::BLACK);
        assert_eq!(canvas.pixel(14, 9), Rgb::BLACK);
        // clipped at the canvas edge without panicking
        canvas.draw_image(&src, -2.0, -2.0, Some(glow));
    }

    #[test]
    fn scale_follows_smaller_side() {
        let canvas = Canvas::new(1440, 360);
        assert!((canvas.scale() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn inverse_round_trips() {
        let t = Transform::IDENTITY.translated(5.0, -3.0).rotated(0.7);
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply(2.0, 9.0);
        let (bx, by) = inv.apply(x, y);
        assert!((bx - 2.0).abs() < 1e-4 && (by - 9.0).abs() < 1e-4);
    }
}
