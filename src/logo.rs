//! Center logo: loaded once, resized lazily whenever the canvas scale changes.

use crate::canvas::{Canvas, Glow};
use crate::color::Rgb;
use crate::config::constants::{LOGO_ASPECT, LOGO_GLOW, LOGO_RISE, LOGO_WIDTH};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Last resize, reused while the target size is unchanged
struct LogoRenderCache {
    width: u32,
    height: u32,
    rgba: RgbaImage,
}

pub struct Logo {
    image: Option<DynamicImage>,
    cache: Option<LogoRenderCache>,
}

impl Logo {
    /// A logo that draws nothing
    pub fn none() -> Self {
        Self { image: None, cache: None }
    }

    /// Load from disk. Failures are logged and yield an empty logo.
    pub fn load(path: &Path) -> Self {
        match image::open(path) {
            Ok(image) => {
                log::info!("logo loaded from {} ({}x{})", path.display(), image.width(), image.height());
                Self::from_image(image)
            }
            Err(e) => {
                log::warn!("logo {} not loaded: {}", path.display(), e);
                Self::none()
            }
        }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image: Some(image), cache: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    /// Target pixel size for a given canvas scale
    pub fn pixel_size(scale: f32) -> (u32, u32) {
        let width = (LOGO_WIDTH * scale).round().max(1.0) as u32;
        let height = (LOGO_WIDTH * LOGO_ASPECT * scale).round().max(1.0) as u32;
        (width, height)
    }

    fn resized(&mut self, width: u32, height: u32) -> Option<&RgbaImage> {
        let image = self.image.as_ref()?;
        let stale = match self.cache.as_ref() {
            Some(existing) => existing.width != width || existing.height != height,
            None => true,
        };

        if stale {
            let rgba = image
                .resize_exact(width, height, image::imageops::FilterType::Triangle)
                .to_rgba8();
            self.cache = Some(LogoRenderCache { width, height, rgba });
        }

        self.cache.as_ref().map(|c| &c.rgba)
    }

    /// Centered horizontally, top edge LOGO_RISE units above the center,
    /// with a faint white glow
    pub fn draw(&mut self, canvas: &mut Canvas) {
        let scale = canvas.scale();
        let (width, height) = Self::pixel_size(scale);
        let (cx, cy) = canvas.center();
        let x = cx - width as f32 / 2.0;
        let y = cy - LOGO_RISE * scale;
        let glow = Glow { color: Rgb::WHITE, blur: LOGO_GLOW * scale };
        if let Some(rgba) = self.resized(width, height) {
            canvas.draw_image(rgba, x, y, Some(glow));
        }
    }
}
