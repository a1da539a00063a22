//! One bar of the ring: a rectangle anchored at the canvas center, rotated to
//! its slot and stretched by the magnitude of its frequency bin.

use crate::canvas::{Canvas, Glow};
use crate::color::Rgb;
use crate::config::constants::{BAR_GLOW, BAR_WIDTH, MAX_HEIGHT, MIN_HEIGHT};
use crate::config::BinMapping;
use crate::sampler::FrequencyBuffer;

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    /// Slot angle in degrees, clockwise from straight up
    pub angle: f32,
    pub width: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Bin read from the frequency buffer
    pub bin: usize,
}

impl Bar {
    pub fn new(width: f32, min_height: f32, max_height: f32, index: usize, count: usize, bin: usize) -> Self {
        Self {
            angle: index as f32 / count.max(1) as f32 * 360.0,
            width,
            min_height,
            max_height,
            bin,
        }
    }

    /// Length in design units: linear in the bin's byte, min at 0, max at 255
    pub fn height(&self, buffer: &FrequencyBuffer) -> f32 {
        let raw = buffer.get(self.bin) as f32;
        self.min_height + raw / 255.0 * (self.max_height - self.min_height)
    }

    /// Paint this bar in `color`. The transform is saved and restored, so
    /// later bars start from the same space.
    pub fn draw(&self, canvas: &mut Canvas, buffer: &FrequencyBuffer, color: Rgb) {
        let scale = canvas.scale();
        let height = self.height(buffer) * scale;
        let width = self.width * scale;
        let (cx, cy) = canvas.center();
        let glow = Glow {
            color,
            blur: BAR_GLOW * scale,
        };

        canvas.save();
        canvas.translate(cx, cy);
        canvas.rotate(self.angle.to_radians());
        canvas.fill_rect(-width / 2.0, -height, width, height, color, Some(glow));
        canvas.restore();
    }
}

/// Build the ring of `count` bars with the default geometry
pub fn build_ring(count: usize, bin_count: usize, mapping: BinMapping) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            Bar::new(
                BAR_WIDTH,
                MIN_HEIGHT,
                MAX_HEIGHT,
                i,
                count,
                mapping.bin_for(i, count, bin_count),
            )
        })
        .collect()
}
