use std::path::PathBuf;

/// Tunables for the ring visualizer. Geometry values are in design units
/// (pixels of a full-window canvas) and get scaled to the real canvas.
pub mod constants {
    /// Number of bars around the ring
    pub const BAR_COUNT: usize = 70;
    /// Bar thickness
    pub const BAR_WIDTH: f32 = 15.0;
    /// Bar length at zero amplitude
    pub const MIN_HEIGHT: f32 = 200.0;
    /// Bar length at full amplitude
    pub const MAX_HEIGHT: f32 = 300.0;
    /// Glow radius around each bar
    pub const BAR_GLOW: f32 = 10.0;

    /// Analysis window; yields FFT_SIZE / 2 frequency bins
    pub const FFT_SIZE: usize = 512;
    /// Temporal smoothing between analysis frames (0.0-1.0)
    pub const SMOOTHING: f32 = 0.8;
    /// Magnitude mapped to byte 0
    pub const MIN_DECIBELS: f32 = -100.0;
    /// Magnitude mapped to byte 255
    pub const MAX_DECIBELS: f32 = -30.0;

    /// Starting bar color
    pub const START_COLOR: &str = "#009dff";
    /// Degrees of hue advanced per color step
    pub const HUE_STEP: f64 = 1.0;
    /// Ticks between color steps
    pub const COLOR_PERIOD: u32 = 6;

    /// Frame rate of the driver
    pub const FPS: f32 = 60.0;

    /// Canvas background
    pub const BACKGROUND: &str = "#222222";
    /// Radius of the opaque disc behind the logo
    pub const DISC_RADIUS: f32 = 185.0;
    /// Glow radius around the disc
    pub const DISC_GLOW: f32 = 20.0;
    /// Logo width; height follows LOGO_ASPECT
    pub const LOGO_WIDTH: f32 = 300.0;
    pub const LOGO_ASPECT: f32 = 1.089_529_6;
    /// Distance from canvas center up to the logo's top edge
    pub const LOGO_RISE: f32 = 170.0;
    /// Glow radius around the logo
    pub const LOGO_GLOW: f32 = 5.0;
    pub const LOGO_PATH: &str = "logo.png";

    /// Smaller canvas dimension that maps 1:1 onto design units
    pub const REFERENCE_EXTENT: f32 = 720.0;
}

use constants::*;

/// How bars pick their frequency bin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BinMapping {
    /// Bar i reads bin i
    #[default]
    Linear,
    /// Bars spread over the spectrum on a log10 curve (more bars for bass)
    Logarithmic,
}

impl BinMapping {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "linear" | "identity" | "lin" => Some(Self::Linear),
            "log" | "logarithmic" => Some(Self::Logarithmic),
            _ => None,
        }
    }

    /// Bin read by bar `index` out of `bar_count`, always below `bin_count`
    /// (0 when there are no bins at all). With more bars than bins both
    /// mappings share bins evenly between neighbouring bars.
    pub fn bin_for(self, index: usize, bar_count: usize, bin_count: usize) -> usize {
        if bin_count == 0 {
            return 0;
        }
        let last = bin_count - 1;
        if bin_count < bar_count {
            return (index * bin_count / bar_count).min(last);
        }
        match self {
            Self::Linear => index.min(last),
            Self::Logarithmic => {
                let normalized = index as f32 / (bar_count.saturating_sub(1)).max(1) as f32;
                let log_normalized = (normalized * 9.0 + 1.0).log10();
                let curve = (log_normalized * last as f32) as usize;
                // keep neighbouring bars on distinct bins
                let ceiling = last - (bar_count - 1 - index.min(bar_count - 1));
                curve.max(index).min(ceiling.max(index)).min(last)
            }
        }
    }
}

/// Resolved configuration for one visualizer session
#[derive(Clone, Debug)]
pub struct VisualizerConfig {
    pub bar_count: usize,
    pub mapping: BinMapping,
    pub start_color: String,
    pub fps: f32,
    pub logo: Option<PathBuf>,
    pub silent: bool,
    pub debug: bool,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            bar_count: BAR_COUNT,
            mapping: BinMapping::Linear,
            start_color: START_COLOR.to_string(),
            fps: FPS,
            logo: Some(PathBuf::from(LOGO_PATH)),
            silent: false,
            debug: false,
        }
    }
}

impl VisualizerConfig {
    /// Seconds per tick
    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps.max(1.0)
    }
}
