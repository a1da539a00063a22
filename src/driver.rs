//! Frame driver: owns everything a frame needs and paints it at a fixed rate.
//!
//! Each tick runs, in order: sampler refresh, color step, background clear,
//! bars, center disc, logo.

use crate::audio::analyser::Analyser;
use crate::audio::capture::{AudioGate, Capture};
use crate::audio::{Silence, Tone};
use crate::bar::{build_ring, Bar};
use crate::canvas::{Canvas, Glow};
use crate::color::{parse_hex, ColorState, Rgb};
use crate::config::constants::{BACKGROUND, DISC_GLOW, DISC_RADIUS};
use crate::config::VisualizerConfig;
use crate::error::VizError;
use crate::help::{render_banner, render_overlay, HELP};
use crate::logo::Logo;
use crate::sampler::{FrequencyBuffer, FrequencySampler};
use crate::terminal::Terminal;
use crossterm::event::KeyCode;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Sample rate assumed when no device supplies one
const FALLBACK_SAMPLE_RATE: u32 = 48_000;
/// Peak amplitude of the synthetic snapshot tone
const TONE_AMPLITUDE: f32 = 0.8;
/// Shown while waiting for the manual audio start
const RESUME_PROMPT: &str = "Press Enter to start audio";

/// Everything one frame reads or writes
pub struct AppContext {
    pub canvas: Canvas,
    pub sampler: FrequencySampler,
    pub buffer: FrequencyBuffer,
    pub color: ColorState,
    pub bars: Vec<Bar>,
    pub logo: Logo,
}

impl AppContext {
    pub fn new(config: &VisualizerConfig, sampler: FrequencySampler, logo: Logo, width: u32, height: u32) -> Self {
        let buffer = sampler.new_buffer();
        let bars = build_ring(config.bar_count, buffer.len(), config.mapping);
        Self {
            canvas: Canvas::new(width, height),
            sampler,
            buffer,
            color: ColorState::new(&config.start_color),
            bars,
            logo,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Built, no tick yet
    Idle,
    Running,
    /// Quit requested; further ticks are ignored
    Stopped,
}

pub struct FrameDriver {
    ctx: AppContext,
    state: DriverState,
    frames: u64,
}

impl FrameDriver {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            state: DriverState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    pub fn stop(&mut self) {
        self.state = DriverState::Stopped;
    }

    /// One frame: sample, advance color, repaint
    pub fn tick(&mut self) {
        if self.state == DriverState::Stopped {
            return;
        }
        self.state = DriverState::Running;

        let ctx = &mut self.ctx;
        ctx.sampler.refresh(&mut ctx.buffer);
        if ctx.color.tick() {
            log::debug!("bar color now {}", ctx.color.hex);
        }
        self.paint();
        self.frames += 1;
    }

    fn paint(&mut self) {
        let ctx = &mut self.ctx;
        let canvas = &mut ctx.canvas;
        let scale = canvas.scale();
        let (cx, cy) = canvas.center();

        canvas.fill(parse_hex(BACKGROUND));

        let bar_color = ctx.color.rgb();
        for bar in &ctx.bars {
            bar.draw(canvas, &ctx.buffer, bar_color);
        }

        let disc_glow = Glow {
            color: Rgb::BLACK,
            blur: DISC_GLOW * scale,
        };
        canvas.fill_circle(cx, cy, DISC_RADIUS * scale, Rgb::BLACK, Some(disc_glow));

        ctx.logo.draw(canvas);
    }
}

fn load_logo(path: Option<&PathBuf>) -> Logo {
    let logo = match path {
        Some(p) => Logo::load(p),
        None => Logo::none(),
    };
    if !logo.is_loaded() {
        log::debug!("drawing without a logo");
    }
    logo
}

/// Try to start the capture stream, logging failures
fn try_start(capture: &Capture) -> bool {
    match capture.start() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("{}", e);
            false
        }
    }
}

/// Live mode: capture system audio and draw into the terminal until quit
pub fn run(config: &VisualizerConfig) -> Result<(), VizError> {
    log::info!("starting ring visualizer: {:?}", config);

    let capture = if config.silent {
        None
    } else {
        match Capture::open() {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("audio capture unavailable, drawing silence: {}", e);
                None
            }
        }
    };

    let mut gate = match capture.as_ref() {
        Some(c) => {
            log::info!("capturing from {}", c.device_name());
            AudioGate::Playing.after_attempt(try_start(c))
        }
        None => AudioGate::Unavailable,
    };

    let sample_rate = capture.as_ref().map(Capture::sample_rate).unwrap_or(FALLBACK_SAMPLE_RATE);
    let analyser = Analyser::new(sample_rate);
    log::debug!("{} bins, {:.1} Hz each", analyser.bin_count(), analyser.bin_frequency(1));
    let sampler = match capture.as_ref() {
        Some(c) => FrequencySampler::new(Box::new(c.ring()), analyser),
        None => FrequencySampler::new(Box::new(Silence), analyser),
    };

    let mut term = Terminal::new()?;
    let (width, height) = term.pixel_size();
    let ctx = AppContext::new(config, sampler, load_logo(config.logo.as_ref()), width, height);
    let mut driver = FrameDriver::new(ctx);

    let frame_time = Duration::from_secs_f32(config.frame_time());
    let mut paused = false;
    let mut show_help = false;
    let mut next_frame = Instant::now();

    while driver.state() != DriverState::Stopped {
        if term.sync_size()? {
            let (w, h) = term.pixel_size();
            driver.context_mut().canvas.resize(w, h);
        }

        while let Some((code, _mods)) = term.check_key()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => driver.stop(),
                KeyCode::Char(' ') => paused = !paused,
                KeyCode::Char('h') | KeyCode::Char('?') => show_help = !show_help,
                KeyCode::Enter if gate.is_prompting() => {
                    if let Some(c) = capture.as_ref() {
                        gate = gate.after_attempt(try_start(c));
                        log::info!("manual audio start: {:?}", gate);
                    }
                }
                _ => {}
            }
        }
        if driver.state() == DriverState::Stopped {
            break;
        }

        if !paused {
            driver.tick();
        }

        term.blit(&driver.context().canvas);
        if gate.is_prompting() {
            render_banner(&mut term, RESUME_PROMPT);
        }
        if show_help {
            render_overlay(&mut term, HELP);
        }
        term.present()?;

        // fixed cadence; an overrun pushes the schedule back instead of catching up
        next_frame += frame_time;
        let now = Instant::now();
        if next_frame > now {
            term.sleep((next_frame - now).as_secs_f32());
        } else {
            next_frame = now;
        }
    }

    log::info!("stopped after {} frames", driver.frames());
    Ok(())
}

/// Options for rendering a still frame without a terminal
#[derive(Clone, Debug)]
pub struct SnapshotOptions {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub ticks: u32,
    /// Sine frequency to feed the analyser; silence when None
    pub tone: Option<f32>,
}

/// Build a driver fed by a synthetic source and run `ticks` frames
pub fn render_offline(config: &VisualizerConfig, options: &SnapshotOptions) -> FrameDriver {
    let source: Box<dyn crate::audio::SampleSource> = match options.tone {
        Some(freq) => Box::new(Tone::new(freq, TONE_AMPLITUDE, FALLBACK_SAMPLE_RATE, config.fps)),
        None => Box::new(Silence),
    };
    let sampler = FrequencySampler::new(source, Analyser::new(FALLBACK_SAMPLE_RATE));
    let ctx = AppContext::new(
        config,
        sampler,
        load_logo(config.logo.as_ref()),
        options.width,
        options.height,
    );

    let mut driver = FrameDriver::new(ctx);
    for _ in 0..options.ticks.max(1) {
        driver.tick();
    }
    driver
}

/// Headless mode: render frames and save the last one as an image
pub fn snapshot(config: &VisualizerConfig, options: &SnapshotOptions) -> Result<(), VizError> {
    let driver = render_offline(config, options);
    driver.context().canvas.save_png(&options.output)?;
    log::info!(
        "wrote {} after {} ticks, color {}",
        options.output.display(),
        driver.frames(),
        driver.context().color.hex
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleSource;

    fn quiet_config() -> VisualizerConfig {
        VisualizerConfig {
            logo: None,
            ..VisualizerConfig::default()
        }
    }

    fn silent_driver(width: u32, height: u32) -> FrameDriver {
        let config = quiet_config();
        let sampler = FrequencySampler::new(Box::new(Silence), Analyser::new(48_000));
        FrameDriver::new(AppContext::new(&config, sampler, Logo::none(), width, height))
    }

    /// Source that records how often it was asked for samples
    struct CountingSource(std::rc::Rc<std::cell::Cell<u32>>);

    impl SampleSource for CountingSource {
        fn copy_latest(&mut self, out: &mut [f32]) {
            self.0.set(self.0.get() + 1);
            out.fill(0.0);
        }
    }

    #[test]
    fn starts_idle_then_runs() {
        let mut driver = silent_driver(64, 64);
        assert_eq!(driver.state(), DriverState::Idle);
        driver.tick();
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(driver.frames(), 1);
    }

    #[test]
    fn stopped_driver_ignores_ticks() {
        let mut driver = silent_driver(64, 64);
        driver.tick();
        driver.stop();
        driver.tick();
        assert_eq!(driver.state(), DriverState::Stopped);
        assert_eq!(driver.frames(), 1);
    }

    #[test]
    fn every_tick_samples_once() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let sampler = FrequencySampler::new(
            Box::new(CountingSource(calls.clone())),
            Analyser::new(48_000),
        );
        let config = quiet_config();
        let mut driver = FrameDriver::new(AppContext::new(&config, sampler, Logo::none(), 32, 32));
        for _ in 0..3 {
            driver.tick();
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn color_cycles_with_ticks() {
        let mut driver = silent_driver(32, 32);
        driver.tick();
        let first = driver.context().color.hex.clone();
        assert_eq!(first, crate::color::rotate_hex_hue("#009dff", 1.0));
        for _ in 0..6 {
            driver.tick();
        }
        assert_eq!(driver.context().color.hex, crate::color::rotate_hex_hue(&first, 1.0));
    }

    #[test]
    fn frame_layout() {
        let mut driver = silent_driver(720, 720);
        driver.tick();
        let ctx = driver.context();
        let canvas = &ctx.canvas;
        // corner keeps the background
        assert_eq!(canvas.pixel(0, 0), parse_hex(BACKGROUND));
        // center is covered by the disc
        assert_eq!(canvas.pixel(360, 360), Rgb::BLACK);
        // silent bars sit at minimum length; just past the disc the bar shows
        // through the disc's dark glow
        let bar = canvas.pixel(360, 360 - 195);
        let color = ctx.color.rgb();
        assert!(bar.b > color.b / 2 && bar.b <= color.b, "got {:?}", bar);
        assert!(bar.g > color.g / 2 && bar.g <= color.g, "got {:?}", bar);
        // beyond the bar tip plus glow nothing is drawn
        assert_eq!(canvas.pixel(360, 360 - 240), parse_hex(BACKGROUND));
    }

    #[test]
    fn loud_bin_lengthens_its_bar() {
        let mut driver = silent_driver(720, 720);
        driver.tick();
        let ctx = driver.context_mut();
        ctx.buffer.as_mut_slice()[0] = 255;
        let canvas_before = ctx.canvas.pixel(360, 360 - 280);
        assert_eq!(canvas_before, parse_hex(BACKGROUND));
        driver.paint();
        let ctx = driver.context();
        assert_eq!(ctx.canvas.pixel(360, 360 - 280), ctx.color.rgb());
    }

    #[test]
    fn offline_render_with_tone() {
        let options = SnapshotOptions {
            output: PathBuf::from("unused.png"),
            width: 120,
            height: 80,
            ticks: 8,
            tone: Some(440.0),
        };
        let driver = render_offline(&quiet_config(), &options);
        assert_eq!(driver.frames(), 8);
        assert!(driver.context().buffer.as_slice().iter().any(|&b| b > 0));
        assert_eq!(driver.context().canvas.width(), 120);
    }

    #[test]
    fn snapshot_writes_png() {
        let output = std::env::temp_dir().join(format!("ringviz-snapshot-{}.png", std::process::id()));
        let options = SnapshotOptions {
            output: output.clone(),
            width: 64,
            height: 48,
            ticks: 2,
            tone: None,
        };
        snapshot(&quiet_config(), &options).unwrap();
        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
        let _ = std::fs::remove_file(&output);
    }
}
