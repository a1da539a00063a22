mod audio;
mod bar;
mod canvas;
mod color;
mod config;
mod driver;
mod error;
mod help;
mod logging;
mod logo;
mod sampler;
mod settings;
mod terminal;

use clap::{Args, Parser, Subcommand};
use config::{BinMapping, VisualizerConfig};
use driver::SnapshotOptions;
use settings::Settings;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ringviz")]
#[command(author = "Terminal Art Generator")]
#[command(version)]
#[command(about = "Circular audio spectrum visualizer for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by live and headless rendering
#[derive(Args, Clone, Default)]
struct RingArgs {
    /// Number of bars around the ring
    #[arg(short, long)]
    bars: Option<usize>,

    /// Bin selection: linear (bar i reads bin i) or log
    #[arg(short, long)]
    mapping: Option<String>,

    /// Starting bar color (#rgb or #rrggbb)
    #[arg(short, long)]
    color: Option<String>,

    /// Logo image drawn in the center
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Write diagnostics to /tmp/ringviz.log
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Visualize system audio live in the terminal
    Run {
        #[command(flatten)]
        ring: RingArgs,

        /// Frames per second
        #[arg(short, long)]
        fps: Option<f32>,

        /// Skip audio capture and draw flat bars
        #[arg(short, long)]
        silent: bool,
    },

    /// Render frames from a synthetic tone and save the last one as an image
    Snapshot {
        #[command(flatten)]
        ring: RingArgs,

        /// Output image path (format from extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Canvas width in pixels
        #[arg(short = 'W', long, default_value = "720")]
        width: u32,

        /// Canvas height in pixels
        #[arg(short = 'H', long, default_value = "720")]
        height: u32,

        /// Number of frames to render before saving
        #[arg(short, long, default_value = "30")]
        ticks: u32,

        /// Sine tone frequency in Hz (silence when omitted)
        #[arg(long)]
        tone: Option<f32>,
    },
}

/// Layer CLI flags over the config file over built-in defaults
fn resolve_config(ring: &RingArgs, fps: Option<f32>, settings: &Settings) -> VisualizerConfig {
    let mut config = VisualizerConfig::default();

    if let Some(bars) = ring.bars.or(settings.bars) {
        config.bar_count = bars.clamp(1, 720);
    }
    if let Some(fps) = fps.or(settings.fps) {
        config.fps = fps.clamp(1.0, 240.0);
    }
    if let Some(color) = ring.color.as_ref().or(settings.color.as_ref()) {
        config.start_color = color.clone();
    }
    if let Some(logo) = ring.logo.as_ref().or(settings.logo.as_ref()) {
        config.logo = Some(logo.clone());
    }
    if let Some(name) = ring.mapping.as_ref().or(settings.mapping.as_ref()) {
        match BinMapping::parse(name) {
            Some(mapping) => config.mapping = mapping,
            None => {
                eprintln!("Unknown mapping: {}. Using linear.", name);
                eprintln!("Available: linear, log");
            }
        }
    }
    config.debug = ring.debug;
    config
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Commands::Run { ring, fps, silent } => {
            let mut config = resolve_config(&ring, fps, &settings);
            config.silent = silent;
            logging::init(config.debug);
            driver::run(&config)?;
        }
        Commands::Snapshot {
            ring,
            output,
            width,
            height,
            ticks,
            tone,
        } => {
            let config = resolve_config(&ring, None, &settings);
            logging::init(config.debug);
            let options = SnapshotOptions {
                output,
                width: width.clamp(1, 8192),
                height: height.clamp(1, 8192),
                ticks,
                tone,
            };
            driver::snapshot(&config, &options)?;
        }
    }

    Ok(())
}
