//! Audio input: sample sources feeding the analyser.
//!
//! The capture thread pushes interleaved device frames into a [`SampleRing`];
//! the render thread copies the newest window out once per frame.

pub mod analyser;
pub mod capture;

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};

/// Something the sampler can pull the latest time-domain window from
pub trait SampleSource {
    /// Fill `out` with the most recent samples, oldest first
    fn copy_latest(&mut self, out: &mut [f32]);
}

/// Fixed-size mono ring buffer, overwritten oldest-first
pub struct SampleRing {
    samples: Vec<f32>,
    write_pos: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Push interleaved frames, averaging the channels down to mono
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks(channels) {
            let sum: f32 = frame.iter().sum();
            self.push(sum / frame.len() as f32);
        }
    }

    pub fn push(&mut self, sample: f32) {
        let len = self.samples.len();
        self.samples[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;
    }

    /// Copy the newest `out.len()` samples, oldest to newest.
    /// Anything beyond the ring's capacity is left-padded with silence.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let len = self.samples.len();
        let want = out.len();
        let pad = want.saturating_sub(len);
        out[..pad].fill(0.0);
        let take = want - pad;
        let start = (self.write_pos + len - take) % len;
        for (i, slot) in out[pad..].iter_mut().enumerate() {
            *slot = self.samples[(start + i) % len];
        }
    }
}

/// Ring shared between the capture callback and the render thread
pub type SharedRing = Arc<Mutex<SampleRing>>;

impl SampleSource for SharedRing {
    fn copy_latest(&mut self, out: &mut [f32]) {
        match self.lock() {
            Ok(ring) => ring.copy_latest(out),
            Err(_) => out.fill(0.0),
        }
    }
}

/// No input connected; the analyser settles on flat bars
#[derive(Default)]
pub struct Silence;

impl SampleSource for Silence {
    fn copy_latest(&mut self, out: &mut [f32]) {
        out.fill(0.0);
    }
}

/// Synthetic sine generator, advanced by one frame's worth of samples per call
pub struct Tone {
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
    samples_per_frame: usize,
    position: u64,
}

impl Tone {
    pub fn new(frequency: f32, amplitude: f32, sample_rate: u32, fps: f32) -> Self {
        Self {
            frequency,
            amplitude,
            sample_rate: sample_rate.max(1),
            samples_per_frame: (sample_rate as f32 / fps.max(1.0)) as usize,
            position: 0,
        }
    }
}

impl SampleSource for Tone {
    fn copy_latest(&mut self, out: &mut [f32]) {
        self.position += self.samples_per_frame as u64;
        let start = self.position.saturating_sub(out.len() as u64);
        for (i, slot) in out.iter_mut().enumerate() {
            let t = (start + i as u64) as f64 / self.sample_rate as f64;
            // whole cycles dropped so long runs keep full phase precision
            let phase = (self.frequency as f64 * t).fract();
            *slot = self.amplitude * (TAU * phase).sin() as f32;
        }
    }
}
