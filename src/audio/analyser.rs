//! Byte frequency analysis
//!
//! Turns a window of time-domain samples into 0-255 magnitudes per bin,
//! matching the behaviour of a browser `AnalyserNode`:
//! Blackman window, FFT magnitudes scaled by 1/N, exponential smoothing
//! across frames, then decibels mapped linearly onto a byte.

use crate::config::constants::{FFT_SIZE, MAX_DECIBELS, MIN_DECIBELS, SMOOTHING};
use spectrum_analyzer::scaling::divide_by_N;
use spectrum_analyzer::{samples_fft_to_spectrum, FrequencyLimit};
use std::f32::consts::TAU;

/// Blackman window coefficient (alpha = 0.16)
const BLACKMAN_ALPHA: f32 = 0.16;

/// Build a Blackman window of `size` points
fn blackman_window(size: usize) -> Vec<f32> {
    let a0 = 0.5 * (1.0 - BLACKMAN_ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * BLACKMAN_ALPHA;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (TAU * x).cos() + a2 * (2.0 * TAU * x).cos()
        })
        .collect()
}

pub struct Analyser {
    fft_size: usize,
    sample_rate: u32,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    window: Vec<f32>,
    windowed: Vec<f32>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_params(sample_rate, FFT_SIZE, SMOOTHING, MIN_DECIBELS, MAX_DECIBELS)
    }

    /// `fft_size` is rounded up to a power of two (minimum 32)
    pub fn with_params(
        sample_rate: u32,
        fft_size: usize,
        smoothing: f32,
        min_db: f32,
        max_db: f32,
    ) -> Self {
        let fft_size = fft_size.max(32).next_power_of_two();
        Self {
            fft_size,
            sample_rate: sample_rate.max(1),
            smoothing: smoothing.clamp(0.0, 1.0),
            min_db,
            max_db: if max_db > min_db { max_db } else { min_db + 1.0 },
            window: blackman_window(fft_size),
            windowed: vec![0.0; fft_size],
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of output bins (half the window)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Center frequency of `bin` in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Analyse the newest `fft_size` samples and write one byte per bin into
    /// `out`. Shorter input is treated as preceded by silence; extra output
    /// slots beyond `bin_count` are zeroed.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) {
        let n = self.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();
        self.windowed[..pad].fill(0.0);
        for (i, &s) in tail.iter().enumerate() {
            let s = if s.is_finite() { s } else { 0.0 };
            self.windowed[pad + i] = s * self.window[pad + i];
        }

        let magnitudes = samples_fft_to_spectrum(
            &self.windowed,
            self.sample_rate,
            FrequencyLimit::All,
            Some(&divide_by_N),
        );

        let bins = self.bin_count();
        match magnitudes {
            Ok(spectrum) => {
                let data = spectrum.data();
                for bin in 0..bins {
                    let magnitude = data.get(bin).map(|(_, v)| v.val()).unwrap_or(0.0);
                    self.smoothed[bin] =
                        self.smoothing * self.smoothed[bin] + (1.0 - self.smoothing) * magnitude;
                }
            }
            Err(e) => {
                log::debug!("spectrum analysis failed: {:?}", e);
                for value in &mut self.smoothed {
                    *value *= self.smoothing;
                }
            }
        }

        let range = self.max_db - self.min_db;
        for (slot, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            *slot = self.to_byte(magnitude, range);
        }
        if out.len() > bins {
            out[bins..].fill(0);
        }
    }

    fn to_byte(&self, magnitude: f32, range: f32) -> u8 {
        if magnitude <= 0.0 || !magnitude.is_finite() {
            return 0;
        }
        let db = 20.0 * magnitude.log10();
        let scaled = 255.0 * (db - self.min_db) / range;
        scaled.clamp(0.0, 255.0) as u8
    }
}
