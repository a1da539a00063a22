//! Per-frame frequency sampling into the shared bin buffer.

use crate::audio::analyser::Analyser;
use crate::audio::SampleSource;

/// Fixed-length byte magnitudes, one per bin. Rewritten once per frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyBuffer {
    bins: Vec<u8>,
}

impl FrequencyBuffer {
    pub fn new(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Magnitude of `bin`; bins past the end read as silence
    pub fn get(&self, bin: usize) -> u8 {
        self.bins.get(bin).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bins
    }

    /// Writable view; the length stays fixed
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bins
    }
}

impl From<Vec<u8>> for FrequencyBuffer {
    fn from(bins: Vec<u8>) -> Self {
        Self { bins }
    }
}

/// Pulls the newest audio window from a source and analyses it
pub struct FrequencySampler {
    source: Box<dyn SampleSource>,
    analyser: Analyser,
    window: Vec<f32>,
}

impl FrequencySampler {
    pub fn new(source: Box<dyn SampleSource>, analyser: Analyser) -> Self {
        let window = vec![0.0; analyser.fft_size()];
        Self {
            source,
            analyser,
            window,
        }
    }

    /// A buffer sized for this sampler's bin count
    pub fn new_buffer(&self) -> FrequencyBuffer {
        FrequencyBuffer::new(self.analyser.bin_count())
    }

    /// Swap the audio source, keeping the analyser's smoothing history
    pub fn set_source(&mut self, source: Box<dyn SampleSource>) {
        self.source = source;
    }

    /// Overwrite `buffer` with the current magnitudes
    pub fn refresh(&mut self, buffer: &mut FrequencyBuffer) {
        self.source.copy_latest(&mut self.window);
        self.analyser
            .byte_frequency_data(&self.window, buffer.as_mut_slice());
    }
}
