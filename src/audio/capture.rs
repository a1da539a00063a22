//! System audio capture via cpal.
//!
//! Opens the default input device after pointing it at a PulseAudio/PipeWire
//! monitor source, so whatever is playing on the machine gets analysed.
//! The stream is built paused; [`Capture::start`] begins delivery.

use super::{SampleRing, SharedRing};
use crate::error::VizError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::process::Command;
use std::sync::{Arc, Mutex};

/// Samples kept by the capture ring (several analysis windows)
const RING_CAPACITY: usize = 4096;

/// RAII guard that points stderr at /dev/null while ALSA enumerates devices
struct StderrSuppressor {
    saved_fd: i32,
    _dev_null: File,
}

impl StderrSuppressor {
    fn new() -> Option<Self> {
        let dev_null = File::open("/dev/null").ok()?;

        let saved_fd = unsafe { libc::dup(2) };
        if saved_fd < 0 {
            return None;
        }

        if unsafe { libc::dup2(dev_null.as_raw_fd(), 2) } < 0 {
            unsafe {
                libc::close(saved_fd);
            }
            return None;
        }

        Some(Self {
            saved_fd,
            _dev_null: dev_null,
        })
    }
}

impl Drop for StderrSuppressor {
    fn drop(&mut self) {
        unsafe {
            libc::dup2(self.saved_fd, 2);
            libc::close(self.saved_fd);
        }
    }
}

/// PulseAudio source names: alphanumerics plus `. - _ : @`
fn is_valid_source_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '@'))
}

fn pactl(args: &[&str]) -> Option<String> {
    Command::new("pactl")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

/// Pick a monitor source from `pactl list sources short` output, preferring
/// the monitor of `default_sink`.
fn pick_monitor(listing: &str, default_sink: Option<&str>) -> Option<String> {
    let names: Vec<&str> = listing
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .filter(|name| is_valid_source_name(name))
        .collect();

    if let Some(sink) = default_sink {
        let expected = format!("{}.monitor", sink);
        if let Some(name) = names.iter().find(|n| **n == expected) {
            return Some(name.to_string());
        }
    }

    names
        .iter()
        .find(|n| n.contains(".monitor"))
        .map(|n| n.to_string())
}

/// Restores the previous default source on drop if we replaced it
struct MonitorSourceGuard {
    original_source: Option<String>,
}

impl MonitorSourceGuard {
    /// Point the default input at a monitor source. Returns a guard that
    /// undoes the change, or None when nothing was changed.
    fn install() -> Option<Self> {
        let original_source = pactl(&["get-default-source"]).filter(|s| is_valid_source_name(s));
        let default_sink = pactl(&["get-default-sink"]).filter(|s| is_valid_source_name(s));
        let listing = pactl(&["list", "sources", "short"])?;

        let monitor = pick_monitor(&listing, default_sink.as_deref())?;
        if original_source.as_deref() == Some(monitor.as_str()) {
            return None;
        }
        pactl(&["set-default-source", monitor.as_str()])?;
        log::info!("default source set to monitor {}", monitor);

        Some(Self { original_source })
    }
}

impl Drop for MonitorSourceGuard {
    fn drop(&mut self) {
        if let Some(ref orig) = self.original_source {
            let _ = Command::new("pactl").args(["set-default-source", orig.as_str()]).output();
        }
    }
}

/// Outcome of trying to start the audio stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioGate {
    /// Samples are flowing
    Playing,
    /// The first start failed; one manual retry is allowed
    AwaitingResume,
    /// The retry failed too; analysis runs on silence
    Unavailable,
}

impl AudioGate {
    /// Apply the result of a start attempt. The manual retry is one-shot.
    pub fn after_attempt(self, started: bool) -> Self {
        match (self, started) {
            (_, true) => Self::Playing,
            (Self::Playing, false) => Self::AwaitingResume,
            (Self::AwaitingResume, false) | (Self::Unavailable, false) => Self::Unavailable,
        }
    }

    pub fn is_prompting(self) -> bool {
        self == Self::AwaitingResume
    }
}

/// A live input stream feeding a shared ring
pub struct Capture {
    stream: cpal::Stream,
    ring: SharedRing,
    sample_rate: u32,
    device_name: String,
    _source_guard: Option<MonitorSourceGuard>,
}

impl Capture {
    /// Find the input device and build its stream without starting it
    pub fn open() -> Result<Self, VizError> {
        let stderr_guard = StderrSuppressor::new();

        let host = cpal::default_host();
        log::debug!("audio host: {:?}", host.id());

        let source_guard = MonitorSourceGuard::install();
        log::debug!("monitor source installed: {}", source_guard.is_some());

        let device = host.default_input_device().ok_or(VizError::NoInputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device.default_input_config()?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        log::info!("input {}: {}Hz, {} channels", device_name, sample_rate, channels);

        if channels == 0 {
            return Err(VizError::NoChannels);
        }

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring: SharedRing = Arc::new(Mutex::new(SampleRing::new(RING_CAPACITY)));
        let callback_ring = Arc::clone(&ring);
        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut ring) = callback_ring.lock() {
                    ring.push_interleaved(data, channels as usize);
                }
            },
            |err| log::warn!("audio stream error: {}", err),
            None,
        )?;

        drop(stderr_guard);

        Ok(Self {
            stream,
            ring,
            sample_rate,
            device_name,
            _source_guard: source_guard,
        })
    }

    pub fn start(&self) -> Result<(), VizError> {
        self.stream.play()?;
        Ok(())
    }

    pub fn ring(&self) -> SharedRing {
        Arc::clone(&self.ring)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names() {
        assert!(is_valid_source_name("alsa_output.pci-0000_03_00.1.hdmi-stereo.monitor"));
        assert!(is_valid_source_name("@DEFAULT_SINK@"));
        assert!(!is_valid_source_name(""));
        assert!(!is_valid_source_name("evil; rm -rf"));
    }

    #[test]
    fn prefers_monitor_of_default_sink() {
        let listing = "1\talsa_output.a.monitor\tPipeWire\n2\talsa_output.b.monitor\tPipeWire\n";
        assert_eq!(
            pick_monitor(listing, Some("alsa_output.b")),
            Some("alsa_output.b.monitor".to_string())
        );
        assert_eq!(
            pick_monitor(listing, Some("missing")),
            Some("alsa_output.a.monitor".to_string())
        );
        assert_eq!(pick_monitor("3\tmic\tPipeWire\n", None), None);
    }

    #[test]
    fn resume_gate_is_one_shot() {
        let gate = AudioGate::Playing.after_attempt(false);
        assert!(gate.is_prompting());
        assert_eq!(gate.after_attempt(true), AudioGate::Playing);
        assert_eq!(gate.after_attempt(false), AudioGate::Unavailable);
        assert_eq!(AudioGate::Unavailable.after_attempt(false), AudioGate::Unavailable);
    }
}
