use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("No audio input device found")]
    NoInputDevice,

    #[error("No supported input config: {0}")]
    InputConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Audio device reported 0 channels")]
    NoChannels,

    #[error("Audio stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<VizError> for io::Error {
    fn from(err: VizError) -> Self {
        match err {
            VizError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
