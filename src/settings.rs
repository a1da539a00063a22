use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Optional overrides from `~/.config/ringviz/config.toml`
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    pub logo: Option<PathBuf>,
    pub color: Option<String>,
    pub bars: Option<usize>,
    pub mapping: Option<String>,
    pub fps: Option<f32>,
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Malformed files count as empty
    pub fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_default()
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ringviz")
            .join("config.toml")
    }
}
