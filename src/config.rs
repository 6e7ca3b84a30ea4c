use serde::Deserialize;
use std::path::PathBuf;

use crate::gcc::phase::DEFAULT_LOOKUP_POINTS;
use crate::report::OutputMode;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_fmin")]
    pub fmin: f64,
    #[serde(default = "default_fmax")]
    pub fmax: f64,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    #[serde(default = "default_lookup_points")]
    pub lookup_points: usize,
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_mode")]
    pub mode: OutputMode,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            fmin: default_fmin(),
            fmax: default_fmax(),
            normalize: default_normalize(),
            lookup_points: default_lookup_points(),
            threads: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            path: None,
        }
    }
}

pub fn default_buffer_size() -> usize { 1024 }
pub fn default_fmin() -> f64 { 100.0 }
pub fn default_fmax() -> f64 { 8000.0 }
fn default_normalize() -> bool { true }
pub fn default_lookup_points() -> usize { DEFAULT_LOOKUP_POINTS }
fn default_mode() -> OutputMode { OutputMode::Console }

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match parse_config(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `--config`, then `./gccphat.toml`, then the per-user config locations.
pub fn discover(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from("gccphat.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("gccphat").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("gccphat").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}
