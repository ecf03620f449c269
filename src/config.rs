//! Session configuration
//!
//! Read from TOML; every field has a default so an empty file (or no file) is
//! a working setup that listens where Sonic Pi would and drives a local
//! scsynth.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub patterns: PatternConfig,
    pub ambient: AmbientConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Where inbound OSC arrives
    pub listen: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// scsynth (or compatible) address for `/s_new`
    pub target: SocketAddr,
    /// Prepended to instrument names to form synthdef names
    pub synth_prefix: String,
    /// Log triggers instead of sending them
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub ambient: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub synth: String,
    pub attack: f64,
    pub release: f64,
    pub amp: f64,
    pub cutoff_min: f64,
    pub cutoff_max: f64,
    /// Fixed seed for the cutoff generator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub bpm: f64,
    /// Rest taken when there is nothing to play
    pub idle_beats: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 4560)),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([127, 0, 0, 1], 57110)),
            synth_prefix: "sonic-pi-".to_string(),
            dry_run: false,
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            ambient: "/osc*/ambient".to_string(),
            sequence: "/osc*/synth".to_string(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            synth: "prophet".to_string(),
            attack: 1.0,
            release: 10.0,
            amp: 0.15,
            cutoff_min: 60.0,
            cutoff_max: 90.0,
            seed: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            bpm: 60.0,
            idle_beats: 0.1,
        }
    }
}

/// Filter cutoffs the drone synths accept, as MIDI note numbers
pub const CUTOFF_RANGE: std::ops::RangeInclusive<f64> = 0.0..=130.0;

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Cannot read {}: {}", path.display(), e),
            ConfigError::Parse(path, msg) => write!(f, "Cannot parse {}: {}", path.display(), msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Default config file location, `<config dir>/magnon/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("magnon").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| e.to_string())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config =
            Self::from_toml(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given, else the default location if it exists, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.player.bpm.is_finite() && self.player.bpm > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "player.bpm must be positive, got {}",
                self.player.bpm
            )));
        }
        if !(self.player.idle_beats.is_finite() && self.player.idle_beats > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "player.idle_beats must be positive, got {}",
                self.player.idle_beats
            )));
        }
        let (min, max) = (self.ambient.cutoff_min, self.ambient.cutoff_max);
        if !(CUTOFF_RANGE.contains(&min) && CUTOFF_RANGE.contains(&max) && min <= max) {
            return Err(ConfigError::Invalid(format!(
                "ambient cutoff range {}..{} must lie within {}..{}",
                min,
                max,
                CUTOFF_RANGE.start(),
                CUTOFF_RANGE.end()
            )));
        }
        for (name, value) in [
            ("attack", self.ambient.attack),
            ("release", self.ambient.release),
            ("amp", self.ambient.amp),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "ambient.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
