//! Configuration management for the gaze tracker

use crate::{
    constants::{DEFAULT_MAX_FPS, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH},
    gaze::ScreenGeometry,
    pipeline::DisplayState,
    projection::{Orientation, PinholeProjector, Viewport},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame gate configuration
    pub gate: GateConfig,

    /// Physical screen model for the eye-ray method
    pub screen: ScreenGeometry,

    /// Display and projection configuration
    pub display: DisplayConfig,

    /// Trace replay configuration
    pub replay: ReplayConfig,
}

/// Frame gate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum accepted frames per second
    pub max_fps: f64,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Viewport width in pixels
    pub width: u32,

    /// Viewport height in pixels
    pub height: u32,

    /// Interface orientation
    pub orientation: Orientation,

    /// Projector focal length in pixels (defaults to the longer viewport side)
    pub focal_length: Option<f64>,
}

/// Trace replay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Pace replayed frames by their capture times
    pub realtime: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_fps: DEFAULT_MAX_FPS,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
            orientation: Orientation::Portrait,
            focal_length: None,
        }
    }
}

impl DisplayConfig {
    /// Viewport described by this configuration
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(f64::from(self.width), f64::from(self.height))
    }

    /// Initial display state for the tracker
    #[must_use]
    pub fn display_state(&self) -> DisplayState {
        DisplayState::new(self.orientation, self.viewport())
    }

    /// Pinhole projector matching this display
    #[must_use]
    pub fn projector(&self) -> PinholeProjector {
        match self.focal_length {
            Some(focal_length) => PinholeProjector::new().with_focal_length(focal_length),
            None => PinholeProjector::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML for this schema
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if !self.gate.max_fps.is_finite() || self.gate.max_fps <= 0.0 {
            return Err(Error::ConfigError("Max FPS must be greater than 0".to_string()));
        }

        self.screen.validate()?;

        if self.display.width == 0 || self.display.height == 0 {
            return Err(Error::ConfigError("Viewport size must be non-zero".to_string()));
        }
        if let Some(focal_length) = self.display.focal_length {
            if !focal_length.is_finite() || focal_length <= 0.0 {
                return Err(Error::ConfigError("Focal length must be greater than 0".to_string()));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze Estimation Configuration

# Frame gate
gate:
  max_fps: 60.0

# Physical screen model for the eye-ray fallback (meters)
screen:
  distance: 0.3
  width: 0.15
  height: 0.25

# Display settings
display:
  width: 1170
  height: 2532
  orientation: portrait

# Trace replay
replay:
  realtime: false
"#;
