/// Tunable scene constants.
///
/// Every field has a default, so a partial JSON document overrides only what
/// it names.
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Rgb;

/// Parameters for object-rotation scenes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Camera distance `D` in `scale = D / (D + z)`
    pub perspective_distance: f64,
    /// Radians of yaw per pixel of horizontal drag
    pub sensitivity_x: f64,
    /// Radians of pitch per pixel of vertical drag
    pub sensitivity_y: f64,
    /// Fraction of the remaining angle covered each frame
    pub damping: f64,
    pub auto_rotate: bool,
    /// Radians added to the yaw target per idle frame
    pub auto_rotate_speed: f64,
    pub palette: Vec<Rgb>,
    /// Opacity of the face outline
    pub stroke_alpha: f64,
    /// Scene size relative to the smaller viewport side
    pub scale_fraction: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            perspective_distance: 500.0,
            sensitivity_x: 0.01,
            sensitivity_y: 0.01,
            damping: 0.1,
            auto_rotate: true,
            auto_rotate_speed: 0.005,
            palette: vec![
                Rgb::new(30, 64, 175),
                Rgb::new(59, 130, 246),
                Rgb::new(147, 197, 253),
                Rgb::new(226, 232, 240),
                Rgb::new(100, 116, 139),
                Rgb::new(234, 179, 8),
            ],
            stroke_alpha: 0.15,
            scale_fraction: 0.25,
        }
    }
}

impl SceneConfig {
    /// Coarser drag response used by panorama-style viewers
    pub fn panorama_drag() -> Self {
        Self {
            sensitivity_x: 0.1,
            sensitivity_y: 0.1,
            ..Self::default()
        }
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.perspective_distance > 0.0) {
            return Err(ConfigError::PerspectiveDistance(self.perspective_distance));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::Damping(self.damping));
        }
        Ok(())
    }
}

/// Parameters for the image-backed look-around variant (angles in degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaConfig {
    /// Degrees per pixel of drag
    pub sensitivity: f64,
    pub latitude_limit: f64,
    pub damping: f64,
    pub auto_rotate: bool,
    /// Degrees of longitude added per idle frame
    pub auto_rotate_speed: f64,
    /// Horizontal field of view
    pub field_of_view: f64,
    pub caption: String,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.1,
            latitude_limit: 85.0,
            damping: 0.1,
            auto_rotate: true,
            auto_rotate_speed: 0.05,
            field_of_view: 90.0,
            caption: "Drag to look around".to_string(),
        }
    }
}

impl PanoramaConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.latitude_limit > 0.0 && self.latitude_limit < 90.0) {
            return Err(ConfigError::LatitudeLimit(self.latitude_limit));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::Damping(self.damping));
        }
        Ok(())
    }
}
