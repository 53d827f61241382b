use serde::{Deserialize, Serialize};

/// Tuning constants for a platformer character.
///
/// Speeds are in units per second, accelerations in units per second squared,
/// angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Downward acceleration while airborne.
    pub gravity: f64,
    /// Cap on the falling speed.
    pub max_falling_speed: f64,
    /// Horizontal acceleration while a direction is held.
    pub acceleration: f64,
    /// Horizontal deceleration when no direction is held.
    pub deceleration: f64,
    /// Cap on the horizontal speed.
    pub max_speed: f64,
    /// Initial upward speed of a jump.
    pub jump_speed: f64,
    /// How long holding jump keeps the jump speed from decaying (seconds).
    pub jump_sustain_time: f64,
    pub ladder_climbing_speed: f64,
    /// Whether the character hangs on platform edges while falling.
    pub can_grab_platforms: bool,
    /// Vertical offset of the character's grab line from its top.
    pub y_grab_offset: f64,
    /// Horizontal reach when probing for a ledge to grab.
    pub x_grab_tolerance: f64,
    /// Steepest slope the character can walk up. Must be in `[0, 90)`.
    pub slope_max_angle: f64,
    /// Round the start of the downward floor-follow sweep to a whole unit.
    pub round_coordinates: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            max_falling_speed: 700.0,
            acceleration: 1500.0,
            deceleration: 1500.0,
            max_speed: 250.0,
            jump_speed: 600.0,
            jump_sustain_time: 0.0,
            ladder_climbing_speed: 150.0,
            can_grab_platforms: false,
            y_grab_offset: 0.0,
            x_grab_tolerance: 10.0,
            slope_max_angle: 60.0,
            round_coordinates: false,
        }
    }
}

impl ControllerConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("LEDGE_CONTROLLER_CONFIG")
            && let Some(config) = Self::load_file(&path)
        {
            return config;
        }
        Self::load_file("config/controller.toml").unwrap_or_default()
    }

    fn load_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_toml_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path, error = %e, "Ignoring controller config");
                None
            },
        }
    }

    /// Parse and validate a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        slope_climbing_factor(self.slope_max_angle)
            .map(|_| ())
            .map_err(|e| ConfigError::InvalidSlopeAngle(e.angle))
    }
}

/// Convert a maximum slope angle into the climbing factor: how many units the
/// character may rise per unit of horizontal travel.
///
/// 45 degrees maps to exactly 1 so that 45 degree ramps are climbable despite
/// floating point error in the tangent.
pub fn slope_climbing_factor(angle: f64) -> Result<f64, SlopeAngleError> {
    if !angle.is_finite() || !(0.0..90.0).contains(&angle) {
        return Err(SlopeAngleError { angle });
    }
    if angle == 45.0 {
        return Ok(1.0);
    }
    Ok(angle.to_radians().tan())
}

/// A maximum slope angle outside `[0, 90)` degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeAngleError {
    pub angle: f64,
}

impl std::fmt::Display for SlopeAngleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "slope angle {} is outside [0, 90) degrees",
            self.angle
        )
    }
}

impl std::error::Error for SlopeAngleError {}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    InvalidSlopeAngle(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse(e) => write!(f, "invalid config: {e}"),
            Self::InvalidSlopeAngle(angle) => {
                write!(f, "slope_max_angle {angle} is outside [0, 90) degrees")
            },
        }
    }
}

impl std::error::Error for ConfigError {}
