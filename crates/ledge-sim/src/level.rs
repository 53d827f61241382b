use ledge_controller::ControllerConfig;
use ledge_core::geometry::is_convex;
use ledge_core::{Platform, PlatformKind, Point, SceneObject};
use serde::{Deserialize, Serialize};

/// A scene description, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub platforms: Vec<PlatformSpec>,
    pub characters: Vec<CharacterSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub kind: PlatformKind,
    #[serde(default = "default_grabbable")]
    pub can_be_grabbed: bool,
    #[serde(default)]
    pub y_grab_offset: f64,
    /// Convex hitbox relative to `(x, y)`. A `width` x `height` box if absent.
    #[serde(default)]
    pub vertices: Option<Vec<Point>>,
    #[serde(default)]
    pub motion: Option<Motion>,
}

fn default_grabbable() -> bool {
    true
}

/// Back-and-forth movement of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub vx: f64,
    pub vy: f64,
    /// Path length before turning around.
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSpec {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl PlatformSpec {
    pub fn new(name: impl Into<String>, kind: PlatformKind, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width: w,
            height: h,
            kind,
            can_be_grabbed: true,
            y_grab_offset: 0.0,
            vertices: None,
            motion: None,
        }
    }

    pub fn to_object(&self) -> SceneObject {
        let platform = Platform {
            kind: self.kind,
            can_be_grabbed: self.can_be_grabbed,
            y_grab_offset: self.y_grab_offset,
        };
        let object = SceneObject::new(self.name.clone(), self.x, self.y, self.width, self.height)
            .with_platform(platform);
        match &self.vertices {
            Some(vertices) => object.with_polygon(vertices.clone()),
            None => object,
        }
    }

    fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: &str| LevelError::InvalidPlatform {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        match &self.vertices {
            Some(vertices) if !is_convex(vertices) => {
                return Err(invalid("vertices must form a convex polygon"));
            },
            None if self.width <= 0.0 || self.height <= 0.0 => {
                return Err(invalid("width and height must be positive"));
            },
            _ => {},
        }
        if let Some(motion) = self.motion
            && (motion.distance <= 0.0 || (motion.vx == 0.0 && motion.vy == 0.0))
        {
            return Err(invalid("motion needs a velocity and a positive distance"));
        }
        Ok(())
    }
}

impl CharacterSpec {
    pub fn to_object(&self) -> SceneObject {
        SceneObject::new(self.name.clone(), self.x, self.y, self.width, self.height)
    }

    fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: String| LevelError::InvalidCharacter {
            name: self.name.clone(),
            reason,
        };
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(invalid("width and height must be positive".to_string()));
        }
        self.controller
            .validate()
            .map_err(|e| invalid(e.to_string()))
    }
}

impl LevelConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, LevelError> {
        let level: Self = toml::from_str(contents).map_err(|e| LevelError::Parse(e.to_string()))?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, LevelError> {
        let contents = std::fs::read_to_string(path).map_err(|e| LevelError::Io(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, LevelError> {
        toml::to_string(self).map_err(|e| LevelError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        self.platforms.iter().try_for_each(PlatformSpec::validate)?;
        self.characters.iter().try_for_each(CharacterSpec::validate)
    }
}

#[derive(Debug)]
pub enum LevelError {
    Io(String),
    Parse(String),
    InvalidPlatform { name: String, reason: String },
    InvalidCharacter { name: String, reason: String },
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read level: {e}"),
            Self::Parse(e) => write!(f, "invalid level: {e}"),
            Self::InvalidPlatform { name, reason } => write!(f, "platform {name:?}: {reason}"),
            Self::InvalidCharacter { name, reason } => write!(f, "character {name:?}: {reason}"),
        }
    }
}

impl std::error::Error for LevelError {}
