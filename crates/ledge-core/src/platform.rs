use serde::{Deserialize, Serialize};

use crate::geometry::{Aabb, Point, is_convex};

/// How a platform interacts with a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    /// Solid from every side.
    #[default]
    Obstacle,
    /// Solid only when landed on from above.
    JumpThru,
    /// Never solid; can be climbed.
    Ladder,
}

/// Platform data attached to a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    pub kind: PlatformKind,
    /// Whether characters may hang on the top-left or top-right corner.
    pub can_be_grabbed: bool,
    /// Vertical offset of the grab line relative to the platform's top.
    pub y_grab_offset: f64,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            kind: PlatformKind::Obstacle,
            can_be_grabbed: true,
            y_grab_offset: 0.0,
        }
    }
}

impl Platform {
    pub fn obstacle() -> Self {
        Self::default()
    }

    pub fn jump_thru() -> Self {
        Self {
            kind: PlatformKind::JumpThru,
            ..Self::default()
        }
    }

    pub fn ladder() -> Self {
        Self {
            kind: PlatformKind::Ladder,
            ..Self::default()
        }
    }

    pub fn with_grab(mut self, can_be_grabbed: bool, y_grab_offset: f64) -> Self {
        self.can_be_grabbed = can_be_grabbed;
        self.y_grab_offset = y_grab_offset;
        self
    }

    pub fn is_ladder(&self) -> bool {
        self.kind == PlatformKind::Ladder
    }

    pub fn is_jump_thru(&self) -> bool {
        self.kind == PlatformKind::JumpThru
    }
}

/// Collision shape of an object, in coordinates local to its position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Hitbox {
    /// Axis-aligned box covering `[0, width] x [0, height]`.
    #[default]
    Rectangle,
    /// Convex polygon.
    Polygon { vertices: Vec<Point> },
}

/// An object placed in a [`World`](crate::world::World).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub hitbox: Hitbox,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl SceneObject {
    pub fn new(name: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            hitbox: Hitbox::Rectangle,
            platform: None,
            active: true,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_polygon(mut self, vertices: Vec<Point>) -> Self {
        self.hitbox = Hitbox::Polygon { vertices };
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Hitbox vertices translated to world coordinates.
    pub fn world_polygon(&self) -> Vec<Point> {
        match &self.hitbox {
            Hitbox::Rectangle => vec![
                Point::new(self.x, self.y),
                Point::new(self.x + self.width, self.y),
                Point::new(self.x + self.width, self.y + self.height),
                Point::new(self.x, self.y + self.height),
            ],
            Hitbox::Polygon { vertices } => vertices
                .iter()
                .map(|v| v.offset(self.x, self.y))
                .collect(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.world_polygon())
    }

    /// Whether the hitbox can take part in separating-axis tests.
    pub fn has_valid_hitbox(&self) -> bool {
        match &self.hitbox {
            Hitbox::Rectangle => self.width > 0.0 && self.height > 0.0,
            Hitbox::Polygon { vertices } => is_convex(vertices),
        }
    }
}
