use ledge_core::{ObjectKey, Platform, PlatformKind, PlatformWorld, Point};

/// Characters rest exactly on top of floors, so touching edges never count.
const IGNORE_TOUCHING_EDGES: bool = true;

/// A platform returned by the broad phase this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Nearby {
    pub key: ObjectKey,
    pub platform: Platform,
}

/// The controlled object for the duration of one update.
///
/// Caches the position so the many intermediate reads are cheap, and writes
/// every change straight through to the world so collision queries always
/// see the current position.
pub(crate) struct Body<'w, W: PlatformWorld> {
    world: &'w mut W,
    key: ObjectKey,
    pos: Point,
}

impl<'w, W: PlatformWorld> Body<'w, W> {
    pub fn new(world: &'w mut W, key: ObjectKey) -> Option<Self> {
        let pos = world.position(key)?;
        Some(Self { world, key, pos })
    }

    pub fn x(&self) -> f64 {
        self.pos.x
    }

    pub fn y(&self) -> f64 {
        self.pos.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.pos.x = x;
        self.world.set_position(self.key, self.pos);
    }

    pub fn set_y(&mut self, y: f64) {
        self.pos.y = y;
        self.world.set_position(self.key, self.pos);
    }

    pub fn height(&self) -> f64 {
        self.world.height(self.key).unwrap_or(0.0)
    }

    pub fn position_of(&self, other: ObjectKey) -> Option<Point> {
        self.world.position(other)
    }

    pub fn overlaps(&self, other: ObjectKey) -> bool {
        self.world.overlaps(self.key, other, IGNORE_TOUCHING_EDGES)
    }

    /// Rebuild the nearby platform list for a movement envelope.
    pub fn query_nearby(&self, max_distance: f64, keys: &mut Vec<ObjectKey>, out: &mut Vec<Nearby>) {
        self.world.platforms_near(self.key, max_distance, keys);
        out.clear();
        out.extend(keys.iter().filter_map(|&key| {
            self.world
                .platform(key)
                .map(|platform| Nearby { key, platform })
        }));
    }

    /// Any non-ladder platform overlapping the body, except `except`.
    pub fn colliding_with(
        &self,
        nearby: &[Nearby],
        except: Option<ObjectKey>,
        exclude_jump_thru: bool,
    ) -> bool {
        nearby.iter().any(|n| {
            Some(n.key) != except
                && match n.platform.kind {
                    PlatformKind::Ladder => false,
                    PlatformKind::JumpThru => !exclude_jump_thru,
                    PlatformKind::Obstacle => true,
                }
                && self.overlaps(n.key)
        })
    }

    /// Any non-ladder platform overlapping the body that is not in `excluded`.
    pub fn colliding_excluding(&self, nearby: &[Nearby], excluded: &[ObjectKey]) -> bool {
        nearby.iter().any(|n| {
            !n.platform.is_ladder() && !excluded.contains(&n.key) && self.overlaps(n.key)
        })
    }

    /// First platform the body could stand on or grab: not a ladder and not a
    /// jump-thru it was already inside of.
    pub fn colliding_platform(
        &self,
        nearby: &[Nearby],
        overlapped_jump_thru: &[ObjectKey],
    ) -> Option<Nearby> {
        nearby
            .iter()
            .find(|n| {
                !n.platform.is_ladder()
                    && !overlapped_jump_thru.contains(&n.key)
                    && self.overlaps(n.key)
            })
            .copied()
    }

    pub fn overlapped_jump_thru(&self, nearby: &[Nearby], out: &mut Vec<ObjectKey>) {
        out.clear();
        out.extend(
            nearby
                .iter()
                .filter(|n| n.platform.is_jump_thru() && self.overlaps(n.key))
                .map(|n| n.key),
        );
    }

    pub fn overlaps_ladder(&self, nearby: &[Nearby]) -> bool {
        nearby
            .iter()
            .any(|n| n.platform.is_ladder() && self.overlaps(n.key))
    }

    /// Push the body out of every nearby obstacle. Jump-thrus and ladders are
    /// left alone.
    pub fn separate_from_obstacles(&mut self, nearby: &[Nearby], scratch: &mut Vec<ObjectKey>) -> bool {
        scratch.clear();
        scratch.extend(
            nearby
                .iter()
                .filter(|n| n.platform.kind == PlatformKind::Obstacle)
                .map(|n| n.key),
        );
        if scratch.is_empty() {
            return false;
        }
        let moved = self
            .world
            .separate_from(self.key, scratch, IGNORE_TOUCHING_EDGES);
        if moved && let Some(pos) = self.world.position(self.key) {
            self.pos = pos;
        }
        moved
    }
}

/// Whether a ledge at `platform_y` (its grab line) lies strictly between the
/// character's grab line before and after a vertical move of `delta_y`.
pub fn grab_line_crossed(owner_y: f64, y_grab_offset: f64, delta_y: f64, platform_y: f64) -> bool {
    let y1 = owner_y + y_grab_offset;
    let y2 = y1 + delta_y;
    (y1 < platform_y && platform_y < y2) || (y2 < platform_y && platform_y < y1)
}

/// Ledge grab test for a platform at `platform_position`.
pub fn can_grab(
    platform: &Platform,
    platform_position: Point,
    owner_y: f64,
    y_grab_offset: f64,
    delta_y: f64,
) -> bool {
    platform.can_be_grabbed
        && grab_line_crossed(
            owner_y,
            y_grab_offset,
            delta_y,
            platform_position.y + platform.y_grab_offset,
        )
}
