use ledge_core::geometry::round_half_up;
use ledge_core::{ObjectKey, PlatformWorld, Point};

use crate::config::{ControllerConfig, SlopeAngleError, slope_climbing_factor};
use crate::input::ControlInput;
use crate::probe::{Body, Nearby, can_grab};

/// Platform the character is attached to, with the position it had when last
/// seen. The difference to its current position is the motion to inherit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub key: ObjectKey,
    pub last: Point,
}

/// What the character is supported by. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Contact {
    #[default]
    Airborne,
    Floor(Anchor),
    Ladder,
    Grabbing(Anchor),
}

/// Kinematic platformer movement for one object.
///
/// The controller owns only movement state. Geometry lives in the
/// [`PlatformWorld`] passed to [`update`](Self::update) each tick, and the
/// controlled object is referred to by key.
#[derive(Debug, Clone)]
pub struct PlatformerController {
    owner: ObjectKey,
    config: ControllerConfig,
    slope_climbing_factor: f64,
    enabled: bool,

    contact: Contact,
    current_speed: f64,
    current_fall_speed: f64,
    current_jump_speed: f64,
    jumping: bool,
    can_jump: bool,
    time_since_jump_start: f64,
    jump_key_held_since_jump_start: bool,
    old_height: f64,
    has_really_moved: bool,

    nearby: Vec<Nearby>,
    overlapped_jump_thru: Vec<ObjectKey>,
    scratch: Vec<ObjectKey>,
}

impl PlatformerController {
    /// Create a controller for `owner`. An out-of-range slope angle is logged
    /// and replaced by the default.
    pub fn new(owner: ObjectKey, mut config: ControllerConfig) -> Self {
        let slope_climbing_factor = match slope_climbing_factor(config.slope_max_angle) {
            Ok(factor) => factor,
            Err(e) => {
                tracing::warn!(error = %e, "Using default slope angle");
                config.slope_max_angle = ControllerConfig::default().slope_max_angle;
                slope_climbing_factor(config.slope_max_angle).unwrap_or(1.0)
            },
        };
        Self {
            owner,
            config,
            slope_climbing_factor,
            enabled: true,
            contact: Contact::Airborne,
            current_speed: 0.0,
            current_fall_speed: 0.0,
            current_jump_speed: 0.0,
            jumping: false,
            can_jump: false,
            time_since_jump_start: 0.0,
            jump_key_held_since_jump_start: false,
            old_height: 0.0,
            has_really_moved: false,
            nearby: Vec::new(),
            overlapped_jump_thru: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Advance the character by `dt` seconds with this tick's input.
    ///
    /// Does nothing while disabled or once the owner has been removed.
    pub fn update<W: PlatformWorld>(&mut self, world: &mut W, input: ControlInput, dt: f64) {
        if !self.enabled {
            tracing::trace!(owner = ?self.owner, "Controller disabled, skipping update");
            return;
        }
        let Some(mut body) = Body::new(world, self.owner) else {
            tracing::trace!(owner = ?self.owner, "Owner is gone, skipping update");
            return;
        };

        let mut delta_x = self.integrate_speed(input, dt);
        let mut delta_y = 0.0;

        self.stick_to_floor_on_resize(&mut body);
        self.refresh_nearby(&mut body, delta_x.abs().max(self.config.max_falling_speed * dt));
        self.inherit_platform_motion(&body, &mut delta_x, &mut delta_y);

        if body.separate_from_obstacles(&self.nearby, &mut self.scratch) {
            self.can_jump = true;
        }

        let old_x = body.x();
        self.move_x(&mut body, delta_x, old_x);

        self.update_ladder(&mut body, input, dt, &mut delta_y);
        self.apply_gravity(dt, &mut delta_y);
        self.try_grab(&mut body, delta_x, &mut delta_y);
        self.update_grab_and_jump(&body, input);
        self.sustain_jump(dt, &mut delta_y);
        self.follow_floor(&mut body, delta_x, old_x);
        self.move_y(&mut body, delta_y);
        self.reacquire_floor(&mut body, delta_y);

        self.has_really_moved = (body.x() - old_x).abs() >= 1.0;
    }

    fn integrate_speed(&mut self, input: ControlInput, dt: f64) -> f64 {
        let acceleration = self.config.acceleration * dt;
        if input.left {
            self.current_speed -= acceleration;
        }
        if input.right {
            self.current_speed += acceleration;
        }
        if input.left == input.right {
            let was_positive = self.current_speed > 0.0;
            let deceleration = self.config.deceleration * dt;
            self.current_speed -= if was_positive { deceleration } else { -deceleration };
            // Never decelerate through zero.
            if was_positive && self.current_speed < 0.0 {
                self.current_speed = 0.0;
            }
            if !was_positive && self.current_speed > 0.0 {
                self.current_speed = 0.0;
            }
        }
        let max = self.config.max_speed;
        self.current_speed = self.current_speed.clamp(-max, max);
        self.current_speed * dt
    }

    /// Keep the feet on the floor when the hitbox height changes.
    fn stick_to_floor_on_resize<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>) {
        let height = body.height();
        if let Contact::Floor(anchor) = self.contact
            && self.old_height != height
        {
            body.set_y(anchor.last.y - height - 1.0);
        }
        self.old_height = height;
    }

    fn refresh_nearby<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>, max_distance: f64) {
        body.query_nearby(max_distance, &mut self.scratch, &mut self.nearby);
        body.overlapped_jump_thru(&self.nearby, &mut self.overlapped_jump_thru);

        let still_near = |key: ObjectKey| self.nearby.iter().any(|n| n.key == key);
        match self.contact {
            Contact::Floor(anchor) if !still_near(anchor.key) => {
                tracing::debug!(owner = ?self.owner, floor = ?anchor.key, "Lost floor platform");
                self.contact = Contact::Airborne;
            },
            Contact::Grabbing(anchor) if !still_near(anchor.key) => {
                tracing::debug!(owner = ?self.owner, platform = ?anchor.key, "Lost grabbed platform");
                self.contact = Contact::Airborne;
            },
            _ => {},
        }
    }

    /// Ride a moving floor. A grabbed platform's motion replaces any other.
    fn inherit_platform_motion<W: PlatformWorld>(
        &self,
        body: &Body<'_, W>,
        delta_x: &mut f64,
        delta_y: &mut f64,
    ) {
        match self.contact {
            Contact::Floor(anchor) => {
                if let Some(pos) = body.position_of(anchor.key) {
                    *delta_x += pos.x - anchor.last.x;
                    *delta_y += pos.y - anchor.last.y;
                }
            },
            Contact::Grabbing(anchor) => {
                if let Some(pos) = body.position_of(anchor.key) {
                    *delta_x = pos.x - anchor.last.x;
                    *delta_y = pos.y - anchor.last.y;
                }
            },
            Contact::Airborne | Contact::Ladder => {},
        }
    }

    fn move_x<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>, delta_x: f64, old_x: f64) {
        if delta_x == 0.0 {
            return;
        }
        let floor = self.floor_platform();
        let on_floor = floor.is_some();
        body.set_x(body.x() + delta_x);

        // Jump-thrus never block horizontally.
        let mut try_rounding = true;
        while body.colliding_with(&self.nearby, floor, true) {
            if (delta_x > 0.0 && body.x() <= old_x) || (delta_x < 0.0 && body.x() >= old_x) {
                body.set_x(old_x);
                break;
            }

            // Step over slightly misaligned floors.
            if on_floor {
                body.set_y(body.y() - 1.0);
                if !body.colliding_with(&self.nearby, floor, true) {
                    break;
                }
                body.set_y(body.y() + 1.0);
            }

            if try_rounding {
                body.set_x(round_half_up(body.x()));
                try_rounding = false;
            } else {
                let back = if delta_x > 0.0 { -1.0 } else { 1.0 };
                body.set_x(round_half_up(body.x()) + back);
            }
            self.current_speed = 0.0;
        }
    }

    fn update_ladder<W: PlatformWorld>(
        &mut self,
        body: &mut Body<'_, W>,
        input: ControlInput,
        dt: f64,
        delta_y: &mut f64,
    ) {
        if input.ladder && body.overlaps_ladder(&self.nearby) {
            if !self.is_on_ladder() {
                tracing::debug!(owner = ?self.owner, "Entered ladder");
            }
            self.can_jump = true;
            self.current_jump_speed = 0.0;
            self.current_fall_speed = 0.0;
            self.contact = Contact::Ladder;
        }

        if !self.is_on_ladder() {
            return;
        }
        if input.release_ladder {
            tracing::debug!(owner = ?self.owner, "Released ladder");
            self.contact = Contact::Airborne;
            return;
        }
        let climb = self.config.ladder_climbing_speed * dt;
        if input.up {
            *delta_y -= climb;
        }
        if input.down {
            *delta_y += climb;
        }
        if !body.overlaps_ladder(&self.nearby) {
            tracing::debug!(owner = ?self.owner, "Reached end of ladder");
            self.contact = Contact::Airborne;
        }
    }

    fn apply_gravity(&mut self, dt: f64, delta_y: &mut f64) {
        if self.contact != Contact::Airborne {
            return;
        }
        let max = self.config.max_falling_speed;
        self.current_fall_speed = (self.current_fall_speed + self.config.gravity * dt).min(max);
        *delta_y += self.current_fall_speed * dt;
        *delta_y = delta_y.min(max * dt);
    }

    /// Hang on a ledge in the direction of travel.
    fn try_grab<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>, delta_x: f64, delta_y: &mut f64) {
        if !self.config.can_grab_platforms
            || delta_x == 0.0
            || matches!(self.contact, Contact::Ladder | Contact::Floor(_))
        {
            return;
        }

        let reach = if delta_x > 0.0 {
            self.config.x_grab_tolerance
        } else {
            -self.config.x_grab_tolerance
        };
        body.set_x(body.x() + reach);
        let candidate = body
            .colliding_platform(&self.nearby, &self.overlapped_jump_thru)
            .and_then(|n| Some((n, body.position_of(n.key)?)))
            .filter(|(n, pos)| {
                can_grab(&n.platform, *pos, body.y(), self.config.y_grab_offset, *delta_y)
            });
        body.set_x(body.x() - reach);

        let Some((ledge, ledge_pos)) = candidate else {
            return;
        };
        let old_y = body.y();
        body.set_y(ledge_pos.y + ledge.platform.y_grab_offset - self.config.y_grab_offset);
        if body.colliding_with(&self.nearby, None, true) {
            body.set_y(old_y);
            return;
        }
        tracing::debug!(owner = ?self.owner, platform = ?ledge.key, "Grabbed platform");
        self.contact = Contact::Grabbing(Anchor {
            key: ledge.key,
            last: ledge_pos,
        });
        *delta_y = 0.0;
    }

    fn update_grab_and_jump<W: PlatformWorld>(&mut self, body: &Body<'_, W>, input: ControlInput) {
        let releasing = input.release || input.down;
        if let Contact::Grabbing(anchor) = &mut self.contact {
            if releasing {
                tracing::debug!(owner = ?self.owner, platform = ?anchor.key, "Released platform");
                self.contact = Contact::Airborne;
            } else {
                self.can_jump = true;
                self.current_jump_speed = 0.0;
                self.current_fall_speed = 0.0;
                if let Some(pos) = body.position_of(anchor.key) {
                    anchor.last = pos;
                }
            }
        }

        if self.can_jump && input.jump {
            tracing::debug!(owner = ?self.owner, "Jump");
            self.jumping = true;
            self.can_jump = false;
            self.time_since_jump_start = 0.0;
            self.jump_key_held_since_jump_start = true;
            self.current_jump_speed = self.config.jump_speed;
            self.current_fall_speed = 0.0;
            // Leaving the floor is decided after the vertical move, so a steep
            // floor cannot swallow the character.
            if matches!(self.contact, Contact::Ladder | Contact::Grabbing(_)) {
                self.contact = Contact::Airborne;
            }
        }

        if !input.jump {
            self.jump_key_held_since_jump_start = false;
        }
    }

    fn sustain_jump(&mut self, dt: f64, delta_y: &mut f64) {
        if !self.jumping {
            return;
        }
        self.time_since_jump_start += dt;
        *delta_y -= self.current_jump_speed * dt;

        let sustained = self.jump_key_held_since_jump_start
            && self.time_since_jump_start < self.config.jump_sustain_time;
        if !sustained {
            self.current_jump_speed -= self.config.gravity * dt;
        }
        if self.current_jump_speed < 0.0 {
            self.current_jump_speed = 0.0;
            self.jumping = false;
        }
    }

    /// Climb up or follow down the floor's slope.
    fn follow_floor<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>, delta_x: f64, old_x: f64) {
        let Contact::Floor(anchor) = self.contact else {
            return;
        };
        let budget = (delta_x * self.slope_climbing_factor).abs();

        if body.overlaps(anchor.key) {
            // Floor rises under the character.
            let old_y = body.y();
            let mut step = 0.0;
            let mut too_steep = false;
            loop {
                if step >= budget.floor() {
                    body.set_y(body.y() - (budget - step));
                    too_steep = body.overlaps(anchor.key);
                    break;
                }
                body.set_y(body.y() - 1.0);
                step += 1.0;
                if !body.overlaps(anchor.key) {
                    break;
                }
            }
            if too_steep {
                body.set_x(old_x);
                body.set_y(old_y);
            }
        } else {
            // Floor is flat or falls away.
            let old_y = body.y();
            let start = body.y() + 1.0;
            body.set_y(if self.config.round_coordinates {
                round_half_up(start)
            } else {
                start
            });
            let mut step = 0.0;
            let mut left_floor = false;
            while !body.colliding_with(&self.nearby, None, false) {
                if step > budget {
                    left_floor = true;
                    break;
                }
                body.set_y(body.y() + 1.0);
                step += 1.0;
            }
            if left_floor {
                body.set_y(old_y);
            } else {
                body.set_y(body.y() - 1.0);
            }
        }
    }

    fn move_y<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let old_y = body.y();
        body.set_y(body.y() + delta_y);

        // Jump-thrus block only downward motion, and only when not already inside them.
        loop {
            let blocked = if delta_y < 0.0 {
                body.colliding_with(&self.nearby, None, true)
            } else {
                body.colliding_excluding(&self.nearby, &self.overlapped_jump_thru)
            };
            if !blocked {
                break;
            }
            self.jumping = false;
            self.current_jump_speed = 0.0;
            if (delta_y > 0.0 && body.y() <= old_y) || (delta_y < 0.0 && body.y() >= old_y) {
                body.set_y(old_y);
                break;
            }
            let back = if delta_y > 0.0 { -1.0 } else { 1.0 };
            body.set_y(body.y().floor() + back);
        }
    }

    /// Decide what supports the character for the next tick.
    fn reacquire_floor<W: PlatformWorld>(&mut self, body: &mut Body<'_, W>, delta_y: f64) {
        body.overlapped_jump_thru(&self.nearby, &mut self.overlapped_jump_thru);
        if self.is_on_ladder() {
            return;
        }

        let old_y = body.y();
        body.set_y(old_y + 1.0);

        if let Contact::Floor(anchor) = &mut self.contact
            && body.overlaps(anchor.key)
        {
            if let Some(pos) = body.position_of(anchor.key) {
                anchor.last = pos;
            }
        } else {
            // Never land while still moving up, or a jump passing the top of
            // a jump-thru would stick to it.
            let can_land = delta_y >= 0.0;
            let landing = body
                .colliding_platform(&self.nearby, &self.overlapped_jump_thru)
                .filter(|_| can_land)
                .and_then(|n| Some((n.key, body.position_of(n.key)?)));

            if let Some((key, last)) = landing {
                tracing::debug!(owner = ?self.owner, floor = ?key, "Landed");
                self.contact = Contact::Floor(Anchor { key, last });
                self.can_jump = true;
                self.jumping = false;
                self.current_jump_speed = 0.0;
                self.current_fall_speed = 0.0;
            } else {
                self.can_jump = false;
                if let Contact::Floor(anchor) = self.contact {
                    tracing::debug!(owner = ?self.owner, floor = ?anchor.key, "Left floor");
                    self.contact = Contact::Airborne;
                }
            }
        }

        body.set_y(old_y);
    }

    // --- State queries ---

    pub fn owner(&self) -> ObjectKey {
        self.owner
    }

    pub fn contact(&self) -> Contact {
        self.contact
    }

    pub fn is_on_floor(&self) -> bool {
        matches!(self.contact, Contact::Floor(_))
    }

    pub fn is_on_ladder(&self) -> bool {
        self.contact == Contact::Ladder
    }

    pub fn is_grabbing_platform(&self) -> bool {
        matches!(self.contact, Contact::Grabbing(_))
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Airborne and not rising faster than falling.
    pub fn is_falling(&self) -> bool {
        self.contact == Contact::Airborne
            && (!self.jumping || self.current_jump_speed < self.current_fall_speed)
    }

    /// Airborne without a jump in progress, e.g. after walking off a ledge.
    pub fn is_falling_without_jumping(&self) -> bool {
        self.contact == Contact::Airborne && !self.jumping
    }

    pub fn is_moving(&self) -> bool {
        (self.has_really_moved && self.current_speed != 0.0)
            || self.current_jump_speed != 0.0
            || self.current_fall_speed != 0.0
    }

    pub fn can_jump(&self) -> bool {
        self.can_jump
    }

    pub fn floor_platform(&self) -> Option<ObjectKey> {
        match self.contact {
            Contact::Floor(anchor) => Some(anchor.key),
            _ => None,
        }
    }

    pub fn grabbed_platform(&self) -> Option<ObjectKey> {
        match self.contact {
            Contact::Grabbing(anchor) => Some(anchor.key),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A disabled controller ignores updates and keeps its state untouched.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    // --- Speeds ---

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn set_current_speed(&mut self, speed: f64) {
        self.current_speed = speed;
    }

    pub fn current_fall_speed(&self) -> f64 {
        self.current_fall_speed
    }

    /// Clamped at zero.
    pub fn set_current_fall_speed(&mut self, speed: f64) {
        self.current_fall_speed = speed.max(0.0);
    }

    pub fn current_jump_speed(&self) -> f64 {
        self.current_jump_speed
    }

    /// Clamped at zero.
    pub fn set_current_jump_speed(&mut self, speed: f64) {
        self.current_jump_speed = speed.max(0.0);
    }

    // --- Jump grants ---

    /// Allow the next jump regardless of contact, e.g. for a double jump.
    pub fn grant_jump(&mut self) {
        self.can_jump = true;
    }

    pub fn revoke_jump(&mut self) {
        self.can_jump = false;
    }

    /// Forbid jumping only while in the air.
    pub fn revoke_air_jump(&mut self) {
        if self.is_jumping() || self.is_falling() {
            self.can_jump = false;
        }
    }

    // --- Configuration ---

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Apply every field that differs from the current configuration. The
    /// slope angle is applied last; if it is invalid everything else still
    /// takes effect.
    pub fn reconfigure(&mut self, config: ControllerConfig) -> Result<(), SlopeAngleError> {
        let slope_max_angle = config.slope_max_angle;
        if config.can_grab_platforms != self.config.can_grab_platforms {
            self.set_can_grab_platforms(config.can_grab_platforms);
        }
        self.config = ControllerConfig {
            slope_max_angle: self.config.slope_max_angle,
            ..config
        };
        if slope_max_angle != self.config.slope_max_angle {
            self.set_slope_max_angle(slope_max_angle)?;
        }
        Ok(())
    }

    pub fn slope_climbing_factor(&self) -> f64 {
        self.slope_climbing_factor
    }

    pub fn slope_max_angle(&self) -> f64 {
        self.config.slope_max_angle
    }

    /// Rejects angles outside `[0, 90)` and keeps the previous one.
    pub fn set_slope_max_angle(&mut self, angle: f64) -> Result<(), SlopeAngleError> {
        let factor = slope_climbing_factor(angle)?;
        self.config.slope_max_angle = angle;
        self.slope_climbing_factor = factor;
        Ok(())
    }

    pub fn can_grab_platforms(&self) -> bool {
        self.config.can_grab_platforms
    }

    /// Disabling grabbing lets go of any held ledge.
    pub fn set_can_grab_platforms(&mut self, enable: bool) {
        self.config.can_grab_platforms = enable;
        if !enable && self.is_grabbing_platform() {
            self.contact = Contact::Airborne;
        }
    }
}

macro_rules! config_accessors {
    ($($field:ident: $ty:ty => $setter:ident),* $(,)?) => {
        impl PlatformerController {
            $(
                pub fn $field(&self) -> $ty {
                    self.config.$field
                }

                pub fn $setter(&mut self, value: $ty) {
                    self.config.$field = value;
                }
            )*
        }
    };
}

config_accessors! {
    gravity: f64 => set_gravity,
    max_falling_speed: f64 => set_max_falling_speed,
    acceleration: f64 => set_acceleration,
    deceleration: f64 => set_deceleration,
    max_speed: f64 => set_max_speed,
    jump_speed: f64 => set_jump_speed,
    jump_sustain_time: f64 => set_jump_sustain_time,
    ladder_climbing_speed: f64 => set_ladder_climbing_speed,
    y_grab_offset: f64 => set_y_grab_offset,
    x_grab_tolerance: f64 => set_x_grab_tolerance,
    round_coordinates: bool => set_round_coordinates,
}
