pub mod geometry;
pub mod platform;
pub mod world;
pub mod world_trait;

pub use geometry::Point;
pub use platform::{Hitbox, Platform, PlatformKind, SceneObject};
pub use world::World;
pub use world_trait::PlatformWorld;

slotmap::new_key_type! {
    /// Generational handle to an object in a [`World`].
    pub struct ObjectKey;
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::geometry::Point;
    use crate::platform::{Platform, SceneObject};
    use crate::world::World;
    use crate::world_trait::PlatformWorld;
    use crate::ObjectKey;

    /// Worlds that tests can populate. Lets the contract suite below run
    /// against any [`PlatformWorld`] implementation.
    pub trait WorldBuilder: PlatformWorld {
        fn add(&mut self, object: SceneObject) -> ObjectKey;
    }

    impl WorldBuilder for World {
        fn add(&mut self, object: SceneObject) -> ObjectKey {
            self.insert(object)
        }
    }

    /// Add a rectangular obstacle.
    pub fn add_obstacle<W: WorldBuilder>(world: &mut W, x: f64, y: f64, w: f64, h: f64) -> ObjectKey {
        world.add(SceneObject::new("obstacle", x, y, w, h).with_platform(Platform::obstacle()))
    }

    /// Add a rectangular jump-thru platform.
    pub fn add_jump_thru<W: WorldBuilder>(world: &mut W, x: f64, y: f64, w: f64, h: f64) -> ObjectKey {
        world.add(SceneObject::new("jump_thru", x, y, w, h).with_platform(Platform::jump_thru()))
    }

    /// Add a ladder.
    pub fn add_ladder<W: WorldBuilder>(world: &mut W, x: f64, y: f64, w: f64, h: f64) -> ObjectKey {
        world.add(SceneObject::new("ladder", x, y, w, h).with_platform(Platform::ladder()))
    }

    /// Add an obstacle shaped like a right triangle whose hypotenuse rises
    /// from `(x, y)` to `(x + run, y - rise)`.
    pub fn add_ramp<W: WorldBuilder>(world: &mut W, x: f64, y: f64, run: f64, rise: f64) -> ObjectKey {
        world.add(
            SceneObject::new("ramp", x, y, run, rise)
                .with_platform(Platform::obstacle())
                .with_polygon(vec![
                    Point::new(0.0, 0.0),
                    Point::new(run, -rise),
                    Point::new(run, 0.0),
                ]),
        )
    }

    /// Add a non-platform object such as a character.
    pub fn add_body<W: WorldBuilder>(world: &mut W, x: f64, y: f64, w: f64, h: f64) -> ObjectKey {
        world.add(SceneObject::new("body", x, y, w, h))
    }

    // ================================================================
    // PlatformWorld contract tests
    // ================================================================
    // Every PlatformWorld implementation must pass these. Call them from the
    // implementation's own #[cfg(test)] module with an empty world.

    /// Objects resting edge-to-edge overlap only when touching edges count.
    pub fn contract_touching_edges<W: WorldBuilder>(world: &mut W) {
        let floor = add_obstacle(world, 0.0, 0.0, 100.0, 32.0);
        let body = add_body(world, 10.0, -20.0, 10.0, 20.0);
        assert!(
            !world.overlaps(body, floor, true),
            "touching edges must be ignored when requested"
        );
        assert!(
            world.overlaps(body, floor, false),
            "touching edges must count when not ignored"
        );
    }

    /// separate_from must leave the object clear of every obstacle.
    pub fn contract_separation_clears_overlap<W: WorldBuilder>(world: &mut W) {
        let floor = add_obstacle(world, 0.0, 0.0, 100.0, 32.0);
        let body = add_body(world, 10.0, -17.0, 10.0, 20.0);
        assert!(world.separate_from(body, &[floor], true), "overlap must move the object");
        assert!(
            !world.overlaps(body, floor, true),
            "object must be clear after separation"
        );
        assert!(
            !world.separate_from(body, &[floor], true),
            "second separation must be a no-op"
        );
    }

    /// The broad phase never reports the object itself or non-platforms.
    pub fn contract_broad_phase_excludes_self<W: WorldBuilder>(world: &mut W) {
        let floor = add_obstacle(world, 0.0, 0.0, 100.0, 32.0);
        let body = add_body(world, 10.0, -20.0, 10.0, 20.0);
        let other_body = add_body(world, 12.0, -20.0, 10.0, 20.0);
        let mut near = Vec::new();
        world.platforms_near(body, 50.0, &mut near);
        assert!(near.contains(&floor), "nearby platform must be reported");
        assert!(!near.contains(&body), "object must not be its own neighbour");
        assert!(
            !near.contains(&other_body),
            "non-platform objects must not be reported"
        );
    }

    /// Positions written through the trait read back unchanged.
    pub fn contract_position_roundtrip<W: WorldBuilder>(world: &mut W) {
        let body = add_body(world, 0.0, 0.0, 10.0, 20.0);
        world.set_position(body, Point::new(3.5, -7.25));
        assert_eq!(world.position(body), Some(Point::new(3.5, -7.25)));
        assert_eq!(world.height(body), Some(20.0));
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn world_passes_contract_suite() {
        contract_touching_edges(&mut World::new());
        contract_separation_clears_overlap(&mut World::new());
        contract_broad_phase_excludes_self(&mut World::new());
        contract_position_roundtrip(&mut World::new());
    }
}
