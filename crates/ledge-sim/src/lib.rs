pub mod autopilot;
pub mod config;
pub mod level;
pub mod level_gen;

use serde::{Deserialize, Serialize};

use ledge_controller::{ControlInput, ControlSignal, Contact, ControllerConfig, PlatformerController};
use ledge_core::{ObjectKey, PlatformWorld, SceneObject, World};

use level::{LevelConfig, LevelError, Motion};

/// A state change of one character during a [`Scene::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    Landed {
        character: ObjectKey,
        platform: ObjectKey,
    },
    LeftFloor {
        character: ObjectKey,
    },
    Jumped {
        character: ObjectKey,
    },
    GrabbedPlatform {
        character: ObjectKey,
        platform: ObjectKey,
    },
    ReleasedPlatform {
        character: ObjectKey,
    },
    EnteredLadder {
        character: ObjectKey,
    },
    LeftLadder {
        character: ObjectKey,
    },
}

impl SceneEvent {
    pub fn character(&self) -> ObjectKey {
        match *self {
            Self::Landed { character, .. }
            | Self::LeftFloor { character }
            | Self::Jumped { character }
            | Self::GrabbedPlatform { character, .. }
            | Self::ReleasedPlatform { character }
            | Self::EnteredLadder { character }
            | Self::LeftLadder { character } => character,
        }
    }
}

/// What the event diff looks at.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    contact: Contact,
    jumping: bool,
}

impl Snapshot {
    fn of(controller: &PlatformerController) -> Self {
        Self {
            contact: controller.contact(),
            jumping: controller.is_jumping(),
        }
    }

    fn floor(&self) -> Option<ObjectKey> {
        match self.contact {
            Contact::Floor(anchor) => Some(anchor.key),
            _ => None,
        }
    }

    fn grabbed(&self) -> Option<ObjectKey> {
        match self.contact {
            Contact::Grabbing(anchor) => Some(anchor.key),
            _ => None,
        }
    }

    fn on_ladder(&self) -> bool {
        self.contact == Contact::Ladder
    }

    /// Append the transitions from `before` to `self`. Releases come before
    /// acquisitions so a floor-to-floor hop reads as left then landed.
    fn diff(&self, before: &Snapshot, character: ObjectKey, events: &mut Vec<SceneEvent>) {
        if before.floor().is_some() && before.floor() != self.floor() {
            events.push(SceneEvent::LeftFloor { character });
        }
        if before.grabbed().is_some() && before.grabbed() != self.grabbed() {
            events.push(SceneEvent::ReleasedPlatform { character });
        }
        if before.on_ladder() && !self.on_ladder() {
            events.push(SceneEvent::LeftLadder { character });
        }
        if self.jumping && !before.jumping {
            events.push(SceneEvent::Jumped { character });
        }
        if let Some(platform) = self.floor()
            && before.floor() != Some(platform)
        {
            events.push(SceneEvent::Landed {
                character,
                platform,
            });
        }
        if let Some(platform) = self.grabbed()
            && before.grabbed() != Some(platform)
        {
            events.push(SceneEvent::GrabbedPlatform {
                character,
                platform,
            });
        }
        if self.on_ladder() && !before.on_ladder() {
            events.push(SceneEvent::EnteredLadder { character });
        }
    }
}

/// A character and the input latched for its next update.
#[derive(Debug, Clone)]
struct Character {
    controller: PlatformerController,
    pending: ControlInput,
}

/// A platform moving back and forth along a straight path.
#[derive(Debug, Clone, Copy)]
struct Mover {
    key: ObjectKey,
    motion: Motion,
    travelled: f64,
    forward: bool,
}

impl Mover {
    fn advance(&mut self, world: &mut World, dt: f64) {
        let Some(pos) = world.position(self.key) else {
            return;
        };
        let speed = self.motion.vx.hypot(self.motion.vy);
        if speed == 0.0 {
            return;
        }
        let distance = (speed * dt).min(self.motion.distance - self.travelled);
        let sign = if self.forward { 1.0 } else { -1.0 };
        let scale = sign * distance / speed;
        world.set_position(
            self.key,
            pos.offset(self.motion.vx * scale, self.motion.vy * scale),
        );
        self.travelled += distance;
        if self.travelled >= self.motion.distance {
            self.travelled = 0.0;
            self.forward = !self.forward;
        }
    }
}

/// A world, the characters moving through it, and its moving platforms.
///
/// Each [`step`](Self::step) moves the platforms first, then updates the
/// characters in the order they were added, so a character always sees its
/// floor's position for the current tick.
#[derive(Debug, Default)]
pub struct Scene {
    world: World,
    characters: Vec<Character>,
    movers: Vec<Mover>,
    elapsed: f64,
    tick: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from a validated level description.
    pub fn from_level(level: &LevelConfig) -> Result<Self, LevelError> {
        level.validate()?;
        let mut scene = Self::new();
        for spec in &level.platforms {
            let object = spec.to_object();
            match spec.motion {
                Some(motion) => scene.add_moving_platform(object, motion),
                None => scene.add_platform(object),
            };
        }
        for spec in &level.characters {
            scene.add_character(spec.to_object(), spec.controller.clone());
        }
        tracing::debug!(
            platforms = level.platforms.len(),
            characters = level.characters.len(),
            "Scene built from level"
        );
        Ok(scene)
    }

    pub fn add_platform(&mut self, object: SceneObject) -> ObjectKey {
        if object.platform.is_none() {
            tracing::warn!(name = %object.name, "Added platform has no platform role");
        }
        self.world.insert(object)
    }

    pub fn add_moving_platform(&mut self, object: SceneObject, motion: Motion) -> ObjectKey {
        let key = self.add_platform(object);
        self.movers.push(Mover {
            key,
            motion,
            travelled: 0.0,
            forward: true,
        });
        key
    }

    pub fn add_character(&mut self, object: SceneObject, config: ControllerConfig) -> ObjectKey {
        let key = self.world.insert(object);
        self.characters.push(Character {
            controller: PlatformerController::new(key, config),
            pending: ControlInput::default(),
        });
        key
    }

    /// Remove any object. Characters standing on or hanging from it lose
    /// that contact on their next update.
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<SceneObject> {
        self.characters.retain(|c| c.controller.owner() != key);
        self.movers.retain(|m| m.key != key);
        self.world.remove(key)
    }

    pub fn set_object_active(&mut self, key: ObjectKey, active: bool) {
        self.world.set_active(key, active);
    }

    /// Returns false when `key` is not a character.
    pub fn set_character_enabled(&mut self, key: ObjectKey, enabled: bool) -> bool {
        match self.controller_mut(key) {
            Some(controller) => {
                controller.set_enabled(enabled);
                true
            },
            None => false,
        }
    }

    /// Latch one control for the character's next update.
    pub fn press(&mut self, key: ObjectKey, signal: ControlSignal) -> bool {
        match self.character_mut(key) {
            Some(character) => {
                character.pending.press(signal);
                true
            },
            None => false,
        }
    }

    /// Merge `input` into the character's latched controls.
    pub fn set_input(&mut self, key: ObjectKey, input: ControlInput) -> bool {
        match self.character_mut(key) {
            Some(character) => {
                character.pending = character.pending.merged(input);
                true
            },
            None => false,
        }
    }

    pub fn controller(&self, key: ObjectKey) -> Option<&PlatformerController> {
        self.characters
            .iter()
            .find(|c| c.controller.owner() == key)
            .map(|c| &c.controller)
    }

    pub fn controller_mut(&mut self, key: ObjectKey) -> Option<&mut PlatformerController> {
        self.character_mut(key).map(|c| &mut c.controller)
    }

    fn character_mut(&mut self, key: ObjectKey) -> Option<&mut Character> {
        self.characters
            .iter_mut()
            .find(|c| c.controller.owner() == key)
    }

    /// Character keys in update order.
    pub fn characters(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.characters.iter().map(|c| c.controller.owner())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Advance the scene by `dt` seconds and report what changed.
    ///
    /// Every character's latched input is consumed, including that of
    /// disabled characters.
    pub fn step(&mut self, dt: f64) -> Vec<SceneEvent> {
        for mover in &mut self.movers {
            mover.advance(&mut self.world, dt);
        }

        let mut events = Vec::new();
        for character in &mut self.characters {
            let input = std::mem::take(&mut character.pending);
            let before = Snapshot::of(&character.controller);
            character.controller.update(&mut self.world, input, dt);
            Snapshot::of(&character.controller).diff(
                &before,
                character.controller.owner(),
                &mut events,
            );
        }

        self.elapsed += dt;
        self.tick += 1;
        events
    }

    /// Number of steps taken.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use ledge_core::{Platform, Point};

    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn floor_object(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
        SceneObject::new("floor", x, y, w, h).with_platform(Platform::obstacle())
    }

    fn hero(x: f64, y: f64) -> SceneObject {
        SceneObject::new("hero", x, y, 10.0, 20.0)
    }

    fn run(scene: &mut Scene, ticks: usize) -> Vec<SceneEvent> {
        (0..ticks).flat_map(|_| scene.step(DT)).collect()
    }

    fn settled_scene() -> (Scene, ObjectKey, ObjectKey) {
        let mut scene = Scene::new();
        let floor = scene.add_platform(floor_object(0.0, -10.0, 60.0, 32.0));
        let hero = scene.add_character(hero(0.0, -100.0), ControllerConfig::default());
        let events = run(&mut scene, 60);
        assert_eq!(
            events,
            vec![SceneEvent::Landed {
                character: hero,
                platform: floor
            }]
        );
        (scene, floor, hero)
    }

    #[test]
    fn dropped_character_lands_once() {
        let (mut scene, _, hero) = settled_scene();
        assert_eq!(scene.world().position(hero), Some(Point::new(0.0, -30.0)));
        assert!(run(&mut scene, 30).is_empty());
        assert_eq!(scene.tick(), 90);
        assert!((scene.elapsed() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn jump_reports_jump_and_leaving_floor() {
        let (mut scene, floor, hero) = settled_scene();
        assert!(scene.press(hero, ControlSignal::Jump));
        let events = scene.step(DT);
        assert_eq!(
            events,
            vec![
                SceneEvent::LeftFloor { character: hero },
                SceneEvent::Jumped { character: hero },
            ]
        );
        let events = run(&mut scene, 120);
        assert_eq!(
            events,
            vec![SceneEvent::Landed {
                character: hero,
                platform: floor
            }]
        );
    }

    #[test]
    fn latched_input_is_consumed_by_one_step() {
        let (mut scene, _, hero) = settled_scene();
        scene.set_input(hero, ControlInput::default().with(ControlSignal::Right));
        scene.step(DT);
        let after_one = scene.world().position(hero).map(|p| p.x);
        run(&mut scene, 10);
        assert!(after_one.is_some_and(|x| x > 0.0));
        // Decelerates back to rest without further input.
        assert_eq!(scene.controller(hero).map(|c| c.current_speed()), Some(0.0));
    }

    #[test]
    fn unknown_character_is_rejected() {
        let (mut scene, floor, _) = settled_scene();
        assert!(!scene.press(floor, ControlSignal::Left));
        assert!(!scene.set_character_enabled(floor, false));
        assert!(scene.controller(floor).is_none());
    }

    #[test]
    fn disabled_character_ignores_input() {
        let (mut scene, _, hero) = settled_scene();
        assert!(scene.set_character_enabled(hero, false));
        scene.press(hero, ControlSignal::Jump);
        assert!(scene.step(DT).is_empty());
        assert!(scene.set_character_enabled(hero, true));
        // The jump was consumed while disabled.
        assert!(scene.step(DT).is_empty());
        assert_eq!(scene.world().position(hero), Some(Point::new(0.0, -30.0)));
    }

    #[test]
    fn removing_the_floor_drops_the_character() {
        let (mut scene, floor, hero) = settled_scene();
        assert!(scene.remove_object(floor).is_some());
        let events = scene.step(DT);
        assert_eq!(events, vec![SceneEvent::LeftFloor { character: hero }]);
        assert!(scene.controller(hero).is_some_and(|c| c.is_falling()));
    }

    #[test]
    fn removing_a_character_drops_its_controller() {
        let (mut scene, _, hero) = settled_scene();
        scene.remove_object(hero);
        assert!(scene.controller(hero).is_none());
        assert_eq!(scene.characters().count(), 0);
        assert!(scene.step(DT).is_empty());
    }

    #[test]
    fn deactivated_floor_is_ignored() {
        let (mut scene, floor, hero) = settled_scene();
        scene.set_object_active(floor, false);
        let events = scene.step(DT);
        assert_eq!(events, vec![SceneEvent::LeftFloor { character: hero }]);
    }

    #[test]
    fn moving_platform_ping_pongs() {
        let mut scene = Scene::new();
        let lift = scene.add_moving_platform(
            floor_object(0.0, 0.0, 20.0, 5.0),
            Motion {
                vx: 40.0,
                vy: 0.0,
                distance: 30.0,
            },
        );
        let xs: Vec<f64> = (0..7)
            .map(|_| {
                scene.step(0.25);
                scene.world().position(lift).map_or(f64::NAN, |p| p.x)
            })
            .collect();
        assert_eq!(xs, vec![10.0, 20.0, 30.0, 20.0, 10.0, 0.0, 10.0]);
    }

    #[test]
    fn character_rides_moving_platform() {
        let mut scene = Scene::new();
        let lift = scene.add_moving_platform(
            floor_object(0.0, 0.0, 100.0, 20.0),
            Motion {
                vx: 60.0,
                vy: 0.0,
                distance: 1000.0,
            },
        );
        let hero = scene.add_character(hero(20.0, -40.0), ControllerConfig::default());
        for _ in 0..60 {
            if scene.controller(hero).is_some_and(|c| c.is_on_floor()) {
                break;
            }
            scene.step(DT);
        }
        assert_eq!(scene.controller(hero).and_then(|c| c.floor_platform()), Some(lift));

        let start = |scene: &Scene, key| scene.world().position(key).map_or(f64::NAN, |p| p.x);
        let (hero_x, lift_x) = (start(&scene, hero), start(&scene, lift));
        run(&mut scene, 10);
        let hero_moved = start(&scene, hero) - hero_x;
        let lift_moved = start(&scene, lift) - lift_x;
        assert!((hero_moved - lift_moved).abs() < 1e-6, "{hero_moved} vs {lift_moved}");
        assert!(lift_moved > 9.0);
    }

    #[test]
    fn ladder_enter_and_leave_events() {
        let mut scene = Scene::new();
        scene.add_platform(floor_object(0.0, 0.0, 200.0, 32.0));
        scene.add_platform(
            SceneObject::new("ladder", 50.0, -100.0, 20.0, 100.0).with_platform(Platform::ladder()),
        );
        let hero = scene.add_character(hero(55.0, -25.0), ControllerConfig::default());
        run(&mut scene, 60);
        assert!(scene.controller(hero).is_some_and(|c| c.is_on_floor()));

        scene.press(hero, ControlSignal::Ladder);
        let events = scene.step(DT);
        assert_eq!(
            events,
            vec![
                SceneEvent::LeftFloor { character: hero },
                SceneEvent::EnteredLadder { character: hero },
            ]
        );

        let mut events = Vec::new();
        for _ in 0..60 {
            scene.press(hero, ControlSignal::Up);
            events.extend(scene.step(DT));
        }
        assert_eq!(events.first(), Some(&SceneEvent::LeftLadder { character: hero }));
    }

    #[test]
    fn grab_and_release_events() {
        let config = ControllerConfig {
            gravity: 900.0,
            max_falling_speed: 1500.0,
            acceleration: 500.0,
            max_speed: 500.0,
            jump_speed: 1500.0,
            can_grab_platforms: true,
            ..ControllerConfig::default()
        };
        let mut scene = Scene::new();
        let floor = scene.add_platform(floor_object(0.0, -10.0, 60.0, 32.0));
        let hero = scene.add_character(hero(62.0, -20.0), config);
        if let Some(c) = scene.controller_mut(hero) {
            c.set_current_fall_speed(1500.0);
        }
        let mut events = Vec::new();
        for _ in 0..35 {
            scene.press(hero, ControlSignal::Left);
            events.extend(scene.step(DT));
        }
        assert_eq!(
            events,
            vec![SceneEvent::GrabbedPlatform {
                character: hero,
                platform: floor
            }]
        );
        scene.press(hero, ControlSignal::Down);
        assert_eq!(
            scene.step(DT),
            vec![SceneEvent::ReleasedPlatform { character: hero }]
        );
    }

    #[test]
    fn events_serialize_for_logs() {
        let (_, floor, hero) = settled_scene();
        let event = SceneEvent::Landed {
            character: hero,
            platform: floor,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SceneEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.character(), hero);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn mover_stays_on_its_path(
                vx in -200.0f64..200.0,
                vy in -200.0f64..200.0,
                distance in 1.0f64..300.0,
                ticks in 1usize..400,
            ) {
                prop_assume!(vx.hypot(vy) > 1.0);
                let mut scene = Scene::new();
                let lift = scene.add_moving_platform(
                    floor_object(0.0, 0.0, 10.0, 10.0),
                    Motion { vx, vy, distance },
                );
                for _ in 0..ticks {
                    scene.step(DT);
                    let pos = scene.world().position(lift).unwrap();
                    let along = (pos.x * vx + pos.y * vy) / vx.hypot(vy);
                    prop_assert!(along >= -1e-6 && along <= distance + 1e-6, "along = {}", along);
                }
            }
        }
    }

    #[test]
    fn from_level_rejects_invalid_levels() {
        let level = LevelConfig::from_toml_str(
            r#"
[[platforms]]
name = "ground"
x = 0.0
y = 0.0
width = 100.0
height = 10.0

[[characters]]
name = "hero"
x = 10.0
y = -40.0
width = 10.0
height = 20.0
"#,
        )
        .unwrap();
        let scene = Scene::from_level(&level).unwrap();
        assert_eq!(scene.world().len(), 2);
        assert_eq!(scene.characters().count(), 1);

        let mut broken = level.clone();
        broken.characters[0].width = 0.0;
        assert!(matches!(
            Scene::from_level(&broken),
            Err(LevelError::InvalidCharacter { .. })
        ));
    }
}
