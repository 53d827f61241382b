use ledge_controller::{ControlInput, ControlSignal};
use ledge_core::geometry::Aabb;
use ledge_core::{ObjectKey, PlatformKind, PlatformWorld, World};

use crate::Scene;

/// Scene tick rate the look-ahead is tuned for.
const TICK_RATE: f64 = 60.0;

/// How many ticks of travel ahead to check for walls and pits.
const LOOK_AHEAD_TICKS: f64 = 8.0;

/// Look-ahead distance when standing still.
const MIN_LOOK_AHEAD: f64 = 8.0;

/// A drop deeper than this counts as a pit.
const PIT_DEPTH: f64 = 24.0;

/// Generate input that runs a character to the right through a level.
///
/// Jumps over walls and pits, climbs any ladder it touches, and jumps up from
/// grabbed ledges.
pub fn generate_autopilot_input(scene: &Scene, character: ObjectKey) -> ControlInput {
    let (Some(controller), Some(body)) = (scene.controller(character), scene.world().get(character))
    else {
        return ControlInput::default();
    };
    if !controller.is_enabled() {
        return ControlInput::default();
    }

    let mut input = ControlInput::default().with(ControlSignal::Right);
    if controller.is_on_ladder() {
        input.press(ControlSignal::Up);
        return input;
    }
    if controller.is_grabbing_platform() {
        input.press(ControlSignal::Jump);
        return input;
    }

    let world = scene.world();
    if touches_ladder(world, character) {
        input.press(ControlSignal::Ladder);
        input.press(ControlSignal::Up);
        return input;
    }

    let look_ahead =
        (controller.current_speed().abs() * LOOK_AHEAD_TICKS / TICK_RATE).max(MIN_LOOK_AHEAD);
    let bounds = body.aabb();
    if controller.is_on_floor()
        && (blocked_ahead(world, character, &bounds, look_ahead)
            || pit_ahead(world, character, &bounds, look_ahead))
    {
        input.press(ControlSignal::Jump);
    }
    input
}

fn platforms(
    world: &World,
    character: ObjectKey,
) -> impl Iterator<Item = (ObjectKey, PlatformKind, Aabb)> + '_ {
    world.iter().filter_map(move |(key, obj)| {
        let platform = obj.platform?;
        (key != character && obj.active).then(|| (key, platform.kind, obj.aabb()))
    })
}

fn touches_ladder(world: &World, character: ObjectKey) -> bool {
    platforms(world, character)
        .any(|(key, kind, _)| kind == PlatformKind::Ladder && world.overlaps(character, key, true))
}

/// An obstacle in front of the body, above its feet.
fn blocked_ahead(world: &World, character: ObjectKey, bounds: &Aabb, look_ahead: f64) -> bool {
    let probe = Aabb {
        min_x: bounds.max_x,
        min_y: bounds.min_y,
        max_x: bounds.max_x + look_ahead,
        max_y: bounds.max_y - 1.0,
    };
    platforms(world, character)
        .any(|(_, kind, aabb)| kind == PlatformKind::Obstacle && aabb.intersects(&probe))
}

/// Nothing to stand on in front of the body.
fn pit_ahead(world: &World, character: ObjectKey, bounds: &Aabb, look_ahead: f64) -> bool {
    let x = bounds.max_x + look_ahead;
    let probe = Aabb {
        min_x: x,
        min_y: bounds.max_y,
        max_x: x,
        max_y: bounds.max_y + PIT_DEPTH,
    };
    !platforms(world, character)
        .any(|(_, kind, aabb)| kind != PlatformKind::Ladder && aabb.intersects(&probe))
}
