use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use ledge_controller::ControllerConfig;
use ledge_core::{PlatformKind, Point};

use crate::level::{CharacterSpec, LevelConfig, Motion, PlatformSpec};

/// Grid unit. Every generated coordinate is a multiple of it.
const UNIT: f64 = 16.0;
/// Chunk width in world units (each procedural section is this wide).
const CHUNK_WIDTH: f64 = 10.0 * UNIT;
/// Number of chunks in a generated level.
const NUM_CHUNKS: u32 = 10;
/// Ground thickness. The ground's top edge is at y = 0.
const GROUND_DEPTH: f64 = 2.0 * UNIT;

/// Section layouts a chunk can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Pit,
    Ledges,
    Ladder,
    Ramp,
    Lift,
}

const PATTERNS: [Pattern; 5] = [
    Pattern::Pit,
    Pattern::Ledges,
    Pattern::Ladder,
    Pattern::Ramp,
    Pattern::Lift,
];

/// Generate a deterministic level from a seed.
///
/// The first chunk is flat ground with the character above it. The next five
/// chunks use every pattern once in a seeded order so each platform kind is
/// present; the rest are drawn at random.
pub fn generate_level(seed: u64) -> LevelConfig {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut level = LevelConfig::default();

    level.platforms.push(ground("ground-0", 0.0, CHUNK_WIDTH));

    let mut order = PATTERNS;
    order.shuffle(&mut rng);
    for chunk_idx in 1..NUM_CHUNKS {
        let pattern = match order.get(chunk_idx as usize - 1) {
            Some(&pattern) => pattern,
            None => PATTERNS[rng.random_range(0..PATTERNS.len())],
        };
        let base_x = f64::from(chunk_idx) * CHUNK_WIDTH;
        generate_chunk(&mut level, &mut rng, pattern, base_x, chunk_idx);
    }

    level.characters.push(CharacterSpec {
        name: "runner".to_string(),
        x: 2.0 * UNIT,
        y: -4.0 * UNIT,
        width: UNIT,
        height: 2.0 * UNIT,
        controller: ControllerConfig {
            can_grab_platforms: true,
            ..ControllerConfig::default()
        },
    });

    tracing::debug!(seed, platforms = level.platforms.len(), "Generated level");
    level
}

fn ground(name: impl Into<String>, x: f64, width: f64) -> PlatformSpec {
    PlatformSpec::new(name, PlatformKind::Obstacle, x, 0.0, width, GROUND_DEPTH)
}

fn generate_chunk(
    level: &mut LevelConfig,
    rng: &mut StdRng,
    pattern: Pattern,
    base_x: f64,
    chunk_idx: u32,
) {
    let platforms = &mut level.platforms;
    match pattern {
        Pattern::Pit => {
            // Ground on both sides of a jumpable gap.
            let pit_start = f64::from(rng.random_range(3u8..6)) * UNIT;
            let pit_width = f64::from(rng.random_range(2u8..5)) * UNIT;
            platforms.push(ground(format!("ground-{chunk_idx}a"), base_x, pit_start));
            let rest = pit_start + pit_width;
            platforms.push(ground(
                format!("ground-{chunk_idx}b"),
                base_x + rest,
                CHUNK_WIDTH - rest,
            ));
        },
        Pattern::Ledges => {
            // One-way ledges stepping up.
            platforms.push(ground(format!("ground-{chunk_idx}"), base_x, CHUNK_WIDTH));
            let count = rng.random_range(1u8..3);
            for i in 0..count {
                let height = f64::from(rng.random_range(3u8..6) + 3 * i) * UNIT;
                let start = f64::from(rng.random_range(1u8..3) + 4 * i) * UNIT;
                let width = f64::from(rng.random_range(3u8..5)) * UNIT;
                platforms.push(PlatformSpec::new(
                    format!("ledge-{chunk_idx}-{i}"),
                    PlatformKind::JumpThru,
                    base_x + start,
                    -height,
                    width,
                    UNIT / 2.0,
                ));
            }
        },
        Pattern::Ladder => {
            // A tall block with a ladder against its left face.
            platforms.push(ground(format!("ground-{chunk_idx}"), base_x, CHUNK_WIDTH));
            let height = f64::from(rng.random_range(6u8..10)) * UNIT;
            let block_x = base_x + 5.0 * UNIT;
            platforms.push(PlatformSpec::new(
                format!("tower-{chunk_idx}"),
                PlatformKind::Obstacle,
                block_x,
                -height,
                4.0 * UNIT,
                height,
            ));
            platforms.push(PlatformSpec::new(
                format!("ladder-{chunk_idx}"),
                PlatformKind::Ladder,
                block_x - 1.5 * UNIT,
                -height,
                1.5 * UNIT,
                height,
            ));
        },
        Pattern::Ramp => {
            // 45 degree slope up to a plateau.
            platforms.push(ground(format!("ground-{chunk_idx}"), base_x, CHUNK_WIDTH));
            let rise = f64::from(rng.random_range(2u8..5)) * UNIT;
            let ramp_x = base_x + 2.0 * UNIT;
            let mut ramp = PlatformSpec::new(
                format!("ramp-{chunk_idx}"),
                PlatformKind::Obstacle,
                ramp_x,
                0.0,
                rise,
                rise,
            );
            ramp.can_be_grabbed = false;
            ramp.vertices = Some(vec![
                Point::new(0.0, 0.0),
                Point::new(rise, -rise),
                Point::new(rise, 0.0),
            ]);
            platforms.push(ramp);
            platforms.push(PlatformSpec::new(
                format!("plateau-{chunk_idx}"),
                PlatformKind::Obstacle,
                ramp_x + rise,
                -rise,
                4.0 * UNIT,
                rise,
            ));
        },
        Pattern::Lift => {
            // A wide pit crossed by a shuttling platform.
            let pit_start = 2.0 * UNIT;
            let pit_width = f64::from(rng.random_range(6u8..8)) * UNIT;
            platforms.push(ground(format!("ground-{chunk_idx}a"), base_x, pit_start));
            let rest = pit_start + pit_width;
            platforms.push(ground(
                format!("ground-{chunk_idx}b"),
                base_x + rest,
                CHUNK_WIDTH - rest,
            ));
            let lift_width = 3.0 * UNIT;
            let mut lift = PlatformSpec::new(
                format!("lift-{chunk_idx}"),
                PlatformKind::Obstacle,
                base_x + pit_start,
                -UNIT,
                lift_width,
                UNIT / 2.0,
            );
            lift.motion = Some(Motion {
                vx: f64::from(rng.random_range(2u8..5)) * UNIT,
                vy: 0.0,
                distance: pit_width - lift_width,
            });
            platforms.push(lift);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scene;

    #[test]
    fn deterministic_generation() {
        assert_eq!(
            generate_level(42),
            generate_level(42),
            "Same seed must produce same level"
        );
    }

    #[test]
    fn different_seeds_different_levels() {
        assert_ne!(
            generate_level(42),
            generate_level(123),
            "Different seeds should produce different levels"
        );
    }

    #[test]
    fn every_platform_kind_is_present() {
        for seed in [0, 42, 123, 9999] {
            let level = generate_level(seed);
            let platforms = &level.platforms;
            assert!(platforms.iter().any(|p| p.kind == PlatformKind::JumpThru), "seed {seed}");
            assert!(platforms.iter().any(|p| p.kind == PlatformKind::Ladder), "seed {seed}");
            assert!(platforms.iter().any(|p| p.vertices.is_some()), "seed {seed}");
            assert!(platforms.iter().any(|p| p.motion.is_some()), "seed {seed}");
        }
    }

    #[test]
    fn generated_levels_are_valid() {
        for seed in 0..20 {
            let level = generate_level(seed);
            assert!(level.validate().is_ok(), "seed {seed}");
            assert!(Scene::from_level(&level).is_ok(), "seed {seed}");
        }
    }

    #[test]
    fn spawn_is_above_first_ground() {
        let level = generate_level(42);
        let first = &level.platforms[0];
        let runner = &level.characters[0];
        assert!(runner.x >= first.x && runner.x + runner.width <= first.x + first.width);
        assert!(runner.y + runner.height <= first.y);
    }

    #[test]
    fn runner_lands_on_first_ground() {
        let mut scene = Scene::from_level(&generate_level(7)).unwrap();
        let runner = scene.characters().next().unwrap();
        for _ in 0..60 {
            scene.step(1.0 / 60.0);
        }
        let controller = scene.controller(runner).unwrap();
        assert!(controller.is_on_floor());
        assert_eq!(
            controller.floor_platform(),
            scene.world().find("ground-0")
        );
    }

    #[test]
    fn generated_level_survives_toml() {
        let level = generate_level(5);
        let text = level.to_toml_string().unwrap();
        assert_eq!(LevelConfig::from_toml_str(&text).unwrap(), level);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn any_seed_builds_a_valid_scene(seed in any::<u64>()) {
                let level = generate_level(seed);
                prop_assert!(Scene::from_level(&level).is_ok());
                let right_edge = level
                    .platforms
                    .iter()
                    .map(|p| p.x + p.width)
                    .fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(right_edge <= f64::from(NUM_CHUNKS) * CHUNK_WIDTH);
            }
        }
    }
}
