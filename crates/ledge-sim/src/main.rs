use tracing_subscriber::EnvFilter;

use ledge_core::PlatformWorld;
use ledge_sim::autopilot::generate_autopilot_input;
use ledge_sim::config::SimConfig;
use ledge_sim::level::LevelConfig;
use ledge_sim::level_gen::generate_level;
use ledge_sim::{Scene, SceneEvent};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SimConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        std::process::exit(1);
    }

    let level = match &config.level {
        Some(path) => match LevelConfig::from_path(path) {
            Ok(level) => level,
            Err(e) => {
                tracing::error!(path = %path, "{e}");
                std::process::exit(1);
            },
        },
        None => generate_level(config.seed),
    };
    let mut scene = match Scene::from_level(&level) {
        Ok(scene) => scene,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        },
    };

    let Some(runner) = scene.characters().next() else {
        tracing::warn!("Level has no characters, nothing to simulate");
        return;
    };
    let name = scene
        .world()
        .get(runner)
        .map(|obj| obj.name.clone())
        .unwrap_or_default();
    tracing::info!(
        character = %name,
        platforms = level.platforms.len(),
        ticks = config.ticks,
        "Simulation starting"
    );

    let dt = config.dt();
    let mut landings = 0u64;
    let mut jumps = 0u64;
    for _ in 0..config.ticks {
        let input = generate_autopilot_input(&scene, runner);
        scene.set_input(runner, input);
        for event in scene.step(dt) {
            match event {
                SceneEvent::Landed { platform, .. } => {
                    landings += 1;
                    let on = scene.world().get(platform).map_or("?", |obj| obj.name.as_str());
                    tracing::info!(tick = scene.tick(), platform = on, "Landed");
                },
                SceneEvent::Jumped { .. } => {
                    jumps += 1;
                    tracing::info!(tick = scene.tick(), "Jumped");
                },
                other => tracing::info!(tick = scene.tick(), event = ?other),
            }
        }
        if config.log_every > 0
            && scene.tick() % config.log_every == 0
            && let Some(pos) = scene.world().position(runner)
        {
            tracing::debug!(tick = scene.tick(), x = pos.x, y = pos.y, "Position");
        }
    }

    let end = scene.world().position(runner).unwrap_or_default();
    tracing::info!(
        character = %name,
        x = end.x,
        y = end.y,
        elapsed = scene.elapsed(),
        landings,
        jumps,
        "Simulation finished"
    );
}
