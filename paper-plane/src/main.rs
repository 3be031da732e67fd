//! Headless autoplay smoke harness
//!
//! Runs a seeded simulation with the autopilot for a fixed number of ticks
//! and prints a JSON run summary. `PLANE_SEED` and `PLANE_TICKS` override
//! the defaults.

use paper_plane::autoplay::autopilot_input;
use paper_plane::consts::{SIM_DT, TICK_HZ};
use paper_plane::sim::{GameEvent, GameState, tick};

fn main() {
    env_logger::init();

    let seed = env_u64("PLANE_SEED", 2024);
    let max_ticks = env_u64("PLANE_TICKS", u64::from(TICK_HZ) * 120);

    let mut state = GameState::new(seed);
    let mut hits = 0u32;
    let mut near_misses = 0u32;
    let mut rings = 0u32;

    log::info!("autoplay start seed={seed} max_ticks={max_ticks}");

    for _ in 0..max_ticks {
        let input = autopilot_input(&state);
        tick(&mut state, &input, SIM_DT);
        for event in state.drain_events() {
            match event {
                GameEvent::Hit { .. } | GameEvent::ShieldDown | GameEvent::LifeLost { .. } => {
                    hits += 1;
                }
                GameEvent::NearMiss => near_misses += 1,
                GameEvent::RingCollected => rings += 1,
                GameEvent::PhaseStarted(kind) => {
                    log::debug!("phase started: {}", kind.label());
                }
                GameEvent::GameOver { score, distance } => {
                    log::info!("game over score={score} distance={distance:.0}");
                }
                _ => {}
            }
        }
        if state.is_over() {
            break;
        }
    }

    let summary = serde_json::json!({
        "seed": seed,
        "snapshot": state.snapshot(),
        "hits": hits,
        "nearMisses": near_misses,
        "ringsCollected": rings,
    });
    println!("{summary}");
}

fn env_u64(name: &str, fallback: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(fallback)
}
