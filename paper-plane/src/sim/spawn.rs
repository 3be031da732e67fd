//! Phase spawn layouts
//!
//! Each phase fires its spawn action once when it begins. "Spawning" only
//! claims inactive pooled instances and repositions them; an exhausted pool
//! skips the remainder of the layout.

use glam::Vec3;
use rand::Rng;

use super::phase::PhaseKind;
use super::state::{EntityKind, GameState};
use crate::consts::*;

/// Fire the one-time spawn action for the phase that just began.
pub fn spawn_phase(state: &mut GameState) {
    let spacing = BASE_OBSTACLE_SPACING * state.difficulty.spacing_scale();
    match state.phase {
        PhaseKind::Buildings => spawn_building_row(state, spacing),
        PhaseKind::Walls => spawn_wall_run(state, spacing),
        PhaseKind::Rings => spawn_ring_line(state),
        PhaseKind::Coins => spawn_coin_arc(state),
        PhaseKind::Bonus => {
            spawn_ring_line(state);
            spawn_coin_arc(state);
        }
        PhaseKind::Breather => spawn_dust_field(state),
        PhaseKind::Mixed => {
            spawn_building_row(state, spacing * 1.5);
            spawn_coin_arc(state);
            spawn_gust(state);
        }
        PhaseKind::BossGauntlet => spawn_gauntlet(state, spacing),
    }
}

const BASE_OBSTACLE_SPACING: f32 = 60.0;

fn claim_at(state: &mut GameState, kind: EntityKind, pos: Vec3, half: Vec3) -> bool {
    let phase_seq = state.phase_seq;
    let pool = state.pools.for_kind_mut(kind);
    let Some(index) = pool.claim() else {
        return false;
    };
    if let Some(entity) = pool.get_mut(index) {
        entity.pos = pos;
        entity.half = half;
        entity.phase_seq = phase_seq;
    }
    true
}

fn lane_offset(state: &mut GameState) -> f32 {
    state
        .rng
        .random_range(-LANE_HALF_WIDTH * 0.8..LANE_HALF_WIDTH * 0.8)
}

/// Staggered skyline: buildings alternate sides, leaving a flyable slalom.
fn spawn_building_row(state: &mut GameState, spacing: f32) {
    for step in 0..6 {
        let side = if step % 2 == 0 { -1.0 } else { 1.0 };
        let jitter: f32 = state.rng.random_range(-8.0..8.0);
        let height: f32 = state.rng.random_range(12.0..26.0);
        let pos = Vec3::new(
            side * (LANE_HALF_WIDTH * 0.5) + jitter,
            height / 2.0,
            SPAWN_Z - step as f32 * spacing,
        );
        if !claim_at(
            state,
            EntityKind::Building,
            pos,
            Vec3::new(6.0, height / 2.0, 6.0),
        ) {
            break;
        }
    }
}

/// Full-width walls with one randomly placed gap each.
fn spawn_wall_run(state: &mut GameState, spacing: f32) {
    for step in 0..4 {
        let gap_center = lane_offset(state);
        let z = SPAWN_Z - step as f32 * spacing * 1.5;
        let gap_half = 8.0;
        // Two segments on either side of the gap.
        let left_width = (gap_center - gap_half) - (-LANE_HALF_WIDTH);
        if left_width > 2.0 {
            let center = -LANE_HALF_WIDTH + left_width / 2.0;
            if !claim_at(
                state,
                EntityKind::Wall,
                Vec3::new(center, 10.0, z),
                Vec3::new(left_width / 2.0, 10.0, 2.0),
            ) {
                return;
            }
        }
        let right_width = LANE_HALF_WIDTH - (gap_center + gap_half);
        if right_width > 2.0 {
            let center = LANE_HALF_WIDTH - right_width / 2.0;
            if !claim_at(
                state,
                EntityKind::Wall,
                Vec3::new(center, 10.0, z),
                Vec3::new(right_width / 2.0, 10.0, 2.0),
            ) {
                return;
            }
        }
    }
}

/// A drifting line of rings to thread.
fn spawn_ring_line(state: &mut GameState) {
    let mut x = lane_offset(state);
    let mut y: f32 = state.rng.random_range(8.0..20.0);
    for step in 0..5 {
        x = (x + state.rng.random_range(-10.0..10.0))
            .clamp(-LANE_HALF_WIDTH * 0.8, LANE_HALF_WIDTH * 0.8);
        y = (y + state.rng.random_range(-4.0..4.0)).clamp(ALTITUDE_MIN + 4.0, ALTITUDE_MAX - 4.0);
        let pos = Vec3::new(x, y, SPAWN_Z - step as f32 * 45.0);
        if !claim_at(state, EntityKind::Ring, pos, Vec3::new(4.0, 4.0, 1.5)) {
            break;
        }
    }
}

/// Coins sweep across the lane in a shallow sine arc.
fn spawn_coin_arc(state: &mut GameState) {
    let start = lane_offset(state);
    let amplitude: f32 = state.rng.random_range(6.0..14.0);
    for step in 0..10 {
        let t = step as f32 / 9.0;
        let pos = Vec3::new(
            (start + amplitude * (t * std::f32::consts::PI).sin())
                .clamp(-LANE_HALF_WIDTH, LANE_HALF_WIDTH),
            10.0 + 4.0 * (t * std::f32::consts::TAU).sin(),
            SPAWN_Z - step as f32 * 18.0,
        );
        if !claim_at(state, EntityKind::Coin, pos, Vec3::new(1.5, 1.5, 1.5)) {
            break;
        }
    }
}

/// Cosmetic dust; breathers stay empty of obstacles.
fn spawn_dust_field(state: &mut GameState) {
    for _ in 0..20 {
        let pos = Vec3::new(
            state.rng.random_range(-LANE_HALF_WIDTH..LANE_HALF_WIDTH),
            state.rng.random_range(ALTITUDE_MIN..ALTITUDE_MAX),
            state.rng.random_range(SPAWN_Z..0.0),
        );
        if !claim_at(state, EntityKind::Dust, pos, Vec3::splat(0.3)) {
            break;
        }
    }
}

fn spawn_gust(state: &mut GameState) {
    let pos = Vec3::new(lane_offset(state), 12.0, SPAWN_Z * 0.6);
    claim_at(state, EntityKind::Gust, pos, Vec3::new(10.0, 10.0, 4.0));
}

/// Milestone set piece: dense alternating buildings and walls, debris in
/// the gaps, a ring line as the reward thread.
fn spawn_gauntlet(state: &mut GameState, spacing: f32) {
    let tight = (spacing * 0.7).max(30.0);
    spawn_building_row(state, tight);
    spawn_wall_run(state, tight);
    for step in 0..6 {
        let pos = Vec3::new(
            lane_offset(state),
            state.rng.random_range(6.0..18.0),
            SPAWN_Z - step as f32 * tight - 15.0,
        );
        if !claim_at(state, EntityKind::Debris, pos, Vec3::splat(2.5)) {
            break;
        }
    }
    spawn_ring_line(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameState;

    #[test]
    fn spawn_claims_only_pooled_instances() {
        let mut state = GameState::new(3);
        state.phase = PhaseKind::BossGauntlet;
        spawn_phase(&mut state);
        assert!(state.pools.buildings.active_count() > 0);
        assert!(state.pools.walls.active_count() > 0);
        assert!(state.pools.debris.active_count() > 0);
        assert!(state.pools.rings.active_count() > 0);
        assert!(state.pools.buildings.active_count() <= state.pools.buildings.capacity());
    }

    #[test]
    fn exhausted_pool_skips_spawns() {
        let mut state = GameState::new(3);
        while state.pools.buildings.claim().is_some() {}
        state.phase = PhaseKind::Buildings;
        spawn_phase(&mut state);
        assert_eq!(
            state.pools.buildings.active_count(),
            state.pools.buildings.capacity()
        );
    }

    #[test]
    fn spawned_entities_carry_phase_seq() {
        let mut state = GameState::new(9);
        state.phase_seq = 7;
        state.phase = PhaseKind::Rings;
        spawn_phase(&mut state);
        for (_, entity) in state.pools.rings.iter_active() {
            assert_eq!(entity.phase_seq, 7);
        }
    }

    #[test]
    fn breather_spawns_no_obstacles() {
        let mut state = GameState::new(5);
        state.phase = PhaseKind::Breather;
        spawn_phase(&mut state);
        assert_eq!(state.pools.buildings.active_count(), 0);
        assert_eq!(state.pools.walls.active_count(), 0);
        assert_eq!(state.pools.debris.active_count(), 0);
        assert!(state.pools.dust.active_count() > 0);
    }
}
