//! Collision and near-miss detection
//!
//! Axis-aligned boxes shrunk by a forgiveness factor, tested only against
//! active objects inside a narrow Z window around the plane. Damage flows
//! shield, then health, then lives, gated by a grace period so one obstacle
//! cannot double-hit.

use glam::Vec3;

use super::state::{EntityKind, GameEvent, GameState, RunPhase};
use crate::consts::*;
use crate::forgiving_overlap;

/// Run collision checks for one tick. Assumes entity positions are current.
pub fn resolve_collisions(state: &mut GameState) {
    let plane_pos = state.plane_pos;
    let plane_half = state.plane_half;

    let mut hits: Vec<(EntityKind, usize)> = Vec::new();
    let mut collects: Vec<(EntityKind, usize)> = Vec::new();

    for pool in state.pools.all_mut() {
        for (index, entity) in pool.iter_active_mut() {
            if (entity.pos.z - plane_pos.z).abs() > COLLISION_Z_WINDOW {
                continue;
            }
            // Track closest lateral approach for near-miss scoring on exit.
            let lateral = lateral_distance(plane_pos, plane_half, entity.pos, entity.half);
            if lateral < entity.closest_approach {
                entity.closest_approach = lateral;
            }

            if entity.kind.is_obstacle() {
                if entity.hit {
                    continue;
                }
                if forgiving_overlap(
                    plane_pos,
                    plane_half,
                    entity.pos,
                    entity.half,
                    COLLISION_FORGIVENESS,
                ) {
                    hits.push((entity.kind, index));
                }
            } else if entity.kind.is_collectible() && !entity.collected {
                // Collectibles are generous: no forgiveness shrink.
                if forgiving_overlap(plane_pos, plane_half, entity.pos, entity.half, 1.0) {
                    collects.push((entity.kind, index));
                }
            }
        }
    }

    for (kind, index) in hits {
        register_hit(state, kind, index);
    }
    for (kind, index) in collects {
        register_collect(state, kind, index);
    }
}

fn lateral_distance(a_pos: Vec3, a_half: Vec3, b_pos: Vec3, b_half: Vec3) -> f32 {
    let dx = ((a_pos.x - b_pos.x).abs() - a_half.x - b_half.x).max(0.0);
    let dy = ((a_pos.y - b_pos.y).abs() - a_half.y - b_half.y).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

fn register_hit(state: &mut GameState, kind: EntityKind, index: usize) {
    if let Some(entity) = state.pools.for_kind_mut(kind).get_mut(index) {
        entity.hit = true;
    }
    if state.grace_ticks > 0 {
        return;
    }
    state.grace_ticks = GRACE_PERIOD_TICKS;
    state.difficulty.record_collision();

    if state.shield {
        state.shield = false;
        state.events.push(GameEvent::ShieldDown);
        return;
    }

    state.health = state.health.saturating_sub(1);
    if state.health > 0 {
        state.events.push(GameEvent::Hit {
            health_left: state.health,
        });
        return;
    }

    state.lives = state.lives.saturating_sub(1);
    if state.lives == 0 {
        state.run_phase = RunPhase::GameOver;
        state.events.push(GameEvent::GameOver {
            score: state.score as u64,
            distance: state.distance,
        });
        return;
    }
    state.health = MAX_HEALTH;
    state.events.push(GameEvent::LifeLost {
        lives_left: state.lives,
    });
}

fn register_collect(state: &mut GameState, kind: EntityKind, index: usize) {
    // Collected instances go straight back to the free list so the pass-by
    // bookkeeping never sees them.
    if let Some(entity) = state.pools.for_kind_mut(kind).get_mut(index) {
        entity.collected = true;
    }
    state.pools.for_kind_mut(kind).release(index);
    match kind {
        EntityKind::Ring => {
            state.score += RING_SCORE as f32;
            state.rings_collected_total += 1;
            state.difficulty.record_ring_collected();
            state.events.push(GameEvent::RingCollected);
            if state.rings_collected_total % RINGS_PER_SHIELD == 0 && !state.shield {
                state.shield = true;
                state.events.push(GameEvent::ShieldUp);
            }
        }
        EntityKind::Coin => {
            state.score += COIN_SCORE as f32;
            state.events.push(GameEvent::CoinCollected);
        }
        _ => {}
    }
}

/// Called when an entity scrolls past the plane and is about to be
/// released. Close clean passes pay out a near-miss bonus and boost.
pub fn on_entity_passed(state: &mut GameState, kind: EntityKind, hit: bool, closest: f32) {
    if kind.is_obstacle() && !hit && closest < NEAR_MISS_DISTANCE {
        state.score += NEAR_MISS_SCORE as f32;
        state.boost_ticks = NEAR_MISS_BOOST_TICKS;
        state.events.push(GameEvent::NearMiss);
    }
    if kind == EntityKind::Ring {
        state.difficulty.record_ring_missed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameState;
    use glam::Vec3;

    fn place(state: &mut GameState, kind: EntityKind, pos: Vec3, half: Vec3) -> usize {
        let phase_seq = state.phase_seq;
        let pool = state.pools.for_kind_mut(kind);
        let index = pool.claim().expect("pool has room");
        let entity = pool.get_mut(index).unwrap();
        entity.pos = pos;
        entity.half = half;
        entity.phase_seq = phase_seq;
        index
    }

    #[test]
    fn building_hit_decrements_health_once_and_arms_grace() {
        let mut state = GameState::new(11);
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Building,
            pos,
            Vec3::splat(5.0),
        );
        resolve_collisions(&mut state);
        assert_eq!(state.health, MAX_HEALTH - 1);
        assert_eq!(state.grace_ticks, GRACE_PERIOD_TICKS);

        // A second obstacle during the grace window does not register.
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Debris,
            pos,
            Vec3::splat(5.0),
        );
        resolve_collisions(&mut state);
        assert_eq!(state.health, MAX_HEALTH - 1);
    }

    #[test]
    fn same_obstacle_never_double_hits_after_grace() {
        let mut state = GameState::new(11);
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Wall,
            pos,
            Vec3::splat(5.0),
        );
        resolve_collisions(&mut state);
        assert_eq!(state.health, MAX_HEALTH - 1);
        state.grace_ticks = 0;
        resolve_collisions(&mut state);
        assert_eq!(state.health, MAX_HEALTH - 1);
    }

    #[test]
    fn shield_absorbs_before_health() {
        let mut state = GameState::new(2);
        state.shield = true;
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Building,
            pos,
            Vec3::splat(5.0),
        );
        resolve_collisions(&mut state);
        assert!(!state.shield);
        assert_eq!(state.health, MAX_HEALTH);
        assert!(state.events.contains(&GameEvent::ShieldDown));
    }

    #[test]
    fn exhausting_health_costs_a_life_then_game_over() {
        let mut state = GameState::new(2);
        state.health = 1;
        state.lives = 1;
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Building,
            pos,
            Vec3::splat(5.0),
        );
        resolve_collisions(&mut state);
        assert!(state.is_over());
    }

    #[test]
    fn life_loss_restores_health() {
        let mut state = GameState::new(2);
        state.health = 1;
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Building,
            pos,
            Vec3::splat(5.0),
        );
        resolve_collisions(&mut state);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.health, MAX_HEALTH);
    }

    #[test]
    fn distant_obstacles_are_skipped() {
        let mut state = GameState::new(2);
        let far = state.plane_pos + Vec3::new(0.0, 0.0, -(COLLISION_Z_WINDOW + 50.0));
        place(&mut state, EntityKind::Building, far, Vec3::splat(100.0));
        resolve_collisions(&mut state);
        assert_eq!(state.health, MAX_HEALTH);
    }

    #[test]
    fn ring_collection_scores_and_counts() {
        let mut state = GameState::new(2);
        let pos = state.plane_pos;
        place(
            &mut state,
            EntityKind::Ring,
            pos,
            Vec3::splat(4.0),
        );
        resolve_collisions(&mut state);
        assert_eq!(state.score as u64, RING_SCORE);
        assert_eq!(state.rings_collected_total, 1);
    }

    #[test]
    fn every_fifth_ring_grants_shield() {
        let mut state = GameState::new(2);
        for _ in 0..RINGS_PER_SHIELD {
            let pos = state.plane_pos;
            let index = place(
                &mut state,
                EntityKind::Ring,
                pos,
                Vec3::splat(4.0),
            );
            resolve_collisions(&mut state);
            state.pools.rings.release(index);
        }
        assert!(state.shield);
    }

    #[test]
    fn near_miss_pays_bonus_and_boost() {
        let mut state = GameState::new(2);
        on_entity_passed(&mut state, EntityKind::Building, false, 2.0);
        assert_eq!(state.score as u64, NEAR_MISS_SCORE);
        assert_eq!(state.boost_ticks, NEAR_MISS_BOOST_TICKS);
        assert!(state.events.contains(&GameEvent::NearMiss));
    }

    #[test]
    fn hit_obstacle_pays_no_near_miss() {
        let mut state = GameState::new(2);
        on_entity_passed(&mut state, EntityKind::Building, true, 0.0);
        assert_eq!(state.score as u64, 0);
        assert_eq!(state.boost_ticks, 0);
    }
}
