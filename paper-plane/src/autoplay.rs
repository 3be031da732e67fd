//! Steering heuristic for headless runs
//!
//! Rough autopilot used by the smoke binary: thread toward the nearest ring
//! ahead, otherwise dodge the nearest obstacle, otherwise drift to center.

use glam::Vec3;

use crate::consts::*;
use crate::sim::{EntityKind, GameState, TickInput};

pub fn autopilot_input(state: &GameState) -> TickInput {
    let plane = state.plane_pos;

    let mut nearest_ring: Option<Vec3> = None;
    let mut nearest_obstacle: Option<Vec3> = None;

    for pool in [
        &state.pools.buildings,
        &state.pools.walls,
        &state.pools.debris,
        &state.pools.rings,
        &state.pools.coins,
    ] {
        for (_, entity) in pool.iter_active() {
            if entity.pos.z > plane.z || entity.pos.z < plane.z - 160.0 {
                continue;
            }
            match entity.kind {
                EntityKind::Ring | EntityKind::Coin => {
                    if nearest_ring.is_none_or(|best| entity.pos.z > best.z) {
                        nearest_ring = Some(entity.pos);
                    }
                }
                kind if kind.is_obstacle() => {
                    if nearest_obstacle.is_none_or(|best| entity.pos.z > best.z) {
                        nearest_obstacle = Some(entity.pos);
                    }
                }
                _ => {}
            }
        }
    }

    let (target_x, target_y) = if let Some(obstacle) = nearest_obstacle
        && (obstacle.x - plane.x).abs() < 14.0
    {
        // Dodge toward the wider side of the lane.
        let dodge = if obstacle.x >= plane.x { -1.0 } else { 1.0 };
        (
            (plane.x + dodge * 20.0).clamp(-LANE_HALF_WIDTH, LANE_HALF_WIDTH),
            plane.y,
        )
    } else if let Some(ring) = nearest_ring {
        (ring.x, ring.y)
    } else {
        (0.0, (ALTITUDE_MIN + ALTITUDE_MAX) / 2.0)
    };

    TickInput {
        steer: ((target_x - plane.x) * 0.25).clamp(-1.0, 1.0),
        climb: ((target_y - plane.y) * 0.25).clamp(-1.0, 1.0),
        pause: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tick;

    #[test]
    fn autopilot_survives_a_while() {
        let mut state = GameState::new(1234);
        for _ in 0..(TICK_HZ * 60) {
            let input = autopilot_input(&state);
            tick(&mut state, &input, SIM_DT);
            if state.is_over() {
                break;
            }
        }
        assert!(state.distance > 100.0);
    }

    #[test]
    fn input_is_always_clamped() {
        let state = GameState::new(9);
        let input = autopilot_input(&state);
        assert!(input.steer.abs() <= 1.0);
        assert!(input.climb.abs() <= 1.0);
    }
}
