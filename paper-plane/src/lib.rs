//! Paper Plane - the footer mini-game, simulation only
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, collision, scoring)
//! - `autoplay`: Steering heuristic used by the headless smoke binary

pub mod autoplay;
pub mod sim;

pub use sim::{GameState, TickInput, tick};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the animation-frame cadence)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    pub const TICK_HZ: u32 = 60;

    /// Corridor the plane flies down. X is lateral, Y is altitude, Z is depth;
    /// obstacles spawn far ahead at negative Z and scroll toward the plane at Z=0.
    pub const LANE_HALF_WIDTH: f32 = 40.0;
    pub const ALTITUDE_MIN: f32 = 2.0;
    pub const ALTITUDE_MAX: f32 = 30.0;
    pub const SPAWN_Z: f32 = -400.0;
    /// Objects past this Z are behind the plane and get released.
    pub const DESPAWN_Z: f32 = 20.0;

    /// Plane handling
    pub const PLANE_HALF_EXTENTS: [f32; 3] = [3.0, 1.2, 4.0];
    pub const STEER_SPEED: f32 = 55.0;
    pub const CLIMB_SPEED: f32 = 30.0;
    pub const BASE_SCROLL_SPEED: f32 = 90.0;

    /// Health model
    pub const MAX_HEALTH: u8 = 3;
    pub const STARTING_LIVES: u8 = 3;
    /// 500 ms at 60 Hz; no hit registers while this runs down.
    pub const GRACE_PERIOD_TICKS: u32 = 30;

    /// Collision boxes are shrunk by this factor before testing.
    pub const COLLISION_FORGIVENESS: f32 = 0.8;
    /// Obstacles outside this window around the plane's Z are skipped.
    pub const COLLISION_Z_WINDOW: f32 = 30.0;
    /// Lateral closest-approach below this counts as a near miss.
    pub const NEAR_MISS_DISTANCE: f32 = 6.0;
    pub const NEAR_MISS_BOOST_TICKS: u32 = 90;
    pub const NEAR_MISS_BOOST_FACTOR: f32 = 1.35;

    /// Scoring
    pub const SCORE_PER_METER: f32 = 0.1;
    pub const RING_SCORE: u64 = 50;
    pub const COIN_SCORE: u64 = 10;
    pub const NEAR_MISS_SCORE: u64 = 25;
    /// Every Nth collected ring grants a shield when none is active.
    pub const RINGS_PER_SHIELD: u32 = 5;

    /// Phase scheduling
    pub const PHASE_MIN_TICKS: u32 = 5 * TICK_HZ;
    pub const BREATHER_MIN_TICKS: u32 = 3 * TICK_HZ;
    /// Distance milestones that force a boss gauntlet.
    pub const GAUNTLET_MILESTONE_METERS: f32 = 5000.0;
    /// Force a Mixed phase after this many non-Mixed phases in a row.
    pub const FORCED_VARIETY_STREAK: u8 = 3;

    /// Pool capacities, fixed at startup
    pub const POOL_BUILDINGS: usize = 24;
    pub const POOL_WALLS: usize = 12;
    pub const POOL_RINGS: usize = 16;
    pub const POOL_COINS: usize = 48;
    pub const POOL_DEBRIS: usize = 32;
    pub const POOL_DUST: usize = 64;
    pub const POOL_GUSTS: usize = 8;
}

/// Shrink two half-extents by the forgiveness factor and test AABB overlap.
#[inline]
pub fn forgiving_overlap(
    a_pos: glam::Vec3,
    a_half: glam::Vec3,
    b_pos: glam::Vec3,
    b_half: glam::Vec3,
    forgiveness: f32,
) -> bool {
    let a = a_half * forgiveness;
    let b = b_half * forgiveness;
    (a_pos.x - b_pos.x).abs() <= a.x + b.x
        && (a_pos.y - b_pos.y).abs() <= a.y + b.y
        && (a_pos.z - b_pos.z).abs() <= a.z + b.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn forgiveness_shrinks_boxes() {
        let half = Vec3::splat(1.0);
        // Touching at exactly 2.0 apart collides at forgiveness 1.0 but not at 0.8.
        let apart = Vec3::new(2.0, 0.0, 0.0);
        assert!(forgiving_overlap(Vec3::ZERO, half, apart, half, 1.0));
        assert!(!forgiving_overlap(Vec3::ZERO, half, apart, half, 0.8));
    }
}
