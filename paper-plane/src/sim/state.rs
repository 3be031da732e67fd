//! Game state and core simulation types

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyController;
use super::phase::{PhaseKind, PhaseScheduler};
use super::pool::Pool;
use crate::consts::*;

/// Entity classes, one pool per class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Building,
    Wall,
    Ring,
    Coin,
    Debris,
    Dust,
    Gust,
}

impl EntityKind {
    /// Solid obstacles damage the plane; the rest are collectible or cosmetic.
    pub fn is_obstacle(&self) -> bool {
        matches!(self, EntityKind::Building | EntityKind::Wall | EntityKind::Debris)
    }

    pub fn is_collectible(&self) -> bool {
        matches!(self, EntityKind::Ring | EntityKind::Coin)
    }
}

/// A pooled, renderable instance. Parked entities sit far behind the camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec3,
    pub half: Vec3,
    /// Already dealt damage once; the grace window plus this flag prevent
    /// double hits from the same obstacle.
    pub hit: bool,
    pub collected: bool,
    /// Closest lateral approach seen while inside the collision window.
    pub closest_approach: f32,
    /// Phase sequence number that spawned this entity. A phase cannot end
    /// while entities it spawned are still active.
    pub phase_seq: u64,
}

const PARKED_Z: f32 = 10_000.0;

impl Entity {
    pub fn parked(kind: EntityKind) -> Self {
        Self {
            kind,
            pos: Vec3::new(0.0, 0.0, PARKED_Z),
            half: Vec3::ONE,
            hit: false,
            collected: false,
            closest_approach: f32::INFINITY,
            phase_seq: 0,
        }
    }

    pub(crate) fn reset_claim(&mut self) {
        self.hit = false;
        self.collected = false;
        self.closest_approach = f32::INFINITY;
        self.phase_seq = 0;
    }

    pub(crate) fn park(&mut self) {
        self.pos = Vec3::new(0.0, 0.0, PARKED_Z);
    }
}

/// Whether the run is live, paused, or finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Flying,
    Paused,
    GameOver,
}

/// Events emitted by a tick, drained by the embedding UI for messages
/// like "HIT!" and "SHIELD DOWN!"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Hit { health_left: u8 },
    ShieldDown,
    ShieldUp,
    LifeLost { lives_left: u8 },
    GameOver { score: u64, distance: f32 },
    NearMiss,
    RingCollected,
    CoinCollected,
    PhaseStarted(PhaseKind),
}

/// All pools, indexed by entity kind
#[derive(Debug, Clone)]
pub struct Pools {
    pub buildings: Pool,
    pub walls: Pool,
    pub rings: Pool,
    pub coins: Pool,
    pub debris: Pool,
    pub dust: Pool,
    pub gusts: Pool,
}

impl Pools {
    fn new() -> Self {
        Self {
            buildings: Pool::with_capacity(EntityKind::Building, POOL_BUILDINGS),
            walls: Pool::with_capacity(EntityKind::Wall, POOL_WALLS),
            rings: Pool::with_capacity(EntityKind::Ring, POOL_RINGS),
            coins: Pool::with_capacity(EntityKind::Coin, POOL_COINS),
            debris: Pool::with_capacity(EntityKind::Debris, POOL_DEBRIS),
            dust: Pool::with_capacity(EntityKind::Dust, POOL_DUST),
            gusts: Pool::with_capacity(EntityKind::Gust, POOL_GUSTS),
        }
    }

    pub fn for_kind_mut(&mut self, kind: EntityKind) -> &mut Pool {
        match kind {
            EntityKind::Building => &mut self.buildings,
            EntityKind::Wall => &mut self.walls,
            EntityKind::Ring => &mut self.rings,
            EntityKind::Coin => &mut self.coins,
            EntityKind::Debris => &mut self.debris,
            EntityKind::Dust => &mut self.dust,
            EntityKind::Gust => &mut self.gusts,
        }
    }

    pub fn all_mut(&mut self) -> [&mut Pool; 7] {
        [
            &mut self.buildings,
            &mut self.walls,
            &mut self.rings,
            &mut self.coins,
            &mut self.debris,
            &mut self.dust,
            &mut self.gusts,
        ]
    }

    /// Active entities spawned by the given phase, across every pool.
    pub fn active_for_phase(&self, phase_seq: u64) -> usize {
        [
            &self.buildings,
            &self.walls,
            &self.rings,
            &self.coins,
            &self.debris,
        ]
        .iter()
        .map(|pool| {
            pool.iter_active()
                .filter(|(_, entity)| entity.phase_seq == phase_seq && !entity.collected)
                .count()
        })
        .sum()
    }
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub run_phase: RunPhase,
    pub time_ticks: u64,

    pub plane_pos: Vec3,
    pub plane_half: Vec3,

    pub distance: f32,
    pub score: f32,
    pub health: u8,
    pub lives: u8,
    pub shield: bool,
    pub grace_ticks: u32,
    pub boost_ticks: u32,

    pub phase: PhaseKind,
    /// Monotonic phase counter used to tag spawned entities.
    pub phase_seq: u64,
    pub phase_ticks: u32,
    pub phase_spawned: bool,
    pub scheduler: PhaseScheduler,

    pub pools: Pools,
    pub difficulty: DifficultyController,

    pub rings_collected_total: u32,
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            run_phase: RunPhase::Flying,
            time_ticks: 0,
            plane_pos: Vec3::new(0.0, 10.0, 0.0),
            plane_half: Vec3::from_array(PLANE_HALF_EXTENTS),
            distance: 0.0,
            score: 0.0,
            health: MAX_HEALTH,
            lives: STARTING_LIVES,
            shield: false,
            grace_ticks: 0,
            boost_ticks: 0,
            phase: PhaseKind::Buildings,
            phase_seq: 1,
            phase_ticks: 0,
            phase_spawned: false,
            scheduler: PhaseScheduler::starting_with(PhaseKind::Buildings),
            pools: Pools::new(),
            difficulty: DifficultyController::new(),
            rings_collected_total: 0,
            events: Vec::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.run_phase == RunPhase::GameOver
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Player-facing snapshot. Difficulty internals stay hidden.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            seed: self.seed,
            ticks: self.time_ticks,
            distance: self.distance,
            score: self.score as u64,
            health: self.health,
            lives: self.lives,
            shield: self.shield,
            phase: self.phase,
            game_over: self.is_over(),
        }
    }
}

/// What the UI layer sees each frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub seed: u64,
    pub ticks: u64,
    pub distance: f32,
    pub score: u64,
    pub health: u8,
    pub lives: u8,
    pub shield: bool,
    pub phase: PhaseKind,
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_full() {
        let state = GameState::new(7);
        assert_eq!(state.health, MAX_HEALTH);
        assert_eq!(state.lives, STARTING_LIVES);
        assert!(!state.shield);
        assert_eq!(state.pools.buildings.active_count(), 0);
        assert_eq!(state.pools.buildings.capacity(), POOL_BUILDINGS);
    }

    #[test]
    fn snapshot_hides_difficulty() {
        let state = GameState::new(1);
        let value = serde_json::to_value(state.snapshot()).unwrap();
        assert!(value.get("difficulty").is_none());
        assert_eq!(value["health"], 3);
    }
}
