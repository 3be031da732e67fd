//! Hidden difficulty controller
//!
//! Keeps a rolling window of recent collisions, ring-collection success and
//! average health, and derives a smoothed multiplier applied to obstacle
//! spacing and scroll speed. Drops fast after damage, climbs slowly during
//! clean play. Never exposed in the player-facing snapshot.

use std::collections::VecDeque;

use crate::consts::TICK_HZ;

/// One aggregated sample per interval.
#[derive(Debug, Clone, Copy)]
struct Sample {
    collisions: u32,
    rings_collected: u32,
    rings_missed: u32,
    health: u8,
}

const SAMPLE_INTERVAL_TICKS: u64 = 2 * TICK_HZ as u64;
const WINDOW_SAMPLES: usize = 15;

const MULTIPLIER_MIN: f32 = 0.75;
const MULTIPLIER_MAX: f32 = 1.25;
/// Immediate drop applied on every registered hit.
const HIT_PENALTY: f32 = 0.08;
/// Smoothing toward the target, per sample. Raising difficulty is slow.
const RAISE_RATE: f32 = 0.02;
const LOWER_RATE: f32 = 0.10;

#[derive(Debug, Clone)]
pub struct DifficultyController {
    window: VecDeque<Sample>,
    multiplier: f32,
    // Counters for the interval currently being accumulated.
    interval_collisions: u32,
    interval_rings_collected: u32,
    interval_rings_missed: u32,
}

impl DifficultyController {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_SAMPLES),
            multiplier: 1.0,
            interval_collisions: 0,
            interval_rings_collected: 0,
            interval_rings_missed: 0,
        }
    }

    pub fn record_collision(&mut self) {
        self.interval_collisions += 1;
        self.multiplier = (self.multiplier - HIT_PENALTY).max(MULTIPLIER_MIN);
    }

    pub fn record_ring_collected(&mut self) {
        self.interval_rings_collected += 1;
    }

    pub fn record_ring_missed(&mut self) {
        self.interval_rings_missed += 1;
    }

    /// Called every tick; folds the interval counters into the window on
    /// sample boundaries and eases the multiplier toward its target.
    pub fn update(&mut self, time_ticks: u64, health: u8) {
        if time_ticks == 0 || time_ticks % SAMPLE_INTERVAL_TICKS != 0 {
            return;
        }
        if self.window.len() == WINDOW_SAMPLES {
            self.window.pop_front();
        }
        self.window.push_back(Sample {
            collisions: self.interval_collisions,
            rings_collected: self.interval_rings_collected,
            rings_missed: self.interval_rings_missed,
            health,
        });
        self.interval_collisions = 0;
        self.interval_rings_collected = 0;
        self.interval_rings_missed = 0;

        let target = self.target();
        let rate = if target < self.multiplier {
            LOWER_RATE
        } else {
            RAISE_RATE
        };
        self.multiplier += (target - self.multiplier) * rate;
        self.multiplier = self.multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
    }

    /// Target multiplier from the window: clean play pushes toward the top
    /// of the band, recent damage and missed rings pull it down.
    fn target(&self) -> f32 {
        if self.window.is_empty() {
            return 1.0;
        }
        let samples = self.window.len() as f32;
        let collisions: u32 = self.window.iter().map(|sample| sample.collisions).sum();
        let collected: u32 = self.window.iter().map(|sample| sample.rings_collected).sum();
        let missed: u32 = self.window.iter().map(|sample| sample.rings_missed).sum();
        let avg_health: f32 = self
            .window
            .iter()
            .map(|sample| f32::from(sample.health))
            .sum::<f32>()
            / samples;

        let collision_rate = collisions as f32 / samples;
        let ring_rate = if collected + missed > 0 {
            collected as f32 / (collected + missed) as f32
        } else {
            0.5
        };
        let health_factor = (avg_health / f32::from(crate::consts::MAX_HEALTH)).clamp(0.0, 1.0);

        // Skill in [-1, 1]: ring accuracy and health push up, hits push down.
        let skill =
            (ring_rate - 0.5) * 0.8 + (health_factor - 0.5) * 0.6 - (collision_rate * 0.8).min(1.0);
        (1.0 + skill * (MULTIPLIER_MAX - 1.0)).clamp(MULTIPLIER_MIN, MULTIPLIER_MAX)
    }

    /// Scroll speed scale. Above 1.0 means faster.
    pub fn speed_scale(&self) -> f32 {
        self.multiplier
    }

    /// Obstacle spacing scale. Harder play packs obstacles tighter.
    pub fn spacing_scale(&self) -> f32 {
        1.0 / self.multiplier
    }
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hit_drops_immediately() {
        let mut controller = DifficultyController::new();
        let before = controller.speed_scale();
        controller.record_collision();
        assert!(controller.speed_scale() < before);
    }

    #[test]
    fn clean_play_climbs_slowly() {
        let mut controller = DifficultyController::new();
        controller.record_collision();
        controller.record_collision();
        // Let the damaged interval wash out of the window first.
        for tick in 1..=(SAMPLE_INTERVAL_TICKS * (WINDOW_SAMPLES as u64 + 1)) {
            controller.update(tick, 3);
        }
        let floor = controller.speed_scale();
        let mut last = floor;
        let start = SAMPLE_INTERVAL_TICKS * (WINDOW_SAMPLES as u64 + 1) + 1;
        for tick in start..start + SAMPLE_INTERVAL_TICKS * 30 {
            if tick % 10 == 0 {
                controller.record_ring_collected();
            }
            controller.update(tick, 3);
            let now = controller.speed_scale();
            // Climbing, but never by more than the raise rate in one step.
            assert!(now + f32::EPSILON >= last);
            assert!(now - last <= LOWER_RATE);
            last = now;
        }
        assert!(controller.speed_scale() > floor);
    }

    proptest! {
        #[test]
        fn multiplier_stays_in_band(events in proptest::collection::vec(0u8..4, 0..400)) {
            let mut controller = DifficultyController::new();
            for (tick, event) in events.iter().enumerate() {
                match event {
                    0 => controller.record_collision(),
                    1 => controller.record_ring_collected(),
                    2 => controller.record_ring_missed(),
                    _ => {}
                }
                controller.update(tick as u64, (tick % 4) as u8);
                prop_assert!(controller.speed_scale() >= MULTIPLIER_MIN);
                prop_assert!(controller.speed_scale() <= MULTIPLIER_MAX);
                prop_assert!(controller.spacing_scale() > 0.0);
            }
        }
    }
}
