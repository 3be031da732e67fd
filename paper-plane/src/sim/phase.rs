//! Wave/phase scheduling
//!
//! Decides what content appears next and for how long. Selection is a
//! weighted draw over an explicit integer-weight table, constrained by a
//! small rule set: no immediate repeats, forced variety after a streak of
//! same-flavored phases, distance milestones that force a boss gauntlet,
//! and a guaranteed breather right after one.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{FORCED_VARIETY_STREAK, GAUNTLET_MILESTONE_METERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Buildings,
    Walls,
    Rings,
    Coins,
    Bonus,
    Breather,
    Mixed,
    BossGauntlet,
}

impl PhaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            PhaseKind::Buildings => "buildings",
            PhaseKind::Walls => "walls",
            PhaseKind::Rings => "rings",
            PhaseKind::Coins => "coins",
            PhaseKind::Bonus => "bonus",
            PhaseKind::Breather => "breather",
            PhaseKind::Mixed => "mixed",
            PhaseKind::BossGauntlet => "boss_gauntlet",
        }
    }
}

/// Base draw weights. Gauntlets never come up by chance; milestones force
/// them. Breathers are rare by draw but guaranteed after a gauntlet.
const WEIGHTS: &[(PhaseKind, u32)] = &[
    (PhaseKind::Buildings, 24),
    (PhaseKind::Walls, 20),
    (PhaseKind::Rings, 16),
    (PhaseKind::Coins, 14),
    (PhaseKind::Bonus, 8),
    (PhaseKind::Breather, 6),
    (PhaseKind::Mixed, 12),
];

#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    previous: Option<PhaseKind>,
    /// Consecutive phases that were not Mixed (or Breather).
    plain_streak: u8,
    next_milestone: f32,
}

impl PhaseScheduler {
    pub fn new() -> Self {
        Self {
            previous: None,
            plain_streak: 0,
            next_milestone: GAUNTLET_MILESTONE_METERS,
        }
    }

    /// Seed the no-repeat rule with the phase a run opens on.
    pub fn starting_with(initial: PhaseKind) -> Self {
        let mut scheduler = Self::new();
        scheduler.note(initial);
        scheduler
    }

    /// Pick the next phase given elapsed distance in meters.
    pub fn pick(&mut self, rng: &mut Pcg32, distance: f32) -> PhaseKind {
        let chosen = self.pick_inner(rng, distance);
        self.note(chosen);
        chosen
    }

    fn pick_inner(&mut self, rng: &mut Pcg32, distance: f32) -> PhaseKind {
        // Milestone gauntlets preempt everything except back-to-back repeats.
        if distance >= self.next_milestone && self.previous != Some(PhaseKind::BossGauntlet) {
            self.next_milestone += GAUNTLET_MILESTONE_METERS;
            return PhaseKind::BossGauntlet;
        }

        if self.previous == Some(PhaseKind::BossGauntlet) {
            return PhaseKind::Breather;
        }

        if self.plain_streak >= FORCED_VARIETY_STREAK && self.previous != Some(PhaseKind::Mixed) {
            return PhaseKind::Mixed;
        }

        self.draw(rng)
    }

    fn draw(&self, rng: &mut Pcg32) -> PhaseKind {
        let total: u32 = WEIGHTS
            .iter()
            .filter(|(kind, _)| Some(*kind) != self.previous)
            .map(|(_, weight)| weight)
            .sum();
        let mut roll = rng.random_range(0..total);
        for (kind, weight) in WEIGHTS {
            if Some(*kind) == self.previous {
                continue;
            }
            if roll < *weight {
                return *kind;
            }
            roll -= weight;
        }
        // Unreachable while WEIGHTS is non-empty; fall back to a safe phase.
        PhaseKind::Breather
    }

    fn note(&mut self, chosen: PhaseKind) {
        match chosen {
            PhaseKind::Mixed | PhaseKind::Breather | PhaseKind::BossGauntlet => {
                self.plain_streak = 0;
            }
            _ => self.plain_streak = self.plain_streak.saturating_add(1),
        }
        self.previous = Some(chosen);
    }
}

impl Default for PhaseScheduler {
    fn default() -> Self {
        Self::new()
    }
}
