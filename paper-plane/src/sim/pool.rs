//! Fixed-capacity object pools
//!
//! Every entity class is pre-allocated at startup. Spawning claims a free
//! slot and repositions it; despawning pushes the slot back onto the free
//! list. The per-frame loop never allocates.

use super::state::{Entity, EntityKind};

/// Index of a slot within a pool. Stable for the lifetime of a claim.
pub type SlotIndex = usize;

#[derive(Debug, Clone)]
pub struct Pool {
    slots: Vec<Slot>,
    free: Vec<SlotIndex>,
}

#[derive(Debug, Clone)]
struct Slot {
    active: bool,
    entity: Entity,
}

impl Pool {
    /// Pre-allocate `capacity` slots of the given kind. All start free.
    pub fn with_capacity(kind: EntityKind, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                active: false,
                entity: Entity::parked(kind),
            })
            .collect();
        // Reverse so claims hand out low indices first.
        let free = (0..capacity).rev().collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Claim a free slot. Returns `None` when the pool is exhausted; the
    /// caller treats that as a skipped spawn, never an allocation.
    pub fn claim(&mut self) -> Option<SlotIndex> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index];
        slot.active = true;
        slot.entity.reset_claim();
        Some(index)
    }

    /// Release a slot back to the free list. Releasing an inactive slot is
    /// a no-op so despawn paths don't have to track double releases.
    pub fn release(&mut self, index: SlotIndex) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.active {
            return;
        }
        slot.active = false;
        slot.entity.park();
        self.free.push(index);
    }

    pub fn release_all(&mut self) {
        for index in 0..self.slots.len() {
            self.release(index);
        }
    }

    pub fn get(&self, index: SlotIndex) -> Option<&Entity> {
        self.slots
            .get(index)
            .filter(|slot| slot.active)
            .map(|slot| &slot.entity)
    }

    pub fn get_mut(&mut self, index: SlotIndex) -> Option<&mut Entity> {
        self.slots
            .get_mut(index)
            .filter(|slot| slot.active)
            .map(|slot| &mut slot.entity)
    }

    /// Iterate active entities in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (SlotIndex, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (index, &slot.entity))
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut Entity)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (index, &mut slot.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn claim_exhausts_then_refuses() {
        let mut pool = Pool::with_capacity(EntityKind::Coin, 3);
        let a = pool.claim().unwrap();
        let b = pool.claim().unwrap();
        let c = pool.claim().unwrap();
        assert_eq!(pool.claim(), None);
        assert_eq!(pool.active_count(), 3);
        pool.release(b);
        assert_eq!(pool.active_count(), 2);
        let again = pool.claim().unwrap();
        assert_eq!(again, b);
        assert_ne!(again, a);
        assert_ne!(again, c);
    }

    #[test]
    fn double_release_is_harmless() {
        let mut pool = Pool::with_capacity(EntityKind::Ring, 2);
        let index = pool.claim().unwrap();
        pool.release(index);
        pool.release(index);
        assert_eq!(pool.active_count(), 0);
        assert!(pool.claim().is_some());
        assert!(pool.claim().is_some());
        assert_eq!(pool.claim(), None);
    }

    #[test]
    fn released_entity_is_parked_offscreen() {
        let mut pool = Pool::with_capacity(EntityKind::Building, 1);
        let index = pool.claim().unwrap();
        pool.get_mut(index).unwrap().pos.z = -100.0;
        pool.release(index);
        assert!(pool.get(index).is_none());
    }

    proptest! {
        #[test]
        fn active_count_never_exceeds_capacity(ops in proptest::collection::vec(0usize..8, 0..200)) {
            let mut pool = Pool::with_capacity(EntityKind::Dust, 5);
            let mut held: Vec<SlotIndex> = Vec::new();
            for op in ops {
                if op % 2 == 0 {
                    if let Some(index) = pool.claim() {
                        held.push(index);
                    }
                } else if let Some(index) = held.pop() {
                    pool.release(index);
                }
                prop_assert!(pool.active_count() <= pool.capacity());
                prop_assert_eq!(pool.active_count(), held.len());
            }
        }
    }
}
