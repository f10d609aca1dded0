//! Shared colony state: food stock, brood queue, chambers, counters.
//!
//! Mutated in place by whichever agent is currently thinking; the tick
//! driver owns the ordering.

use serde::{Deserialize, Serialize};

use crate::simulation::types::{BroodId, CellCoord};

/// Developmental stage derived from elapsed hatch time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroodStage {
    Egg,
    Larva,
    Pupa,
}

/// An egg/larva/pupa item waiting to hatch into a worker
#[derive(Clone, Debug)]
pub struct Brood {
    pub id: BroodId,
    /// Position in world units; follows the carrier while transported
    pub x: f32,
    pub y: f32,
    /// Seconds left until hatching
    pub timer: f32,
    /// Full hatch duration this item started from
    pub total: f32,
    /// Laid during claustral founding; restricted hatch castes
    pub first_generation: bool,
}

impl Brood {
    /// Stage by elapsed-time fraction: first third egg, second third
    /// larva, final third pupa.
    pub fn stage(&self) -> BroodStage {
        let elapsed = (self.total - self.timer).max(0.0);
        let fraction = elapsed / self.total;
        if fraction < 1.0 / 3.0 {
            BroodStage::Egg
        } else if fraction < 2.0 / 3.0 {
            BroodStage::Larva
        } else {
            BroodStage::Pupa
        }
    }

    pub fn cell(&self) -> CellCoord {
        CellCoord::from_world(self.x, self.y)
    }
}

/// A pile of food placed on the surface for foragers to find
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FoodSource {
    pub x: f32,
    pub y: f32,
    pub amount: u32,
}

/// Shared mutable colony aggregate
#[derive(Clone, Debug, Default)]
pub struct Colony {
    /// Food stock; deliveries add, egg-laying and larval feeding spend
    pub food: f32,
    pub brood: Vec<Brood>,
    /// Completed forager deliveries
    pub deliveries: u32,
    /// Hatched first-generation workers
    pub nanitics_hatched: u32,
    /// Built chambers; each committed at most once, never moved
    pub food_chamber: Option<CellCoord>,
    pub nursery: Option<CellCoord>,
    pub rest_chamber: Option<CellCoord>,
    /// Cosmetic stored-food markers, capped
    pub stored_markers: Vec<CellCoord>,
    pub food_sources: Vec<FoodSource>,
    next_brood_id: u32,
}

impl Colony {
    pub fn new() -> Self {
        Colony::default()
    }

    /// Lay a brood item at a world position
    pub fn lay_brood(&mut self, x: f32, y: f32, first_generation: bool, hatch_time: f32) -> BroodId {
        let id = BroodId(self.next_brood_id);
        self.next_brood_id += 1;
        self.brood.push(Brood {
            id,
            x,
            y,
            timer: hatch_time,
            total: hatch_time,
            first_generation,
        });
        id
    }

    pub fn brood_get(&self, id: BroodId) -> Option<&Brood> {
        self.brood.iter().find(|b| b.id == id)
    }

    pub fn brood_get_mut(&mut self, id: BroodId) -> Option<&mut Brood> {
        self.brood.iter_mut().find(|b| b.id == id)
    }

    /// Balance-checked spend; returns false without touching the stock
    /// when the balance is short.
    pub fn try_spend_food(&mut self, amount: f32) -> bool {
        if self.food >= amount {
            self.food -= amount;
            true
        } else {
            false
        }
    }

    /// Opportunistic larval feeding: deducts whenever the pool is
    /// positive, clamped so the stock never goes negative.
    pub fn feed_larva(&mut self, amount: f32) -> bool {
        if self.food > 0.0 {
            self.food = (self.food - amount).max(0.0);
            true
        } else {
            false
        }
    }

    /// Credit one forager delivery, keeping the cosmetic marker list
    /// under its cap.
    pub fn deposit_food(&mut self, amount: f32, at: CellCoord, marker_cap: usize) {
        self.food += amount;
        self.deliveries += 1;
        if self.stored_markers.len() < marker_cap {
            self.stored_markers.push(at);
        }
    }

    /// Advance hatch timers and remove hatched items, returning them in
    /// queue order for the tick driver to convert into workers.
    pub fn advance_brood(&mut self, dt: f32) -> Vec<Brood> {
        for b in &mut self.brood {
            b.timer -= dt;
        }
        let mut hatched = Vec::new();
        let mut i = 0;
        while i < self.brood.len() {
            if self.brood[i].timer <= 0.0 {
                hatched.push(self.brood.remove(i));
            } else {
                i += 1;
            }
        }
        hatched
    }

    /// Nearest food source to a world-space x, by horizontal proximity
    pub fn nearest_food_source(&self, x: f32) -> Option<usize> {
        self.food_sources
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.x - x).abs().partial_cmp(&(b.x - x).abs()).unwrap()
            })
            .map(|(i, _)| i)
    }

    /// Total brood items ever laid
    pub fn eggs_laid_total(&self) -> u32 {
        self.next_brood_id
    }

    /// Take one unit from a food source, dropping it when exhausted
    pub fn take_food_unit(&mut self, index: usize) -> bool {
        if let Some(source) = self.food_sources.get_mut(index) {
            source.amount = source.amount.saturating_sub(1);
            if source.amount == 0 {
                self.food_sources.remove(index);
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brood_stage_monotonic() {
        let mut colony = Colony::new();
        let id = colony.lay_brood(10.0, 10.0, false, 30.0);

        let mut last = BroodStage::Egg;
        let order = |s: BroodStage| match s {
            BroodStage::Egg => 0,
            BroodStage::Larva => 1,
            BroodStage::Pupa => 2,
        };
        for _ in 0..290 {
            colony.advance_brood(0.1);
            if let Some(b) = colony.brood_get(id) {
                let stage = b.stage();
                assert!(order(stage) >= order(last));
                last = stage;
            }
        }
        assert_eq!(last, BroodStage::Pupa);
    }

    #[test]
    fn test_brood_hatches_exactly_once() {
        let mut colony = Colony::new();
        colony.lay_brood(10.0, 10.0, true, 1.0);

        assert!(colony.advance_brood(0.5).is_empty());
        let hatched = colony.advance_brood(0.6);
        assert_eq!(hatched.len(), 1);
        assert!(hatched[0].first_generation);
        assert!(colony.brood.is_empty());
        assert!(colony.advance_brood(1.0).is_empty());
    }

    #[test]
    fn test_spend_food_checks_balance() {
        let mut colony = Colony::new();
        colony.food = 1.5;
        assert!(colony.try_spend_food(1.0));
        assert!(!colony.try_spend_food(1.0));
        assert!((colony.food - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_feed_larva_never_goes_negative() {
        let mut colony = Colony::new();
        colony.food = 0.1;
        assert!(colony.feed_larva(0.25));
        assert_eq!(colony.food, 0.0);
        assert!(!colony.feed_larva(0.25));
        assert_eq!(colony.food, 0.0);
    }

    #[test]
    fn test_stored_markers_capped() {
        let mut colony = Colony::new();
        for i in 0..10 {
            colony.deposit_food(2.0, CellCoord::new(i, 20), 4);
        }
        assert_eq!(colony.stored_markers.len(), 4);
        assert_eq!(colony.deliveries, 10);
        assert_eq!(colony.food, 20.0);
    }

    #[test]
    fn test_food_source_depletes_and_drops() {
        let mut colony = Colony::new();
        colony.food_sources.push(FoodSource { x: 50.0, y: 80.0, amount: 2 });
        colony.food_sources.push(FoodSource { x: 400.0, y: 80.0, amount: 5 });

        assert_eq!(colony.nearest_food_source(60.0), Some(0));
        assert!(colony.take_food_unit(0));
        assert!(colony.take_food_unit(0));
        // First source exhausted and removed
        assert_eq!(colony.food_sources.len(), 1);
        assert_eq!(colony.nearest_food_source(60.0), Some(0));
        assert!((colony.food_sources[0].x - 400.0).abs() < f32::EPSILON);
    }
}
