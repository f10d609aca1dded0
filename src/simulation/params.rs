//! Configuration parameters for the colony simulation

use serde::{Deserialize, Serialize};

/// Main configuration for the simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationParams {
    // Time
    /// Maximum delta time per tick in seconds (large pauses are clamped)
    pub max_dt: f32,

    // Locomotion
    /// Founder walk speed in world units per second
    pub founder_speed: f32,
    /// Worker walk speed in world units per second
    pub worker_speed: f32,
    /// Seconds to dig out one soil cell
    pub dig_duration: f32,

    // Founder life cycle
    /// Seconds spent in Landing before the cycle starts
    pub landing_delay: f32,
    /// Seconds spent shedding wings
    pub wing_shed_duration: f32,
    /// Seconds walking the surface before the nest site is picked
    pub search_site_duration: f32,
    /// Shaft depth range in cells (inclusive)
    pub shaft_depth_min: usize,
    pub shaft_depth_max: usize,
    /// Chamber width range in dug cells (inclusive)
    pub chamber_width_min: usize,
    pub chamber_width_max: usize,
    /// Wing-energy capacity restored when wings are shed
    pub wing_energy_capacity: f32,
    /// Wing-energy drain per second during claustral founding
    pub wing_energy_drain: f32,
    /// Wing-energy cost of laying one claustral egg
    pub egg_cost_energy: f32,
    /// Wing-energy floor below which laying pauses
    pub wing_energy_reserve: f32,
    /// Seconds between claustral egg-laying attempts
    pub claustral_egg_interval: f32,
    /// Upper bound on first-generation eggs
    pub max_first_generation_eggs: u32,
    /// Hatched first-generation workers required to unseal the nest
    pub nanitic_threshold: u32,
    /// Grooming interval range in seconds
    pub groom_interval_min: f32,
    pub groom_interval_max: f32,
    /// Seconds between mature egg-laying attempts
    pub mature_egg_interval: f32,
    /// Shortened retry when food or population gates an egg
    pub mature_retry_interval: f32,
    /// Food cost of one mature egg
    pub egg_cost_food: f32,
    /// Chance per think for the mature founder to wander a step
    pub mature_wander_chance: f32,

    // Brood
    /// Seconds from laying to hatching
    pub brood_hatch_time: f32,
    /// Total population (workers plus pending brood) cap
    pub population_cap: usize,

    // Workers
    /// Idle wait range in seconds before the next dispatch
    pub idle_wait_min: f32,
    pub idle_wait_max: f32,
    /// Energy gauge level that reroutes a worker to rest
    pub low_energy_threshold: f32,
    /// Energy cost of one wandering or transport step
    pub energy_move_cost: f32,
    /// Energy regained per second while sleeping
    pub rest_regen_rate: f32,
    /// Consecutive unchanged-cell thinking ticks before escape measures
    pub stuck_threshold: u32,
    /// Escape attempts before a travel state is reset to wandering
    pub stall_strike_limit: u32,
    /// Steps taken in the generic wander fallback (inclusive range)
    pub wander_steps_min: u32,
    pub wander_steps_max: u32,

    // Foraging
    /// Pickup radius around a food source, in cells
    pub capture_radius: f32,
    /// Food credited to the colony per delivery
    pub food_per_delivery: f32,
    /// Cap on cosmetic stored-food markers
    pub stored_marker_cap: usize,

    // Digging
    /// Cells dug per exploratory excursion (inclusive range)
    pub dig_quota_min: u32,
    pub dig_quota_max: u32,
    /// Chance per think to reverse the exploratory dig bias
    pub explore_reverse_chance: f64,
    /// Columns and rows kept clear of digging at the grid edges
    pub grid_margin: i32,

    // Brood care
    /// Brood farther than this many cells from the nursery is hauled back
    pub nursery_radius: f32,
    /// Seconds one larva feeding takes
    pub feed_duration: f32,
    /// Food consumed per larva feeding
    pub larva_feed_cost: f32,
    /// Seconds spent tending before re-evaluating
    pub tend_duration: f32,

    // Guarding
    /// Chance to guard brood instead of patrolling
    pub guard_brood_chance: f64,
    /// Patrol oscillation half-width in cells around the entrance
    pub guard_patrol_radius: i32,
    /// Guard dwell range in seconds next to brood
    pub guard_dwell_min: f32,
    pub guard_dwell_max: f32,

    // Caste assignment
    /// Relative weights for ordinary hatches
    pub forager_weight: f32,
    pub digger_weight: f32,
    pub nurse_weight: f32,
    pub guard_weight: f32,
    /// Chance of a male hatch once the colony qualifies
    pub male_chance: f64,
    /// Population required before males can hatch
    pub male_min_population: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            // Time
            max_dt: 0.1,

            // Locomotion
            founder_speed: 28.0,
            worker_speed: 36.0,
            dig_duration: 1.0,

            // Founder life cycle
            landing_delay: 2.0,
            wing_shed_duration: 3.0,
            search_site_duration: 6.0,
            shaft_depth_min: 12,
            shaft_depth_max: 20,
            chamber_width_min: 5,
            chamber_width_max: 8,
            wing_energy_capacity: 100.0,
            wing_energy_drain: 0.25,
            egg_cost_energy: 8.0,
            wing_energy_reserve: 10.0,
            claustral_egg_interval: 8.0,
            max_first_generation_eggs: 6,
            nanitic_threshold: 3,
            groom_interval_min: 2.0,
            groom_interval_max: 4.0,
            mature_egg_interval: 12.0,
            mature_retry_interval: 2.0,
            egg_cost_food: 1.0,
            mature_wander_chance: 0.25,

            // Brood
            brood_hatch_time: 24.0,
            population_cap: 40,

            // Workers
            idle_wait_min: 0.5,
            idle_wait_max: 1.5,
            low_energy_threshold: 20.0,
            energy_move_cost: 0.4,
            rest_regen_rate: 14.0,
            stuck_threshold: 8,
            stall_strike_limit: 3,
            wander_steps_min: 4,
            wander_steps_max: 9,

            // Foraging
            capture_radius: 1.5,
            food_per_delivery: 2.0,
            stored_marker_cap: 24,

            // Digging
            dig_quota_min: 8,
            dig_quota_max: 18,
            explore_reverse_chance: 0.05,
            grid_margin: 2,

            // Brood care
            nursery_radius: 6.0,
            feed_duration: 1.5,
            larva_feed_cost: 0.25,
            tend_duration: 3.0,

            // Guarding
            guard_brood_chance: 0.5,
            guard_patrol_radius: 5,
            guard_dwell_min: 2.0,
            guard_dwell_max: 5.0,

            // Caste assignment
            forager_weight: 0.35,
            digger_weight: 0.30,
            nurse_weight: 0.20,
            guard_weight: 0.15,
            male_chance: 0.05,
            male_min_population: 12,
        }
    }
}

impl SimulationParams {
    /// Params tuned for fast test runs: short timers, quick hatches.
    pub fn fast_test() -> Self {
        let mut params = Self::default();
        params.landing_delay = 0.2;
        params.wing_shed_duration = 0.3;
        params.search_site_duration = 0.6;
        params.dig_duration = 0.2;
        params.claustral_egg_interval = 1.0;
        params.mature_egg_interval = 1.5;
        params.brood_hatch_time = 3.0;
        params.idle_wait_min = 0.1;
        params.idle_wait_max = 0.3;
        params
    }
}
