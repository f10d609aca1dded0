//! Underground colony simulation.
//!
//! A single founding queen digs a nest, rears a first generation of
//! workers sealed off from the surface, and matures into steady egg
//! laying while caste-bound workers forage, dig, nurse, and guard.
//!
//! # Module Structure
//!
//! - `types`: Core type definitions (CellCoord, Carried, Command, etc.)
//! - `params`: Simulation configuration parameters
//! - `agent`: Shared locomotion, digging, and gravity
//! - `founder`: The queen's seven-phase life cycle
//! - `workers`: Worker castes, state machines, chamber construction
//! - `colony`: Food stock, brood queue, chambers, counters
//! - `world`: The owning world struct and tick loop
//! - `snapshot`: Read-only per-tick views for external consumers
//!
//! # Usage
//!
//! ```ignore
//! use formicarium::simulation::{SimulationWorld, SimulationParams};
//!
//! let mut world = SimulationWorld::new(72, 96, seed, SimulationParams::default());
//! loop {
//!     world.tick(1.0 / 30.0);
//!     let snapshot = world.snapshot();
//!     // hand the snapshot to the renderer, queue commands, ...
//! }
//! ```

pub mod agent;
pub mod colony;
pub mod founder;
pub mod params;
pub mod snapshot;
pub mod types;
pub mod workers;
pub mod world;

// Re-export main types for convenience
pub use agent::AgentBody;
pub use colony::{Brood, BroodStage, Colony, FoodSource};
pub use founder::{Founder, FounderState};
pub use params::SimulationParams;
pub use snapshot::{BroodView, ColonyView, FounderView, WorkerView, WorldSnapshot};
pub use types::{BroodId, Carried, CellCoord, Command, SpeedFactor, WorkerId, CELL_SIZE};
pub use workers::{assign_caste, process_worker, Caste, ChamberKind, Worker, WorkerState};
pub use world::{run_headless, SimulationStats, SimulationWorld};
