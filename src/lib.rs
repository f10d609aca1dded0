//! Ant colony simulation library
//!
//! Re-exports modules for use by binaries and external front ends.

pub mod grid;
pub mod pathfind;
pub mod simulation;
