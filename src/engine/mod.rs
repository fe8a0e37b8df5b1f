//! Execution engine for hashistack
//!
//! The engine orchestrates:
//! 1. Diffing - Render the planned changes
//! 2. Executing - Confirm, apply with parallelism and persist state

pub mod differ;
pub mod executor;

pub use differ::display_plan;
pub use executor::{ApplyOptions, execute};
