//! Simulation primitives.
//!
//! Clock and countdowns, vector helpers and state hashing. Nothing in here
//! knows about skaters.

pub mod timer;
pub mod math;
pub mod hash;

// Re-export core types
pub use timer::{Countdown, SimClock};
pub use hash::{compute_state_hash, StateHash, StateHasher};
