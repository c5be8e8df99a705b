//! # Powerslide Core
//!
//! Locomotion, drift boost and trick control for an arcade skater.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     POWERSLIDE CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Simulation primitives                     │
//! │  ├── timer.rs    - Fixed-step clock, tick countdowns         │
//! │  ├── math.rs     - glam helpers (+Y up, -Z forward)          │
//! │  └── hash.rs     - State hashing for determinism checks      │
//! │                                                              │
//! │  game/           - Per-tick simulation                       │
//! │  ├── config.rs   - Tunables and validation                   │
//! │  ├── input.rs    - Controls and command buffer               │
//! │  ├── collision.rs- Ground query seam, track geometry         │
//! │  ├── sensor.rs   - Ground contact and coyote time            │
//! │  ├── locomotion.rs - Normal / braking / drifting             │
//! │  ├── trick.rs    - Trick state machine                       │
//! │  ├── boost.rs    - Boost point ledger                        │
//! │  ├── events.rs   - Animation / audio cues                    │
//! │  ├── state.rs    - Skater aggregate and snapshot             │
//! │  └── tick.rs     - Tick orchestration                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tick Order
//!
//! Input buffer drain → ground sense → locomotion → tricks → boost decay.
//!
//! ## Determinism
//!
//! The simulation is single-threaded and fixed-step. Every timer is a whole
//! number of ticks and nothing reads the wall clock, so identical input
//! scripts produce identical state hashes on the same build.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::timer::{Countdown, SimClock};
pub use game::config::{ConfigError, SkaterConfig};
pub use game::collision::{GroundQuery, TrackGeometry};
pub use game::input::{InputEvent, InputEventKind};
pub use game::state::{Skater, SkaterError, Snapshot};
pub use game::tick::{tick, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
