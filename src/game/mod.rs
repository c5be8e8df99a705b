//! Skater Simulation
//!
//! Everything that runs inside a tick.
//!
//! ## Module Structure
//!
//! - `config`: Tunables, JSON loading and validation
//! - `input`: Controls, input edges and the command buffer
//! - `collision`: Ground query seam and static track geometry
//! - `sensor`: Ground contact, coyote time, slope normal
//! - `locomotion`: Normal / braking / drifting motion
//! - `trick`: Trick preparation, flicks, landing and combos
//! - `boost`: Boost point ledger
//! - `events`: Cues for animation, audio and VFX
//! - `state`: The skater aggregate and its snapshot
//! - `tick`: Per-tick orchestration

pub mod config;
pub mod input;
pub mod collision;
pub mod sensor;
pub mod locomotion;
pub mod trick;
pub mod boost;
pub mod events;
pub mod state;
pub mod tick;

// Re-export key types
pub use config::{ConfigError, SkaterConfig};
pub use input::{ActionKind, BufferedCommand, ControlState, InputBuffer, InputEvent, InputEventKind};
pub use collision::{CollisionMask, GroundQuery, TrackGeometry};
pub use sensor::{GroundSensor, GroundStatus};
pub use locomotion::{Locomotion, LocomotionState, MotionState};
pub use trick::{TrickKind, TrickPhase, TrickSession};
pub use boost::{BoostLedger, BoostSource};
pub use events::{EventSink, SkaterEvent, SkaterEventData};
pub use state::{Skater, SkaterError, Snapshot};
pub use tick::{tick, replay_script, TickResult};
