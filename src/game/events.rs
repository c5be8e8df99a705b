//! Skater Events
//!
//! Cues fired for animation, audio and VFX collaborators. Delivery is
//! fire-and-forget: sinks run synchronously inside the tick and return nothing.

use serde::{Serialize, Deserialize};

use crate::game::boost::BoostSource;
use crate::game::trick::TrickKind;

/// Event payload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SkaterEventData {
    /// A trick was committed
    TrickPerformed { kind: TrickKind },

    /// Touched down after being airborne
    Landed { combo: u32 },

    /// Powerslide began (-1 left, +1 right)
    DriftStarted { direction: f32 },

    /// Powerslide ended
    DriftStopped { duration: f32 },

    /// Points entered the boost ledger
    BoostCredited { source: BoostSource, points: f32 },
}

/// An event stamped with the tick it happened on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkaterEvent {
    /// Tick when the event occurred
    pub tick: u32,
    /// Event data
    pub data: SkaterEventData,
}

impl SkaterEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: SkaterEventData) -> Self {
        Self { tick, data }
    }

    /// Create trick performed event.
    pub fn trick_performed(tick: u32, kind: TrickKind) -> Self {
        Self::new(tick, SkaterEventData::TrickPerformed { kind })
    }

    /// Create landed event.
    pub fn landed(tick: u32, combo: u32) -> Self {
        Self::new(tick, SkaterEventData::Landed { combo })
    }

    /// Create drift started event.
    pub fn drift_started(tick: u32, direction: f32) -> Self {
        Self::new(tick, SkaterEventData::DriftStarted { direction })
    }

    /// Create drift stopped event.
    pub fn drift_stopped(tick: u32, duration: f32) -> Self {
        Self::new(tick, SkaterEventData::DriftStopped { duration })
    }

    /// Create boost credited event.
    pub fn boost_credited(tick: u32, source: BoostSource, points: f32) -> Self {
        Self::new(tick, SkaterEventData::BoostCredited { source, points })
    }
}

/// Receiver of skater events.
///
/// Injected at construction; the core never looks collaborators up.
pub trait EventSink {
    /// Handle one event. Must not block.
    fn on_event(&mut self, event: &SkaterEvent);
}

impl<F: FnMut(&SkaterEvent)> EventSink for F {
    fn on_event(&mut self, event: &SkaterEvent) {
        self(event)
    }
}

/// Sink that keeps every event, for tests and tooling.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    /// Events in delivery order
    pub events: Vec<SkaterEvent>,
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &SkaterEvent) {
        self.events.push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        {
            let mut sink = |_: &SkaterEvent| count += 1;
            sink.on_event(&SkaterEvent::landed(3, 0));
            sink.on_event(&SkaterEvent::drift_started(4, 1.0));
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_event_log_keeps_order() {
        let mut log = EventLog::default();
        log.on_event(&SkaterEvent::trick_performed(1, TrickKind::Ollie));
        log.on_event(&SkaterEvent::landed(40, 1));

        assert_eq!(log.events.len(), 2);
        assert_eq!(log.events[0].data, SkaterEventData::TrickPerformed { kind: TrickKind::Ollie });
        assert_eq!(log.events[1].tick, 40);
    }
}
