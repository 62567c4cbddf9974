//! Timed MIDI events
//!
//! A `TimedEvent` pairs a raw MIDI message with an absolute tick. Equality
//! compares tick and payload; scheduling order is kept in a separate key by
//! the scheduler so the two can never disagree inside a heap.

use crate::types::message;
use std::fmt;

/// Raw MIDI message bytes
pub type Message = Vec<u8>;

/// A MIDI message scheduled at an absolute tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimedEvent {
    /// Absolute position in ticks
    pub tick: u64,
    /// Opaque message bytes sent to the output unchanged
    pub payload: Message,
}

impl TimedEvent {
    pub fn new(tick: u64, payload: impl Into<Message>) -> Self {
        Self {
            tick,
            payload: payload.into(),
        }
    }

    /// Copy of this event moved forward by `offset` ticks
    pub fn shifted(&self, offset: u64) -> Self {
        Self {
            tick: self.tick + offset,
            payload: self.payload.clone(),
        }
    }
}

impl fmt::Display for TimedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@ {:05} {}", self.tick, message::describe(&self.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_includes_payload() {
        let a = TimedEvent::new(10, vec![0x90, 60, 100]);
        let b = TimedEvent::new(10, vec![0x90, 60, 100]);
        let c = TimedEvent::new(10, vec![0x80, 60, 0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shifted_keeps_payload() {
        let ev = TimedEvent::new(120, vec![0x99, 67, 120]);
        let moved = ev.shifted(480);
        assert_eq!(moved.tick, 600);
        assert_eq!(moved.payload, ev.payload);
        assert_eq!(ev.tick, 120);
    }

    #[test]
    fn test_display() {
        let ev = TimedEvent::new(42, vec![0x90, 60, 100]);
        assert_eq!(ev.to_string(), "@ 00042 NoteOn ch1 note 60 vel 100");
    }
}
