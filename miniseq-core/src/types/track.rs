//! Append-only performance track with a rewindable read cursor

use crate::types::event::{Message, TimedEvent};
use crate::types::message;

/// Ordered sequence of timed events.
///
/// Insertion order is pull order. Reading through `next_event` never removes
/// anything, so the track can be replayed after `set_pos` or `init_pos`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    events: Vec<TimedEvent>,
    #[cfg_attr(feature = "serde", serde(skip))]
    cursor: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    position: u64,
    length: u64,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track from events in pull order
    pub fn from_events(events: Vec<TimedEvent>) -> Self {
        let mut track = Self {
            events,
            ..Self::default()
        };
        track.reset();
        track
    }

    /// Append a message at an absolute tick
    pub fn add(&mut self, payload: impl Into<Message>, tick: u64) {
        self.add_with_delta(payload, tick, 0);
    }

    /// Append a message at `tick + delta`
    pub fn add_with_delta(&mut self, payload: impl Into<Message>, tick: u64, delta: u64) {
        let event = TimedEvent::new(tick + delta, payload);
        self.length = self.length.max(event.tick);
        self.events.push(event);
    }

    /// Append a quarter note: note on at `tick`, note off one beat later
    pub fn add_quarter(&mut self, channel: u8, note: u8, velocity: u8, tick: u64, ppq: u32) {
        self.add(message::note_on(channel, note, velocity), tick);
        self.add(message::note_off(channel, note), tick + ppq as u64);
    }

    /// Event under the cursor, without advancing
    pub fn get_event(&self) -> Option<&TimedEvent> {
        self.events.get(self.cursor)
    }

    /// Event under the cursor; advances the cursor. `None` past the end.
    pub fn next_event(&mut self) -> Option<&TimedEvent> {
        let event = self.events.get(self.cursor)?;
        self.cursor += 1;
        Some(event)
    }

    /// Move the cursor to the first event at or after `target` and return
    /// the new position. Past the last event the cursor parks at the end.
    pub fn set_pos(&mut self, target: u64) -> u64 {
        self.cursor = self
            .events
            .iter()
            .position(|ev| ev.tick >= target)
            .unwrap_or(self.events.len());
        self.position = target;
        self.position
    }

    /// Cursor and position back to the start
    pub fn init_pos(&mut self) {
        self.cursor = 0;
        self.position = 0;
    }

    /// Cursor and position back to the start; recomputes the cached length
    pub fn reset(&mut self) {
        self.init_pos();
        self.length = self.events.iter().map(|ev| ev.tick).max().unwrap_or(0);
    }

    /// Tick of the last event (0 for an empty track)
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Tick given to the last `set_pos`
    pub fn position(&self) -> u64 {
        self.position
    }

    /// True once every event has been pulled
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.events.len()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_track() -> Track {
        let mut track = Track::new();
        for (i, note) in [60u8, 62, 64, 65].iter().enumerate() {
            track.add_quarter(0, *note, 100, i as u64 * 120, 120);
        }
        track
    }

    #[test]
    fn test_empty_track() {
        let mut track = Track::new();
        assert_eq!(track.length(), 0);
        assert!(track.is_empty());
        assert!(track.is_exhausted());
        assert!(track.next_event().is_none());
    }

    #[test]
    fn test_add_with_delta() {
        let mut track = Track::new();
        track.add(vec![0x90, 60, 100], 100);
        track.add_with_delta(vec![0x80, 60, 0], 100, 20);
        assert_eq!(track.events()[1].tick, 120);
        assert_eq!(track.length(), 120);
    }

    #[test]
    fn test_next_event_is_rewindable() {
        let mut track = scale_track();
        let first: Vec<u64> = std::iter::from_fn(|| track.next_event().map(|e| e.tick)).collect();
        assert_eq!(first.len(), 8);
        assert!(track.next_event().is_none());

        track.init_pos();
        let second: Vec<u64> = std::iter::from_fn(|| track.next_event().map(|e| e.tick)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_set_pos_then_next_event() {
        let mut track = scale_track();
        // Ticks: 0,120,120,240,240,360,360,480
        for target in [0u64, 1, 119, 120, 121, 300, 480] {
            assert_eq!(track.set_pos(target), target);
            let first = track.next_event().map(|e| e.tick).unwrap();
            let expected = track
                .events()
                .iter()
                .map(|e| e.tick)
                .find(|t| *t >= target)
                .unwrap();
            assert_eq!(first, expected);

            let mut last = first;
            while let Some(ev) = track.next_event() {
                assert!(ev.tick >= last);
                last = ev.tick;
            }
        }
    }

    #[test]
    fn test_set_pos_past_end() {
        let mut track = scale_track();
        track.set_pos(10_000);
        assert!(track.is_exhausted());
        assert_eq!(track.position(), 10_000);
        assert!(track.next_event().is_none());
    }

    #[test]
    fn test_length_is_last_tick() {
        let track = scale_track();
        assert_eq!(track.length(), 480);
        assert_eq!(track.len(), 8);
    }

    #[test]
    fn test_reset_recomputes_length() {
        let events = vec![
            TimedEvent::new(0, vec![0x90, 60, 100]),
            TimedEvent::new(240, vec![0x80, 60, 0]),
        ];
        let mut track = Track::from_events(events);
        assert_eq!(track.length(), 240);
        track.next_event();
        track.reset();
        assert_eq!(track.cursor(), 0);
        assert_eq!(track.position(), 0);
        assert_eq!(track.length(), 240);
    }

    #[test]
    fn test_get_event_does_not_advance() {
        let mut track = scale_track();
        assert_eq!(track.get_event().map(|e| e.tick), Some(0));
        assert_eq!(track.cursor(), 0);
        track.next_event();
        assert_eq!(track.get_event().map(|e| e.tick), Some(120));
    }
}
