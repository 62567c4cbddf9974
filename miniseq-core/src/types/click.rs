//! Metronome click generator
//!
//! Builds one bar of click events and replays it forever. The bar is stored
//! once; `next_ev_roll` offsets each replayed event by
//! `repeat_count * pattern_length`, which turns the finite buffer into an
//! unbounded, strictly increasing tick stream.

use crate::types::event::TimedEvent;
use crate::types::message;

/// Beats in one click bar (4/4)
pub const BEATS_PER_BAR: u32 = 4;
/// General MIDI percussion channel (channel 10)
pub const CLICK_CHANNEL: u8 = 9;
/// High cowbell on the downbeat
pub const ACCENT_NOTE: u8 = 67;
pub const ACCENT_VELOCITY: u8 = 120;
/// Low cowbell on the other beats
pub const BEAT_NOTE: u8 = 68;
pub const BEAT_VELOCITY: u8 = 80;

/// One bar of metronome clicks with a wrapping cursor
#[derive(Debug, Clone)]
pub struct ClickGenerator {
    ppq: u32,
    pattern: Vec<TimedEvent>,
    cursor: usize,
    repeat_count: u64,
    repeating: bool,
    active: bool,
}

impl ClickGenerator {
    /// Create a repeating generator with one bar built for `ppq`
    pub fn new(ppq: u32) -> Self {
        let mut click = Self {
            ppq,
            pattern: Vec::with_capacity(BEATS_PER_BAR as usize * 2),
            cursor: 0,
            repeat_count: 0,
            repeating: true,
            active: false,
        };
        click.build(ppq);
        click
    }

    /// Rebuild the bar: accent on beat 0, secondary clicks on beats 1..3.
    /// Each beat is a note on at `n * ppq` and a note off at `(n + 1) * ppq`.
    pub fn build(&mut self, ppq: u32) {
        self.ppq = ppq;
        self.pattern.clear();
        let ppq = ppq as u64;

        for beat in 0..BEATS_PER_BAR as u64 {
            let (note, velocity) = if beat == 0 {
                (ACCENT_NOTE, ACCENT_VELOCITY)
            } else {
                (BEAT_NOTE, BEAT_VELOCITY)
            };
            self.pattern.push(TimedEvent::new(
                beat * ppq,
                message::note_on(CLICK_CHANNEL, note, velocity),
            ));
            self.pattern.push(TimedEvent::new(
                (beat + 1) * ppq,
                message::note_off(CLICK_CHANNEL, note),
            ));
        }
        self.restart();
    }

    /// Next pattern event at its in-bar tick.
    ///
    /// When the bar is exhausted a repeating generator wraps the cursor,
    /// counts the repeat and yields the first event again; a one-shot
    /// generator returns `None`.
    pub fn next_ev(&mut self) -> Option<&TimedEvent> {
        if self.cursor >= self.pattern.len() {
            if !self.repeating || self.pattern.is_empty() {
                return None;
            }
            self.cursor = 0;
            self.repeat_count += 1;
        }
        let event = &self.pattern[self.cursor];
        self.cursor += 1;
        Some(event)
    }

    /// Next event shifted to its absolute tick in the endless click stream
    pub fn next_ev_roll(&mut self) -> Option<TimedEvent> {
        // next_ev may bump repeat_count, so the offset is read afterwards
        let event = self.next_ev()?.clone();
        Some(event.shifted(self.pattern_length() * self.repeat_count))
    }

    /// Set the cursor to a pattern index
    pub fn set_pos(&mut self, index: usize) {
        self.cursor = index.min(self.pattern.len());
    }

    /// Start again from the first event of a clean bar
    pub fn restart(&mut self) {
        self.set_pos(0);
        self.repeat_count = 0;
    }

    /// Align the cursor with an absolute click tick so the next rolled event
    /// is the first one at or after `tick`.
    pub fn seek(&mut self, tick: u64) {
        let length = self.pattern_length();
        if length == 0 {
            self.restart();
            return;
        }
        let within = tick % length;
        self.repeat_count = tick / length;
        self.cursor = self
            .pattern
            .iter()
            .position(|ev| ev.tick >= within)
            .unwrap_or(self.pattern.len());
    }

    /// Ticks in one bar
    pub fn pattern_length(&self) -> u64 {
        BEATS_PER_BAR as u64 * self.ppq as u64
    }

    pub fn repeat_count(&self) -> u64 {
        self.repeat_count
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn ppq(&self) -> u32 {
        self.ppq
    }

    pub fn set_repeating(&mut self, repeating: bool) {
        self.repeating = repeating;
    }

    /// Whether the click is switched on. The generator does not gate itself
    /// on this flag.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_one_bar() {
        let click = ClickGenerator::new(120);
        let ticks: Vec<u64> = click.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 120, 120, 240, 240, 360, 360, 480]);

        assert_eq!(click.events()[0].payload, vec![0x99, ACCENT_NOTE, ACCENT_VELOCITY]);
        assert_eq!(click.events()[1].payload, vec![0x89, ACCENT_NOTE, 0]);
        for ev in &click.events()[2..] {
            assert_eq!(ev.payload[1], BEAT_NOTE);
        }
        assert_eq!(click.pattern_length(), 480);
    }

    #[test]
    fn test_next_ev_wraps_and_counts() {
        let mut click = ClickGenerator::new(24);
        for _ in 0..8 {
            assert!(click.next_ev().is_some());
        }
        assert_eq!(click.repeat_count(), 0);

        let wrapped = click.next_ev().cloned().unwrap();
        assert_eq!(wrapped.tick, 0);
        assert_eq!(click.repeat_count(), 1);
    }

    #[test]
    fn test_one_shot_pattern_ends() {
        let mut click = ClickGenerator::new(24);
        click.set_repeating(false);
        for _ in 0..8 {
            assert!(click.next_ev().is_some());
        }
        assert!(click.next_ev().is_none());
        assert!(click.next_ev_roll().is_none());
        assert_eq!(click.repeat_count(), 0);
    }

    #[test]
    fn test_roll_is_unbounded_and_periodic() {
        let ppq = 120u32;
        let mut click = ClickGenerator::new(ppq);
        let base: Vec<u64> = click.events().iter().map(|e| e.tick).collect();
        let payloads: Vec<Vec<u8>> = click.events().iter().map(|e| e.payload.clone()).collect();

        // Call number 8*N + k yields pattern event k shifted by N bars
        for call in 0..8 * 25u64 {
            let n = call / 8;
            let k = (call % 8) as usize;
            let ev = click.next_ev_roll().unwrap();
            assert_eq!(ev.tick, base[k] + n * 4 * ppq as u64);
            assert_eq!(ev.payload, payloads[k]);
        }
    }

    #[test]
    fn test_roll_is_non_decreasing() {
        let mut click = ClickGenerator::new(96);
        let mut last = 0;
        for _ in 0..100 {
            let tick = click.next_ev_roll().unwrap().tick;
            assert!(tick >= last);
            last = tick;
        }
    }

    #[test]
    fn test_restart_resets_repeat_count() {
        let mut click = ClickGenerator::new(24);
        for _ in 0..20 {
            click.next_ev_roll();
        }
        assert_eq!(click.repeat_count(), 2);
        click.restart();
        assert_eq!(click.repeat_count(), 0);
        assert_eq!(click.next_ev_roll().unwrap().tick, 0);
    }

    #[test]
    fn test_set_pos() {
        let mut click = ClickGenerator::new(24);
        click.set_pos(4);
        assert_eq!(click.next_ev().unwrap().tick, 48);
        click.set_pos(0);
        assert_eq!(click.next_ev().unwrap().tick, 0);
    }

    #[test]
    fn test_seek_to_absolute_tick() {
        let mut click = ClickGenerator::new(120);
        // Bar 2, beat 1
        click.seek(2 * 480 + 100);
        let ev = click.next_ev_roll().unwrap();
        assert_eq!(ev.tick, 2 * 480 + 120);
        assert_eq!(click.repeat_count(), 2);

        click.seek(0);
        assert_eq!(click.next_ev_roll().unwrap().tick, 0);
    }

    #[test]
    fn test_active_flag_does_not_gate() {
        let mut click = ClickGenerator::new(24);
        assert!(!click.is_active());
        assert!(click.next_ev_roll().is_some());
        click.set_active(true);
        assert!(click.is_active());
    }
}
