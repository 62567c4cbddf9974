//! Merge-and-dispatch scheduler loop
//!
//! One worker thread merges the track and the click stream into a single
//! time-ordered output. Each cycle it promotes due events from the pending
//! queues, pulls a bounded batch from every active source, sends everything
//! that is ready, sleeps out the rest of one tick and advances the playheads
//! by exactly one tick.
//!
//! Everything the control path can change lives in `TransportState`. The
//! control path only ever moves a playhead; the track and click cursors are
//! moved by the worker alone, as are the pending and ready queues.

use crate::engine::lock;
use crate::engine::sink::SharedSink;
use miniseq_core::{ClickGenerator, Result, TimedEvent, Track};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Track shared between controller and worker (`None` until one is loaded)
pub type SharedTrack = Arc<Mutex<Option<Track>>>;
/// Click generator shared between controller and worker
pub type SharedClick = Arc<Mutex<ClickGenerator>>;

/// Sequence transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayState {
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

impl PlayState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlayState::Playing,
            2 => PlayState::Paused,
            _ => PlayState::Stopped,
        }
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Stopped => write!(f, "Stopped"),
            PlayState::Playing => write!(f, "Playing"),
            PlayState::Paused => write!(f, "Paused"),
        }
    }
}

/// Which modes a cycle runs, sampled once at the start of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    pub playing: bool,
    pub clicking: bool,
}

impl Modes {
    pub fn is_active(&self) -> bool {
        self.playing || self.clicking
    }
}

/// A playhead and the number of seeks applied to it.
///
/// Both fields change under one lock, so the worker always sees a tick
/// together with the seek that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Playhead {
    pub tick: u64,
    pub epoch: u64,
}

/// Flags and counters shared by the controller and the scheduler thread
#[derive(Debug)]
pub struct TransportState {
    running: AtomicBool,
    play_state: AtomicU8,
    clicking: AtomicBool,
    seq: Mutex<Playhead>,
    click: Mutex<Playhead>,
    tick_nanos: AtomicU64,
    dispatched: AtomicU64,
    /// Cycles finished by scheduler threads, counted once their sends are done
    cycles: AtomicU64,
}

impl TransportState {
    pub fn new(tick: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            play_state: AtomicU8::new(PlayState::Stopped as u8),
            clicking: AtomicBool::new(false),
            seq: Mutex::new(Playhead::default()),
            click: Mutex::new(Playhead::default()),
            tick_nanos: AtomicU64::new(tick.as_nanos() as u64),
            dispatched: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Mark the worker as running. False if it already was.
    pub fn claim_running(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Ask the worker to leave its loop at the next cycle
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn play_state(&self) -> PlayState {
        PlayState::from_u8(self.play_state.load(Ordering::SeqCst))
    }

    pub fn set_play_state(&self, state: PlayState) {
        self.play_state.store(state as u8, Ordering::SeqCst);
    }

    /// Move from `from` to `to`; false if the state was not `from`
    pub fn transition(&self, from: PlayState, to: PlayState) -> bool {
        self.play_state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_playing(&self) -> bool {
        self.play_state() == PlayState::Playing
    }

    pub fn is_clicking(&self) -> bool {
        self.clicking.load(Ordering::SeqCst)
    }

    pub fn set_clicking(&self, clicking: bool) {
        self.clicking.store(clicking, Ordering::SeqCst);
    }

    pub fn modes(&self) -> Modes {
        Modes {
            playing: self.is_playing(),
            clicking: self.is_clicking(),
        }
    }

    pub fn seq_playhead(&self) -> u64 {
        lock(&self.seq).tick
    }

    pub fn click_playhead(&self) -> u64 {
        lock(&self.click).tick
    }

    pub fn seq_position(&self) -> Playhead {
        *lock(&self.seq)
    }

    pub fn click_position(&self) -> Playhead {
        *lock(&self.click)
    }

    /// Move the sequence playhead. Only the worker moves the track cursor,
    /// when it sees the new epoch at the start of its next cycle.
    pub fn seek_seq(&self, tick: u64) {
        let mut seq = lock(&self.seq);
        seq.tick = tick;
        seq.epoch += 1;
    }

    /// Click playhead back to 0; the worker re-seeks the generator next cycle
    pub fn restart_click(&self) {
        let mut click = lock(&self.click);
        click.tick = 0;
        click.epoch += 1;
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(self.tick_nanos.load(Ordering::Relaxed))
    }

    pub fn set_tick_duration(&self, tick: Duration) {
        self.tick_nanos.store(tick.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Messages sent by scheduler threads so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Cycles whose sends have all been made
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Give up `running` because there is nothing to do.
    ///
    /// Returns false if a mode was switched back on meanwhile and the worker
    /// won `running` back, in which case it must keep looping.
    fn park(&self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        !(self.modes().is_active() && self.claim_running())
    }

    /// Drop to Stopped with the click off after a fatal error
    fn fail(&self) {
        self.set_play_state(PlayState::Stopped);
        self.set_clicking(false);
        self.running.store(false, Ordering::SeqCst);
    }

    /// One tick forward, unless a seek landed since `from` was read
    fn advance_seq(&self, from: Playhead) {
        advance(&self.seq, from);
    }

    fn advance_click(&self, from: Playhead) {
        advance(&self.click, from);
    }
}

fn advance(playhead: &Mutex<Playhead>, from: Playhead) {
    let mut current = lock(playhead);
    if *current == from {
        current.tick += 1;
    }
}

/// Where a queued event came from; each source has its own playhead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Sequence,
    Click,
}

/// Heap entry ordered by (tick, arrival) only.
///
/// The payload never takes part in the ordering, so events with equal ticks
/// leave the heap in the order they were pulled.
#[derive(Debug)]
struct QueuedEvent {
    tick: u64,
    arrival: u64,
    source: Source,
    event: TimedEvent,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.arrival == other.arrival
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reverse order for min-heap behavior (earliest first)
        other
            .tick
            .cmp(&self.tick)
            .then_with(|| other.arrival.cmp(&self.arrival))
    }
}

/// The worker side of the transport
pub struct Scheduler {
    state: Arc<TransportState>,
    track: SharedTrack,
    click: SharedClick,
    sink: SharedSink,
    batch_size: usize,

    pending_seq: BinaryHeap<QueuedEvent>,
    pending_click: BinaryHeap<QueuedEvent>,
    ready: BinaryHeap<QueuedEvent>,
    arrivals: u64,
    seen_seq_epoch: Option<u64>,
    seen_click_epoch: Option<u64>,
}

impl Scheduler {
    pub fn new(
        state: Arc<TransportState>,
        track: SharedTrack,
        click: SharedClick,
        sink: SharedSink,
        batch_size: usize,
    ) -> Self {
        Self {
            state,
            track,
            click,
            sink,
            batch_size: batch_size.max(1),
            pending_seq: BinaryHeap::new(),
            pending_click: BinaryHeap::new(),
            ready: BinaryHeap::new(),
            arrivals: 0,
            seen_seq_epoch: None,
            seen_click_epoch: None,
        }
    }

    /// Run the loop on its own thread. The caller must have claimed
    /// `running` first.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        thread::spawn(move || self.run())
    }

    /// Loop until stopped, idle, or the sink fails
    pub fn run(mut self) -> Result<()> {
        log::debug!("Scheduler thread started");
        let result = self.run_loop();
        match &result {
            Ok(()) => log::debug!("Scheduler thread exited"),
            Err(e) => {
                log::error!("Scheduler stopped: {}", e);
                lock(&self.click).set_active(false);
                self.state.fail();
            }
        }
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        loop {
            if !self.state.is_running() {
                return Ok(());
            }
            let modes = self.state.modes();
            if !modes.is_active() {
                if self.state.park() {
                    return Ok(());
                }
                continue;
            }
            self.run_cycle(modes)?;
        }
    }

    /// One scheduler cycle; returns the number of messages sent
    pub fn run_cycle(&mut self, modes: Modes) -> Result<usize> {
        let started = Instant::now();
        let (seq, click) = self.resync();

        if modes.playing {
            self.promote(Source::Sequence, seq.tick);
            self.pull_track(seq);
        }
        if modes.clicking {
            self.promote(Source::Click, click.tick);
            self.pull_click(click);
        }

        let sent = self.dispatch()?;
        self.state.cycles.fetch_add(1, Ordering::SeqCst);

        let ended = modes.playing && self.track_finished(seq.tick);
        if ended && self.state.transition(PlayState::Playing, PlayState::Stopped) {
            log::info!("End of track at tick {}", seq.tick);
        }

        self.pace(started);

        if modes.playing && !ended {
            self.state.advance_seq(seq);
        }
        if modes.clicking {
            self.state.advance_click(click);
        }
        Ok(sent)
    }

    /// Apply seeks requested since the last cycle and return both playheads.
    /// The first cycle of a worker always resyncs.
    fn resync(&mut self) -> (Playhead, Playhead) {
        let seq = self.state.seq_position();
        if self.seen_seq_epoch != Some(seq.epoch) {
            self.seen_seq_epoch = Some(seq.epoch);
            self.pending_seq.clear();
            if let Some(track) = lock(&self.track).as_mut() {
                track.set_pos(seq.tick);
            }
            log::debug!("Sequence resynced at tick {}", seq.tick);
        }

        let click = self.state.click_position();
        if self.seen_click_epoch != Some(click.epoch) {
            self.seen_click_epoch = Some(click.epoch);
            self.pending_click.clear();
            lock(&self.click).seek(click.tick);
            log::debug!("Click resynced at tick {}", click.tick);
        }
        (seq, click)
    }

    /// Move every pending event of `source` that is due at `head` to ready
    fn promote(&mut self, source: Source, head: u64) {
        let pending = match source {
            Source::Sequence => &mut self.pending_seq,
            Source::Click => &mut self.pending_click,
        };
        while pending.peek().map_or(false, |q| q.tick <= head) {
            if let Some(queued) = pending.pop() {
                self.ready.push(queued);
            }
        }
    }

    /// Pull the next batch from the track. Nothing is pulled when a seek or
    /// a track swap landed after `resync`; the next cycle picks it up.
    fn pull_track(&mut self, head: Playhead) {
        let room = self.batch_size.saturating_sub(self.pending_seq.len());
        let mut pulled = Vec::with_capacity(room);
        {
            let mut track = lock(&self.track);
            if self.state.seq_position().epoch == head.epoch {
                if let Some(track) = track.as_mut() {
                    while pulled.len() < room {
                        match track.next_event() {
                            Some(event) => pulled.push(event.clone()),
                            None => break,
                        }
                    }
                }
            }
        }
        self.admit(Source::Sequence, head.tick, pulled);
    }

    fn pull_click(&mut self, head: Playhead) {
        let room = self.batch_size.saturating_sub(self.pending_click.len());
        let mut pulled = Vec::with_capacity(room);
        {
            let mut click = lock(&self.click);
            if self.state.click_position().epoch == head.epoch {
                while pulled.len() < room {
                    match click.next_ev_roll() {
                        Some(event) => pulled.push(event),
                        None => break,
                    }
                }
            }
        }
        self.admit(Source::Click, head.tick, pulled);
    }

    /// Queue pulled events: ready if due at `head`, pending otherwise
    fn admit(&mut self, source: Source, head: u64, events: Vec<TimedEvent>) {
        for event in events {
            self.arrivals += 1;
            let queued = QueuedEvent {
                tick: event.tick,
                arrival: self.arrivals,
                source,
                event,
            };
            if queued.tick <= head {
                self.ready.push(queued);
            } else if source == Source::Sequence {
                self.pending_seq.push(queued);
            } else {
                self.pending_click.push(queued);
            }
        }
    }

    /// Send every ready event in (tick, arrival) order. Messages that went
    /// out before a failed send are still counted.
    fn dispatch(&mut self) -> Result<usize> {
        if self.ready.is_empty() {
            return Ok(0);
        }
        let mut sink = lock(&self.sink);
        let mut sent = 0;
        let mut outcome = Ok(());
        while let Some(queued) = self.ready.pop() {
            log::debug!("{:?} {}", queued.source, queued.event);
            if let Err(e) = sink.send(&queued.event.payload) {
                outcome = Err(e);
                break;
            }
            sent += 1;
        }
        self.state
            .dispatched
            .fetch_add(sent as u64, Ordering::Relaxed);
        outcome.map(|()| sent)
    }

    /// Playhead at or past the end and nothing of the track left to send
    fn track_finished(&self, head: u64) -> bool {
        if !self.pending_seq.is_empty() {
            return false;
        }
        match lock(&self.track).as_ref() {
            Some(track) => head >= track.length() && track.is_exhausted(),
            None => true,
        }
    }

    /// Sleep out whatever is left of one tick
    fn pace(&self, started: Instant) {
        let tick = self.state.tick_duration();
        let elapsed = started.elapsed();
        if elapsed < tick {
            thread::sleep(tick - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::{shared, RecordingSink};
    use miniseq_core::types::message;

    struct Fixture {
        state: Arc<TransportState>,
        track: SharedTrack,
        click: SharedClick,
        probe: RecordingSink,
        scheduler: Scheduler,
    }

    fn fixture(track: Option<Track>, ppq: u32, batch_size: usize) -> Fixture {
        let state = Arc::new(TransportState::new(Duration::ZERO));
        let track = Arc::new(Mutex::new(track));
        let click = Arc::new(Mutex::new(ClickGenerator::new(ppq)));
        let probe = RecordingSink::new();
        let scheduler = Scheduler::new(
            state.clone(),
            track.clone(),
            click.clone(),
            shared(probe.clone()),
            batch_size,
        );
        Fixture {
            state,
            track,
            click,
            probe,
            scheduler,
        }
    }

    fn two_note_track() -> Track {
        let mut track = Track::new();
        track.add(message::note_on(0, 60, 100), 0);
        track.add(message::note_off(0, 60), 120);
        track
    }

    const PLAYING: Modes = Modes {
        playing: true,
        clicking: false,
    };
    const CLICKING: Modes = Modes {
        playing: false,
        clicking: true,
    };

    #[test]
    fn test_queue_order_is_tick_then_arrival() {
        let mut heap = BinaryHeap::new();
        let entry = |tick, arrival, payload: u8| QueuedEvent {
            tick,
            arrival,
            source: Source::Sequence,
            event: TimedEvent::new(tick, vec![payload]),
        };
        heap.push(entry(5, 3, 0xC));
        heap.push(entry(1, 4, 0xD));
        heap.push(entry(5, 1, 0xA));
        heap.push(entry(5, 2, 0xB));

        let order: Vec<u8> = std::iter::from_fn(|| heap.pop())
            .map(|q| q.event.payload[0])
            .collect();
        assert_eq!(order, vec![0xD, 0xA, 0xB, 0xC]);
    }

    #[test]
    fn test_cycle_dispatches_due_and_defers_future() {
        let mut f = fixture(Some(two_note_track()), 120, 64);
        f.state.set_play_state(PlayState::Playing);

        assert_eq!(f.scheduler.run_cycle(PLAYING).unwrap(), 1);
        assert_eq!(f.probe.messages(), vec![message::note_on(0, 60, 100)]);
        assert_eq!(f.scheduler.pending_seq.len(), 1);
        assert_eq!(f.state.seq_playhead(), 1);
    }

    #[test]
    fn test_playhead_advances_once_per_cycle() {
        let mut f = fixture(Some(two_note_track()), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        for expected in 1..=50 {
            f.scheduler.run_cycle(PLAYING).unwrap();
            assert_eq!(f.state.seq_playhead(), expected);
            assert_eq!(f.state.click_playhead(), 0);
        }
    }

    #[test]
    fn test_end_of_track_stops_playing() {
        let mut f = fixture(Some(two_note_track()), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        while f.state.is_playing() {
            f.scheduler.run_cycle(PLAYING).unwrap();
        }
        assert_eq!(f.state.seq_playhead(), 120);
        assert_eq!(
            f.probe.messages(),
            vec![message::note_on(0, 60, 100), message::note_off(0, 60)]
        );
    }

    #[test]
    fn test_empty_track_stops_immediately() {
        let mut f = fixture(Some(Track::new()), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        assert_eq!(f.scheduler.run_cycle(PLAYING).unwrap(), 0);
        assert_eq!(f.state.play_state(), PlayState::Stopped);
        assert!(f.probe.is_empty());
    }

    #[test]
    fn test_click_accent_first() {
        let mut f = fixture(None, 4, 64);
        f.state.set_clicking(true);
        for _ in 0..32 {
            f.scheduler.run_cycle(CLICKING).unwrap();
        }
        let notes: Vec<(u8, u8)> = f
            .probe
            .messages()
            .iter()
            .filter(|m| m[0] & 0xF0 == message::NOTE_ON)
            .map(|m| (m[1], m[2]))
            .collect();
        assert_eq!(
            notes,
            vec![
                (67, 120),
                (68, 80),
                (68, 80),
                (68, 80),
                (67, 120),
                (68, 80),
                (68, 80),
                (68, 80)
            ]
        );
    }

    #[test]
    fn test_click_lookahead_is_bounded() {
        let mut f = fixture(None, 4, 8);
        f.state.set_clicking(true);
        for _ in 0..200 {
            f.scheduler.run_cycle(CLICKING).unwrap();
            assert!(f.scheduler.pending_click.len() <= 8);
        }
        assert_eq!(f.state.click_playhead(), 200);
        // 200 ticks at 16 ticks per bar
        assert!(f.click.lock().unwrap().repeat_count() >= 12);
    }

    #[test]
    fn test_seek_drops_stale_pending() {
        let mut f = fixture(Some(two_note_track()), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        f.scheduler.run_cycle(PLAYING).unwrap();
        assert_eq!(f.scheduler.pending_seq.len(), 1);

        f.state.seek_seq(0);
        f.probe.clear();
        f.scheduler.run_cycle(PLAYING).unwrap();
        // Replayed from the start, the deferred note off was not duplicated
        assert_eq!(f.probe.messages(), vec![message::note_on(0, 60, 100)]);
        assert_eq!(f.scheduler.pending_seq.len(), 1);
    }

    #[test]
    fn test_send_failure_is_fatal() {
        let state = Arc::new(TransportState::new(Duration::ZERO));
        let track = Arc::new(Mutex::new(Some(two_note_track())));
        let click = Arc::new(Mutex::new(ClickGenerator::new(120)));
        click.lock().unwrap().set_active(true);
        let scheduler = Scheduler::new(
            state.clone(),
            track,
            click.clone(),
            shared(RecordingSink::failing_after(0)),
            64,
        );
        state.set_play_state(PlayState::Playing);
        state.set_clicking(true);
        assert!(state.claim_running());

        let result = scheduler.run();
        assert!(matches!(result, Err(e) if e.is_device()));
        assert_eq!(state.play_state(), PlayState::Stopped);
        assert!(!state.is_running());
        assert!(!state.is_clicking());
        assert!(!click.lock().unwrap().is_active());
    }

    /// One note on per tick, note number = tick
    fn tick_track(len: u64) -> Track {
        let mut track = Track::new();
        for tick in 0..len {
            track.add(message::note_on(0, tick as u8, 100), tick);
        }
        track
    }

    #[test]
    fn test_seek_after_resync_pulls_nothing() {
        let mut f = fixture(Some(tick_track(100)), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        for _ in 0..50 {
            f.scheduler.run_cycle(PLAYING).unwrap();
        }
        assert_eq!(f.probe.len(), 50);

        // Seek lands between the playhead read and the pull
        let (seq, _) = f.scheduler.resync();
        assert_eq!(seq.tick, 50);
        f.state.seek_seq(0);
        f.scheduler.pull_track(seq);
        assert!(f.scheduler.ready.is_empty());

        // The stale cycle must not advance over the seek either
        f.state.advance_seq(seq);
        assert_eq!(f.state.seq_playhead(), 0);

        f.probe.clear();
        for _ in 0..5 {
            assert_eq!(f.scheduler.run_cycle(PLAYING).unwrap(), 1);
        }
        let notes: Vec<u8> = f.probe.messages().iter().map(|m| m[1]).collect();
        assert_eq!(notes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_track_swap_after_resync_pulls_nothing() {
        let mut f = fixture(Some(tick_track(100)), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        for _ in 0..30 {
            f.scheduler.run_cycle(PLAYING).unwrap();
        }

        let (seq, _) = f.scheduler.resync();
        {
            let mut track = f.track.lock().unwrap();
            *track = Some(tick_track(100));
            f.state.seek_seq(0);
        }
        f.scheduler.pull_track(seq);
        assert!(f.scheduler.ready.is_empty());

        f.probe.clear();
        f.scheduler.run_cycle(PLAYING).unwrap();
        assert_eq!(f.probe.messages(), vec![message::note_on(0, 0, 100)]);
    }

    #[test]
    fn test_click_restart_after_resync_pulls_nothing() {
        let mut f = fixture(None, 4, 64);
        f.state.set_clicking(true);
        for _ in 0..10 {
            f.scheduler.run_cycle(CLICKING).unwrap();
        }

        let (_, click) = f.scheduler.resync();
        f.state.restart_click();
        f.scheduler.pull_click(click);
        assert!(f.scheduler.ready.is_empty());

        f.probe.clear();
        f.scheduler.run_cycle(CLICKING).unwrap();
        assert_eq!(f.probe.messages(), vec![message::note_on(9, 67, 120)]);
        assert_eq!(f.state.click_playhead(), 1);
    }

    #[test]
    fn test_seek_to_current_tick_is_not_skipped() {
        let mut f = fixture(Some(tick_track(20)), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        for _ in 0..5 {
            f.scheduler.run_cycle(PLAYING).unwrap();
        }
        let (seq, _) = f.scheduler.resync();
        f.state.seek_seq(seq.tick);
        f.state.advance_seq(seq);
        assert_eq!(f.state.seq_playhead(), 5);
    }

    #[test]
    fn test_failed_send_counts_what_went_out() {
        let state = Arc::new(TransportState::new(Duration::ZERO));
        let mut track = Track::new();
        track.add(message::note_on(0, 60, 100), 0);
        track.add(message::note_on(0, 64, 100), 0);
        let probe = RecordingSink::failing_after(1);
        let mut scheduler = Scheduler::new(
            state.clone(),
            Arc::new(Mutex::new(Some(track))),
            Arc::new(Mutex::new(ClickGenerator::new(120))),
            shared(probe.clone()),
            64,
        );
        state.set_play_state(PlayState::Playing);

        assert!(scheduler.run_cycle(PLAYING).is_err());
        assert_eq!(state.dispatched(), 1);
        assert_eq!(probe.messages(), vec![message::note_on(0, 60, 100)]);
    }

    #[test]
    fn test_cycles_counted_once_each() {
        let mut f = fixture(Some(two_note_track()), 120, 64);
        f.state.set_play_state(PlayState::Playing);
        assert_eq!(f.state.cycles(), 0);
        for _ in 0..3 {
            f.scheduler.run_cycle(PLAYING).unwrap();
        }
        assert_eq!(f.state.cycles(), 3);
    }

    #[test]
    fn test_idle_worker_exits() {
        let f = fixture(Some(two_note_track()), 120, 64);
        assert!(f.state.claim_running());
        let handle = f.scheduler.spawn();
        assert!(handle.join().unwrap().is_ok());
        assert!(!f.state.is_running());
        assert!(f.track.lock().unwrap().is_some());
    }
}
