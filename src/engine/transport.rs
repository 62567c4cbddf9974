//! Transport control
//!
//! `TransportController` is the control-path API: play, pause, stop, seek,
//! click and tempo. It owns the shared state and starts a scheduler worker
//! whenever a mode switches on. A worker whose modes are all off exits on its
//! own, so there is never more than one worker alive.

use crate::engine::lock;
use crate::engine::scheduler::{PlayState, Scheduler, SharedClick, SharedTrack, TransportState};
use crate::engine::sink::{self, OutputSink, SharedSink};
use miniseq_core::{ClickGenerator, Result, SeqConfig, SeqError, TimeBase, Track};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Slack on top of two ticks when waiting for the worker to finish a cycle
const CYCLE_WAIT: Duration = Duration::from_millis(50);

/// Snapshot of the transport for display
#[derive(Debug, Clone, PartialEq)]
pub struct TransportStatus {
    pub state: PlayState,
    pub clicking: bool,
    pub running: bool,
    pub seq_playhead: u64,
    pub click_playhead: u64,
    /// `None` when no track is loaded
    pub track_length: Option<u64>,
    pub bpm: f64,
    pub ppq: u32,
    pub dispatched: u64,
}

/// Worker handle plus bookkeeping, guarded by one lock so lifecycle
/// operations never interleave
#[derive(Default)]
struct Lifecycle {
    handle: Option<JoinHandle<Result<()>>>,
    spawned: u64,
}

pub struct TransportController {
    config: SeqConfig,
    time_base: Mutex<TimeBase>,
    state: Arc<TransportState>,
    track: SharedTrack,
    click: SharedClick,
    sink: SharedSink,
    lifecycle: Mutex<Lifecycle>,
    fault: Mutex<Option<SeqError>>,
}

impl TransportController {
    /// Validate `config` and take ownership of `output`. No thread is started.
    pub fn new(config: SeqConfig, output: impl OutputSink + 'static) -> Result<Self> {
        Self::with_shared_sink(config, sink::shared(output))
    }

    pub fn with_shared_sink(config: SeqConfig, sink: SharedSink) -> Result<Self> {
        let time_base = config.time_base()?;
        let state = Arc::new(TransportState::new(time_base.tick_duration()));
        log::debug!(
            "Transport ready: {} BPM, {} PPQ, tick {:.6}s",
            time_base.bpm(),
            time_base.ppq(),
            time_base.tick_seconds()
        );

        Ok(Self {
            click: Arc::new(Mutex::new(ClickGenerator::new(config.ppq))),
            config,
            time_base: Mutex::new(time_base),
            state,
            track: Arc::new(Mutex::new(None)),
            sink,
            lifecycle: Mutex::new(Lifecycle::default()),
            fault: Mutex::new(None),
        })
    }

    /// Replace the current track. The playhead goes back to 0.
    pub fn load_track(&self, track: Track) {
        log::info!(
            "Loaded track: {} events, length {} ticks",
            track.len(),
            track.length()
        );
        // Swap and seek under the track lock so a cycle never pulls from the
        // new track at the old playhead
        let mut current = lock(&self.track);
        *current = Some(track);
        self.state.seek_seq(0);
    }

    /// Remove the current track. A playing sequence stops at the next cycle.
    pub fn unload_track(&self) -> Option<Track> {
        let mut current = lock(&self.track);
        let track = current.take();
        self.state.seek_seq(0);
        track
    }

    fn track_length(&self) -> Result<u64> {
        lock(&self.track)
            .as_ref()
            .map(Track::length)
            .ok_or(SeqError::NoTrack)
    }

    /// Start or resume the sequence.
    ///
    /// From Stopped at or past the end of the track the playhead rewinds to
    /// 0 first. Playing again while playing changes nothing.
    pub fn play(&self) -> Result<()> {
        let length = self.track_length()?;
        let mut lifecycle = lock(&self.lifecycle);

        if self.state.play_state() == PlayState::Stopped
            && length > 0
            && self.state.seq_playhead() >= length
        {
            self.state.seek_seq(0);
        }
        self.state.set_play_state(PlayState::Playing);
        self.ensure_running(&mut lifecycle);
        log::info!("Playing from tick {}", self.state.seq_playhead());
        Ok(())
    }

    /// Hold the sequence at its playhead and silence sounding notes.
    /// The click keeps running. Does nothing unless playing.
    pub fn pause(&self) -> Result<()> {
        self.track_length()?;
        let mut lifecycle = lock(&self.lifecycle);

        if !self.state.transition(PlayState::Playing, PlayState::Paused) {
            log::debug!("Pause ignored: {}", self.state.play_state());
            return Ok(());
        }

        let silenced = if self.state.is_clicking() {
            // Click off around the panic so no click lands inside it
            self.state.set_clicking(false);
            self.wait_for_cycle();
            let silenced = self.panic();
            self.state.set_clicking(true);
            self.ensure_running(&mut lifecycle);
            silenced
        } else {
            self.wait_for_cycle();
            self.panic()
        };
        log::info!("Paused at tick {}", self.state.seq_playhead());
        silenced
    }

    /// Pause when playing, play otherwise
    pub fn play_pause(&self) -> Result<()> {
        if self.state.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Stop sequence and click, wait for the worker, silence the output and
    /// rewind. Reports a worker fault if one is pending.
    pub fn stop(&self) -> Result<()> {
        let mut lifecycle = lock(&self.lifecycle);
        self.state.set_play_state(PlayState::Stopped);
        self.state.set_clicking(false);
        lock(&self.click).set_active(false);
        self.shutdown_worker(&mut lifecycle);

        let silenced = self.panic();
        self.state.seek_seq(0);
        log::info!("Stopped");

        match self.take_stored_fault() {
            Some(fault) => Err(fault),
            None => silenced,
        }
    }

    /// Move the sequence playhead to tick 0
    pub fn goto_start(&self) -> Result<u64> {
        self.track_length()?;
        self.seek(0)
    }

    /// Move the sequence playhead to the last tick of the track
    pub fn goto_end(&self) -> Result<u64> {
        let length = self.track_length()?;
        self.seek(length)
    }

    /// The worker moves the track cursor when it picks up the new playhead
    fn seek(&self, tick: u64) -> Result<u64> {
        self.state.seek_seq(tick);
        log::info!("Playhead at tick {}", tick);
        Ok(tick)
    }

    /// Switch the metronome; returns whether it is now on.
    ///
    /// The click always starts from the accent of a fresh bar. Turning it off
    /// silences the output only while the sequence is playing.
    pub fn toggle_click(&self) -> Result<bool> {
        let mut lifecycle = lock(&self.lifecycle);

        if self.state.is_clicking() {
            self.state.set_clicking(false);
            lock(&self.click).set_active(false);
            if self.state.is_playing() {
                self.wait_for_cycle();
                self.panic()?;
            }
            log::info!("Click off");
            return Ok(false);
        }

        {
            // The worker re-seeks the generator to the new click epoch
            let mut click = lock(&self.click);
            click.set_active(true);
            self.state.restart_click();
        }
        self.state.set_clicking(true);
        self.ensure_running(&mut lifecycle);
        log::info!("Click on");
        Ok(true)
    }

    pub fn is_clicking(&self) -> bool {
        self.state.is_clicking()
    }

    /// Whether the click generator is switched on. Follows `is_clicking`,
    /// including after a worker fault.
    pub fn click_active(&self) -> bool {
        lock(&self.click).is_active()
    }

    /// Change tempo. Takes effect at the next cycle; playheads are untouched.
    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        let mut time_base = lock(&self.time_base);
        time_base.set_bpm(bpm)?;
        self.state.set_tick_duration(time_base.tick_duration());
        log::info!("Tempo {} BPM", bpm);
        Ok(())
    }

    pub fn bpm(&self) -> f64 {
        lock(&self.time_base).bpm()
    }

    pub fn ppq(&self) -> u32 {
        self.config.ppq
    }

    pub fn config(&self) -> &SeqConfig {
        &self.config
    }

    pub fn play_state(&self) -> PlayState {
        self.state.play_state()
    }

    pub fn seq_playhead(&self) -> u64 {
        self.state.seq_playhead()
    }

    pub fn click_playhead(&self) -> u64 {
        self.state.click_playhead()
    }

    /// True while a scheduler worker owns the loop
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Workers started since creation
    pub fn workers_spawned(&self) -> u64 {
        lock(&self.lifecycle).spawned
    }

    pub fn status(&self) -> TransportStatus {
        let time_base = lock(&self.time_base);
        TransportStatus {
            state: self.state.play_state(),
            clicking: self.state.is_clicking(),
            running: self.state.is_running(),
            seq_playhead: self.state.seq_playhead(),
            click_playhead: self.state.click_playhead(),
            track_length: lock(&self.track).as_ref().map(Track::length),
            bpm: time_base.bpm(),
            ppq: time_base.ppq(),
            dispatched: self.state.dispatched(),
        }
    }

    /// All sound off and reset controllers on every channel
    pub fn panic(&self) -> Result<()> {
        log::debug!("Panic");
        lock(&self.sink).panic()
    }

    /// Error a finished worker left behind, if any
    pub fn take_fault(&self) -> Option<SeqError> {
        {
            let mut lifecycle = lock(&self.lifecycle);
            let finished = lifecycle
                .handle
                .as_ref()
                .map_or(false, JoinHandle::is_finished);
            if finished {
                if let Some(handle) = lifecycle.handle.take() {
                    self.reap(handle);
                }
            }
        }
        self.take_stored_fault()
    }

    /// Stop everything and release the output device
    pub fn close(&self) -> Result<()> {
        let stopped = self.stop();
        lock(&self.sink).close();
        log::info!("Transport closed");
        stopped
    }

    /// Start a worker unless one already owns the loop
    fn ensure_running(&self, lifecycle: &mut Lifecycle) {
        if !self.state.claim_running() {
            return;
        }
        // The previous worker has given up `running` and is exiting
        if let Some(handle) = lifecycle.handle.take() {
            self.reap(handle);
        }
        let scheduler = Scheduler::new(
            self.state.clone(),
            self.track.clone(),
            self.click.clone(),
            self.sink.clone(),
            self.config.batch_size,
        );
        lifecycle.handle = Some(scheduler.spawn());
        lifecycle.spawned += 1;
        log::debug!("Scheduler worker #{} started", lifecycle.spawned);
    }

    /// Block until a cycle that may have sampled the old modes has sent
    /// everything, or the worker is gone. Bounded by two ticks plus slack.
    fn wait_for_cycle(&self) {
        let seen = self.state.cycles();
        let deadline = Instant::now()
            + self.state.tick_duration().saturating_mul(2)
            + CYCLE_WAIT;
        while self.state.is_running()
            && self.state.cycles() == seen
            && Instant::now() < deadline
        {
            thread::sleep(Duration::from_micros(100));
        }
    }

    fn shutdown_worker(&self, lifecycle: &mut Lifecycle) {
        self.state.request_stop();
        if let Some(handle) = lifecycle.handle.take() {
            self.reap(handle);
        }
    }

    /// Join a worker and keep its error for `take_fault`
    fn reap(&self, handle: JoinHandle<Result<()>>) {
        let outcome = match handle.join() {
            Ok(result) => result,
            Err(_) => Err(SeqError::WorkerPanicked),
        };
        if let Err(e) = outcome {
            *lock(&self.fault) = Some(e);
        }
    }

    fn take_stored_fault(&self) -> Option<SeqError> {
        lock(&self.fault).take()
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.state.set_play_state(PlayState::Stopped);
        self.state.set_clicking(false);
        let mut lifecycle = lock(&self.lifecycle);
        self.state.request_stop();
        if let Some(handle) = lifecycle.handle.take() {
            let _ = handle.join();
        }
    }
}
