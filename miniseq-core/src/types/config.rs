//! Sequencer configuration
//!
//! Plain data with defaults and a builder, validated once before any
//! scheduler thread is started.

use crate::error::{Result, SeqError};
use crate::types::time::{validate_bpm, validate_ppq, TimeBase};
use std::time::Duration;

/// Tempo, resolution and scheduler tuning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeqConfig {
    /// Quarter notes per minute
    pub bpm: f64,
    /// Ticks per quarter note
    pub ppq: u32,
    /// Most events pulled from one source per scheduler cycle
    pub batch_size: usize,
    /// Pause between channels when sending a panic
    pub panic_delay: Duration,
}

impl SeqConfig {
    pub const DEFAULT_BPM: f64 = 100.0;
    pub const DEFAULT_PPQ: u32 = 120;
    pub const DEFAULT_BATCH_SIZE: usize = 64;
    pub const DEFAULT_PANIC_DELAY: Duration = Duration::from_millis(10);

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tempo
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Set the resolution
    pub fn with_ppq(mut self, ppq: u32) -> Self {
        self.ppq = ppq;
        self
    }

    /// Set the per-cycle pull limit
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the inter-channel panic delay
    pub fn with_panic_delay(mut self, panic_delay: Duration) -> Self {
        self.panic_delay = panic_delay;
        self
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_bpm(self.bpm)?;
        validate_ppq(self.ppq)?;
        if self.batch_size == 0 {
            return Err(SeqError::config("batch size must be at least 1"));
        }
        Ok(())
    }

    /// Validated time base for this configuration
    pub fn time_base(&self) -> Result<TimeBase> {
        self.validate()?;
        TimeBase::new(self.bpm, self.ppq)
    }
}

impl Default for SeqConfig {
    fn default() -> Self {
        Self {
            bpm: Self::DEFAULT_BPM,
            ppq: Self::DEFAULT_PPQ,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            panic_delay: Self::DEFAULT_PANIC_DELAY,
        }
    }
}
