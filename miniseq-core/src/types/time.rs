//! Tempo to tick-duration conversion
//!
//! One tick lasts `(60 / bpm) / ppq` seconds. The value is cached and
//! recomputed whenever the tempo changes.

use crate::error::{Result, SeqError};
use std::time::Duration;

/// Seconds per tick for the given tempo and resolution
pub fn tick_seconds(bpm: f64, ppq: u32) -> Result<f64> {
    validate_bpm(bpm)?;
    validate_ppq(ppq)?;
    Ok((60.0 / bpm) / ppq as f64)
}

pub(crate) fn validate_bpm(bpm: f64) -> Result<()> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(SeqError::config(format!(
            "tempo must be a positive number of BPM, got {}",
            bpm
        )));
    }
    Ok(())
}

pub(crate) fn validate_ppq(ppq: u32) -> Result<()> {
    if ppq == 0 {
        return Err(SeqError::config(
            "resolution must be at least 1 tick per quarter note",
        ));
    }
    Ok(())
}

/// Tempo and resolution with the derived tick duration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeBase {
    bpm: f64,
    ppq: u32,
    tick_seconds: f64,
}

impl TimeBase {
    /// Create a time base, rejecting non-positive tempo or resolution
    pub fn new(bpm: f64, ppq: u32) -> Result<Self> {
        let tick_seconds = tick_seconds(bpm, ppq)?;
        Ok(Self {
            bpm,
            ppq,
            tick_seconds,
        })
    }

    /// Change the tempo. The previous tempo is kept on error.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        self.tick_seconds = tick_seconds(bpm, self.ppq)?;
        self.bpm = bpm;
        log::debug!(
            "Changed BPM => {}, tick interval {:.2} ms",
            bpm,
            self.tick_seconds * 1000.0
        );
        Ok(())
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Ticks per quarter note
    pub fn ppq(&self) -> u32 {
        self.ppq
    }

    pub fn tick_seconds(&self) -> f64 {
        self.tick_seconds
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(self.tick_seconds)
    }

    /// Wall-clock length of a span of ticks at the current tempo
    pub fn ticks_to_duration(&self, ticks: u64) -> Duration {
        Duration::from_secs_f64(self.tick_seconds * ticks as f64)
    }
}
