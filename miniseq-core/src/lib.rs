//! # MiniSeq Core
//!
//! Device-free building blocks for the MiniSeq MIDI sequencer.
//! Provides timed events, tempo math, tracks and the metronome pattern
//! without any thread or MIDI port dependencies.
//!
//! ## Features
//!
//! - **serde**: Enable serialization of events, tracks and configuration
//!
//! ## Example
//!
//! ```
//! use miniseq_core::types::{message, TimeBase, Track};
//!
//! let time_base = TimeBase::new(120.0, 120)?;
//! let mut track = Track::new();
//! track.add(message::note_on(0, 60, 100), 0);
//! track.add(message::note_off(0, 60), 120);
//!
//! assert_eq!(track.length(), 120);
//! assert!((time_base.tick_seconds() - 0.5 / 120.0).abs() < 1e-12);
//! # Ok::<(), miniseq_core::SeqError>(())
//! ```

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SeqError};
pub use types::{ClickGenerator, SeqConfig, TimeBase, TimedEvent, Track};
