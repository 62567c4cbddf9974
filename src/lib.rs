//! # MiniSeq
//!
//! MiniSeq is a small terminal MIDI sequencer. A background scheduler merges
//! a pre-built track with an endless metronome click, sends each event to a
//! MIDI output when its tick comes up, and keeps tempo with one cycle per
//! tick. A transport controller (play, pause, stop, seek, click, tempo) drives
//! it from a REPL.
//!
//! ## Modules
//!
//! - `engine`: output sinks, the scheduler thread and the transport controller.
//! - `commands`: the command registry used by the REPL.
//! - `repl`: the interactive console.
//! - `cli`: command-line options for the `miniseq` binary.
//! - `demo`: the built-in demo track.
//!
//! Tracks, the click generator, timing and configuration live in
//! `miniseq-core` and are re-exported here.

pub mod cli;
pub mod commands;
pub mod demo;
pub mod engine;
pub mod repl;

// Re-export commonly used types for convenience
pub use crate::engine::{
    LogSink, MidiSink, OutputSink, PlayState, RecordingSink, TransportController, TransportStatus,
};
pub use miniseq_core::{ClickGenerator, Result, SeqConfig, SeqError, TimeBase, TimedEvent, Track};
