//! Playback engine: output sinks, the scheduler thread and transport control

pub mod midi;
pub mod scheduler;
pub mod sink;
pub mod transport;

pub use midi::MidiSink;
pub use scheduler::{Modes, PlayState, Playhead, Scheduler, SharedClick, SharedTrack, TransportState};
pub use sink::{LogSink, OutputSink, RecordingSink, SharedSink};
pub use transport::{TransportController, TransportStatus};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a shared object, recovering the data if a holder panicked.
/// The scheduler must keep running (and stop cleanly) after a panicking
/// command, so poisoning is not treated as fatal.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
