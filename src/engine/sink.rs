//! Output sinks
//!
//! The scheduler only talks to an `OutputSink`. `MidiSink` (see `midi.rs`)
//! writes to a real port; `LogSink` is a dry-run target and `RecordingSink`
//! keeps every message in memory.

use miniseq_core::types::message;
use miniseq_core::{Result, SeqError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Destination for raw MIDI messages
pub trait OutputSink: Send {
    /// Transmit one message. Failures are reported, never retried.
    fn send(&mut self, msg: &[u8]) -> Result<()>;

    /// Delay slept after each channel during `panic`
    fn panic_delay(&self) -> Duration {
        Duration::from_millis(10)
    }

    /// Silence everything: all sound off then reset all controllers on each
    /// of the 16 channels
    fn panic(&mut self) -> Result<()> {
        let delay = self.panic_delay();
        for channel in 0..message::CHANNELS {
            for msg in message::panic_messages(channel) {
                self.send(&msg)?;
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        Ok(())
    }

    /// Release the device. Sends after close fail.
    fn close(&mut self) {}
}

/// Sink shared between the controller and the scheduler thread
pub type SharedSink = Arc<Mutex<Box<dyn OutputSink>>>;

/// Wrap a sink for sharing across threads
pub fn shared(sink: impl OutputSink + 'static) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink)))
}

/// Sink that writes each message to the log instead of a device
pub struct LogSink {
    sent: u64,
    panic_delay: Duration,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            sent: 0,
            panic_delay: Duration::ZERO,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for LogSink {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        self.sent += 1;
        log::info!("MIDI out: {}", message::describe(msg));
        Ok(())
    }

    fn panic_delay(&self) -> Duration {
        self.panic_delay
    }
}

/// Sink that records messages in memory.
///
/// Clones share the same message log, so a test keeps one clone and hands the
/// other to the controller.
#[derive(Clone, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_after: Option<usize>,
    closed: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `count` messages, then fail every send with a device error
    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::default()
        }
    }

    /// Copy of everything sent so far
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for RecordingSink {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(SeqError::device("output is closed"));
        }
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = self.fail_after {
            if messages.len() >= limit {
                return Err(SeqError::device(format!(
                    "recording sink rejected message after {} sends",
                    limit
                )));
            }
        }
        messages.push(msg.to_vec());
        Ok(())
    }

    fn panic_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}
