//! MIDI output through midir
//!
//! `MidiSink` owns one output connection. Ports are selected by index or by
//! a case-sensitive substring of their name.

use crate::engine::sink::OutputSink;
use miniseq_core::{Result, SeqError};
use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use std::time::Duration;

const CLIENT_NAME: &str = "MiniSeq";
const CONNECTION_NAME: &str = "miniseq-out";

/// Output sink connected to a MIDI port
pub struct MidiSink {
    connection: Option<MidiOutputConnection>,
    port_name: String,
    panic_delay: Duration,
}

impl MidiSink {
    /// List available MIDI output ports.
    /// Creating the MIDI client can fail transiently on some systems, so it is
    /// retried up to 3 times with a small delay.
    pub fn list_ports() -> Result<Vec<String>> {
        let mut last_err = None;
        for attempt in 0..3 {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(100));
            }
            match MidiOutput::new(CLIENT_NAME) {
                Ok(midi_out) => {
                    return Ok(midi_out
                        .ports()
                        .iter()
                        .filter_map(|p| midi_out.port_name(p).ok())
                        .collect());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(SeqError::device(format!(
            "MIDI initialization failed after 3 attempts: {:?}",
            last_err
        )))
    }

    /// Open the port matching `selector`: a port number as printed by
    /// `list_ports` (0-based) or part of a port name
    pub fn open(selector: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| SeqError::device(format!("Failed to create MIDI output: {}", e)))?;
        let ports = midi_out.ports();
        let port = select_port(&midi_out, &ports, selector)
            .ok_or_else(|| SeqError::device(format!("MIDI port '{}' not found", selector)))?
            .clone();
        let port_name = midi_out
            .port_name(&port)
            .map_err(|e| SeqError::device(e.to_string()))?;

        let connection = midi_out
            .connect(&port, CONNECTION_NAME)
            .map_err(|e| SeqError::device(format!("Failed to connect to '{}': {}", port_name, e)))?;
        log::info!("Opened MIDI output port '{}'", port_name);

        Ok(Self {
            connection: Some(connection),
            port_name,
            panic_delay: Duration::from_millis(10),
        })
    }

    /// Change the pause between channels when sending a panic
    pub fn with_panic_delay(mut self, panic_delay: Duration) -> Self {
        self.panic_delay = panic_delay;
        self
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn select_port<'a>(
    midi_out: &MidiOutput,
    ports: &'a [MidiOutputPort],
    selector: &str,
) -> Option<&'a MidiOutputPort> {
    if let Ok(index) = selector.trim().parse::<usize>() {
        if let Some(port) = ports.get(index) {
            return Some(port);
        }
    }
    ports.iter().find(|p| {
        midi_out
            .port_name(p)
            .map(|name| port_matches(&name, selector))
            .unwrap_or(false)
    })
}

/// True if `selector` names this port (substring match)
pub fn port_matches(port_name: &str, selector: &str) -> bool {
    !selector.is_empty() && port_name.contains(selector)
}

impl OutputSink for MidiSink {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| SeqError::device(format!("port '{}' is closed", self.port_name)))?;
        conn.send(msg)
            .map_err(|e| SeqError::device(format!("Failed to send to '{}': {}", self.port_name, e)))
    }

    fn panic_delay(&self) -> Duration {
        self.panic_delay
    }

    fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            let _ = conn.close();
            log::info!("Closed MIDI output port '{}'", self.port_name);
        }
    }
}

impl Drop for MidiSink {
    fn drop(&mut self) {
        self.close();
    }
}
