//! MIDI REPL commands

use crate::commands::{CommandContext, CommandResult};
use crate::engine::MidiSink;
use colored::*;

/// Handle `ports` command - list available MIDI output ports
pub fn cmd_ports(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match MidiSink::list_ports() {
        Ok(ports) => CommandResult::Message(format_ports(&ports)),
        Err(e) => CommandResult::Error(format!("Failed to list MIDI ports: {}", e)),
    }
}

/// Handle `panic` command - all sound off and reset controllers
pub fn cmd_panic(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.panic(), |_| {
        "🛑 All sound off".yellow().to_string()
    })
}

/// Numbered port list, as accepted by `--port`
pub fn format_ports(ports: &[String]) -> String {
    if ports.is_empty() {
        return "No MIDI output ports found. Make sure a MIDI device or virtual port is connected."
            .yellow()
            .to_string();
    }
    let mut output = format!("{}\n", "🎹 Available MIDI Output Ports:".bold());
    for (i, port) in ports.iter().enumerate() {
        output.push_str(&format!("  {}: {}\n", i, port.cyan()));
    }
    output.push_str(&format!(
        "\n{} {}",
        "Use".dimmed(),
        "miniseq --port <number or name>".green()
    ));
    output
}
