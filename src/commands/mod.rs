//! Command registry for REPL commands
//!
//! Every transport key and word maps to a handler; handlers only talk to the
//! `TransportController`.

pub mod general;
pub mod midi;
pub mod transport;

use crate::engine::TransportController;
use miniseq_core::Result;
use std::sync::Arc;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Nothing registered under this name
    NotACommand,
    /// Error occurred
    Error(String),
}

impl CommandResult {
    /// Message on success, error text otherwise
    pub fn from_result<T>(result: Result<T>, message: impl FnOnce(T) -> String) -> Self {
        match result {
            Ok(value) => CommandResult::Message(message(value)),
            Err(e) => CommandResult::Error(e.to_string()),
        }
    }
}

/// Context passed to command handlers
pub struct CommandContext {
    pub controller: Arc<TransportController>,
}

impl CommandContext {
    pub fn new(controller: Arc<TransportController>) -> Self {
        Self { controller }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by name length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command under `name`
    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.commands.push((name.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (name, handler) in &self.commands {
            if input == name || input.starts_with(&format!("{} ", name)) {
                let args = input[name.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command names
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Transport
    registry.register("p", transport::cmd_play);
    registry.register("play", transport::cmd_play);
    registry.register("u", transport::cmd_pause);
    registry.register("pause", transport::cmd_pause);
    registry.register("pp", transport::cmd_play_pause);
    registry.register("s", transport::cmd_stop);
    registry.register("stop", transport::cmd_stop);
    registry.register("k", transport::cmd_click);
    registry.register("click", transport::cmd_click);
    registry.register("<", transport::cmd_goto_start);
    registry.register("start", transport::cmd_goto_start);
    registry.register(">", transport::cmd_goto_end);
    registry.register("end", transport::cmd_goto_end);
    registry.register("status", transport::cmd_status);

    // MIDI
    registry.register("ports", midi::cmd_ports);
    registry.register("panic", midi::cmd_panic);

    // General
    registry.register("tempo", general::cmd_tempo);
    registry.register("help", general::cmd_help);
    registry.register("q", general::cmd_quit);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("close", general::cmd_quit);

    registry
}
