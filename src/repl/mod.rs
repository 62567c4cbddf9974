//! REPL for driving the transport from the terminal
//!
//! Lines are read on a helper thread and handed over a channel, so the main
//! loop can also notice worker faults and the end of the track while the
//! user is idle.

use crate::commands::{create_registry, CommandContext, CommandResult};
use crate::engine::{PlayState, TransportController};
use anyhow::Result;
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the idle loop checks the transport
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(std::result::Result<String, ReadlineError>),
}

/// Interactive transport console
pub struct Repl {
    editor: Option<DefaultEditor>,
    controller: Arc<TransportController>,
    output_name: String,
    last_command: Option<String>,
    last_state: PlayState,

    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(controller: Arc<TransportController>, output_name: impl Into<String>) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        let (tx_input, rx_input) = unbounded();
        let last_state = controller.play_state();

        Ok(Repl {
            editor: Some(editor),
            controller,
            output_name: output_name.into(),
            last_command: None,
            last_state,
            tx_input,
            rx_input,
        })
    }

    /// Start the REPL loop; returns when the user quits
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {} {}",
            "🎹".bright_yellow(),
            "MiniSeq".bright_cyan().bold(),
            format!("→ {}", self.output_name).dimmed()
        );
        println!(
            "Keys: {} play, {} pause, {} play/pause, {} stop, {} click, {} / {} seek",
            "p".cyan(),
            "u".cyan(),
            "<space>".cyan(),
            "s".cyan(),
            "k".cyan(),
            "<".cyan(),
            ">".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "q".bright_red(),
            "Ctrl+C".bright_red()
        );

        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow::anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "miniseq>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.trim());
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        let registry = create_registry();
        let mut ctx = CommandContext::new(self.controller.clone());

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        let Some(command) = resolve_input(&line, self.last_command.as_deref()) else {
                            continue;
                        };

                        match registry.execute(&command, &mut ctx) {
                            CommandResult::Success => {}
                            CommandResult::Message(msg) => println!("{}", msg),
                            CommandResult::Exit => {
                                println!("{} 🎵", "Goodbye!".bright_cyan());
                                break;
                            }
                            CommandResult::Error(e) => {
                                println!("{} {}", "Error:".bright_red().bold(), e.red());
                            }
                            CommandResult::NotACommand => {
                                println!(
                                    "{} unknown command '{}' (try '{}')",
                                    "Error:".bright_red().bold(),
                                    command,
                                    "help".bright_green()
                                );
                                continue;
                            }
                        }
                        self.last_command = Some(command);
                        self.last_state = self.controller.play_state();
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{} 🎵", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break, // Channel closed
                },

                default(POLL_INTERVAL) => self.poll_transport(),
            }
        }

        Ok(())
    }

    /// Report worker faults and the end of the track
    fn poll_transport(&mut self) {
        if let Some(fault) = self.controller.take_fault() {
            println!("\n{} {}", "Playback stopped:".bright_red().bold(), fault.to_string().red());
        }
        let state = self.controller.play_state();
        if self.last_state == PlayState::Playing && state == PlayState::Stopped {
            println!("\n{}", "■ End of track".dimmed());
        }
        self.last_state = state;
    }
}

/// Map a raw input line to a command name.
///
/// An empty line repeats the previous command and a line of only blanks is
/// the play/pause key.
pub fn resolve_input(line: &str, last: Option<&str>) -> Option<String> {
    if line.is_empty() {
        return last.map(str::to_string);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Some("pp".to_string());
    }
    Some(trimmed.to_string())
}
