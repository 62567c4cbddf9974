//! General REPL commands (help, quit, tempo)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `q`, `quit`, `exit` or `close`
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `tempo [bpm]` command
pub fn cmd_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!(
            "Current tempo: {:.1} BPM",
            ctx.controller.bpm()
        ));
    }

    match args.parse::<f64>() {
        Ok(bpm) => CommandResult::from_result(ctx.controller.set_bpm(bpm), |_| {
            format!("🎵 Tempo set to {:.1} BPM", bpm)
                .bright_green()
                .to_string()
        }),
        Err(_) => CommandResult::Error(format!("Invalid tempo '{}'", args)),
    }
}

/// Print help information
fn print_help() {
    println!("{}", "🎹 MiniSeq".bold());
    println!("{}", "==========".bold());
    println!();
    println!("{}", "Transport:".green());
    println!("  {} / {}       - Play", "p".cyan(), "play".cyan());
    println!("  {} / {}      - Pause", "u".cyan(), "pause".cyan());
    println!("  {} / {}   - Play or pause", "<space>".cyan(), "pp".cyan());
    println!("  {} / {}       - Stop and rewind", "s".cyan(), "stop".cyan());
    println!("  {} / {}      - Go to start", "<".cyan(), "start".cyan());
    println!("  {} / {}        - Go to end", ">".cyan(), "end".cyan());
    println!("  {}             - Transport status", "status".cyan());
    println!();
    println!("{}", "Metronome:".green());
    println!("  {} / {}      - Toggle click", "k".cyan(), "click".cyan());
    println!("  {}        - Show or set tempo", "tempo [bpm]".cyan());
    println!();
    println!("{}", "MIDI:".green());
    println!("  {}              - List output ports", "ports".cyan());
    println!("  {}              - All sound off on every channel", "panic".cyan());
    println!();
    println!("{}", "Other:".green());
    println!("  {}               - Show this help", "help".cyan());
    println!("  {} / {}       - Quit", "q".cyan(), "quit".cyan());
    println!("  {}            - Repeat the last command", "<enter>".cyan());
}
