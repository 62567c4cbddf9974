//! Transport REPL commands (play, pause, stop, click, seek, status)

use crate::commands::{CommandContext, CommandResult};
use crate::engine::{PlayState, TransportStatus};
use colored::*;

/// Handle `p` / `play`
pub fn cmd_play(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.play(), |_| state_line(PlayState::Playing))
}

/// Handle `u` / `pause`
pub fn cmd_pause(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.pause(), |_| {
        format!("⏸ Paused at tick {}", ctx.controller.seq_playhead())
            .yellow()
            .to_string()
    })
}

/// Handle a lone space or `pp`
pub fn cmd_play_pause(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let result = ctx.controller.play_pause();
    CommandResult::from_result(result, |_| state_line(ctx.controller.play_state()))
}

/// Handle `s` / `stop`
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.stop(), |_| state_line(PlayState::Stopped))
}

/// Handle `k` / `click`
pub fn cmd_click(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.toggle_click(), |on| {
        if on {
            "🥁 Click on".bright_cyan().to_string()
        } else {
            "🥁 Click off".dimmed().to_string()
        }
    })
}

/// Handle `<` / `start`
pub fn cmd_goto_start(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.goto_start(), |tick| {
        format!("⏮ Start (tick {})", tick)
    })
}

/// Handle `>` / `end`
pub fn cmd_goto_end(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::from_result(ctx.controller.goto_end(), |tick| {
        format!("⏭ End (tick {})", tick)
    })
}

/// Handle `status`
pub fn cmd_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(format_status(&ctx.controller.status()))
}

fn state_line(state: PlayState) -> String {
    match state {
        PlayState::Playing => "▶ Playing".bright_green().to_string(),
        PlayState::Paused => "⏸ Paused".yellow().to_string(),
        PlayState::Stopped => "■ Stopped".bright_red().to_string(),
    }
}

/// Multi-line transport summary
pub fn format_status(status: &TransportStatus) -> String {
    let track = match status.track_length {
        Some(length) => format!("{} / {} ticks", status.seq_playhead, length),
        None => "no track loaded".dimmed().to_string(),
    };
    let click = if status.clicking {
        format!("on (tick {})", status.click_playhead).bright_cyan().to_string()
    } else {
        "off".dimmed().to_string()
    };
    format!(
        "{}\n  Track:  {}\n  Click:  {}\n  Tempo:  {:.1} BPM, {} PPQ\n  Sent:   {} messages{}",
        state_line(status.state),
        track,
        click,
        status.bpm,
        status.ppq,
        status.dispatched,
        if status.running { "" } else { " (idle)" }
    )
}
