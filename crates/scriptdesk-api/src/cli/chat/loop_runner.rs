//! Main chat loop.
//!
//! Reads lines for the active script while replies for earlier submissions
//! arrive in the background. A reply is printed when it lands, tagged with
//! its script when that script is no longer the active one.

use std::io::Write;

use anyhow::{Context, Result, bail};
use console::style;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use rustyline_async::SharedWriter;
use tracing::{debug, info};

use scriptdesk_core::chat::controller::{
    PendingReply, RejectReason, ReplyOutcome, SubmitOutcome,
};
use scriptdesk_core::chat::generator::ResponseGenerator;
use scriptdesk_types::chat::MessageRole;
use scriptdesk_types::script::{Script, ScriptId, ScriptView};

use crate::cli::script::{format_relative_time, render_message};
use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Run the interactive chat until `/quit`, Ctrl+D, or Ctrl+C.
pub async fn run_chat_loop(state: &AppState, start_id: Option<String>) -> Result<()> {
    let registry = state.registry();
    let controller = state.session.controller();

    let mut active = resolve_start_script(state, start_id).await?;
    registry.activate(&active.id).await;

    let (mut input, mut out) =
        ChatInput::new(prompt_for(&active)).context("failed to start the line editor")?;
    print_banner(&mut out, state, &active)?;

    let mut pending: FuturesUnordered<PendingReply> = FuturesUnordered::new();

    loop {
        tokio::select! {
            event = input.read_line() => match event {
                InputEvent::Line(line) => {
                    if let Some(command) = commands::parse(&line) {
                        let keep_going = handle_command(state, command, &mut active, &mut out).await?;
                        if !keep_going {
                            break;
                        }
                        input.update_prompt(&prompt_for(&active));
                        continue;
                    }

                    let mut buffer = line;
                    match controller.submit(&active.id, &mut buffer).await {
                        SubmitOutcome::Accepted(reply) => pending.push(reply),
                        SubmitOutcome::Rejected(RejectReason::Empty) => {}
                        SubmitOutcome::Rejected(reason) => {
                            writeln!(out, "  {} {reason}", style("!").yellow().bold())?;
                        }
                    }
                }
                InputEvent::Eof | InputEvent::Interrupted => break,
            },

            Some(reply) = pending.next(), if !pending.is_empty() => {
                if let Some(reply) = reply {
                    print_reply(&mut out, state, &reply, &active.id).await?;
                }
            }
        }
    }

    input.finish();
    if !pending.is_empty() {
        info!(in_flight = pending.len(), "leaving chat with replies in flight");
        println!(
            "  {}",
            style(format!("Waiting for {} pending repl(ies)...", pending.len())).dim()
        );
        while let Some(reply) = pending.next().await {
            if let Some(reply) = reply {
                debug!(script_id = %reply.script_id, delivered = reply.delivered, "late reply saved");
            }
        }
    }
    println!("  {}", style("Bye.").dim());
    Ok(())
}

/// The requested script, else the most recently used one, else a new one.
async fn resolve_start_script(state: &AppState, start_id: Option<String>) -> Result<Script> {
    let registry = state.registry();

    if let Some(id) = start_id {
        let id = ScriptId::from(id);
        return match registry.get(&id).await {
            Some(script) => Ok(script),
            None => bail!("script '{id}' not found"),
        };
    }

    if let Some(script) = registry.list(ScriptView::Recent).await.into_iter().next() {
        return Ok(script);
    }
    if let Some(script) = registry.scripts().await.into_iter().next() {
        return Ok(script);
    }
    Ok(registry.create().await)
}

/// Returns `false` when the loop should end.
async fn handle_command(
    state: &AppState,
    command: ChatCommand,
    active: &mut Script,
    out: &mut SharedWriter,
) -> Result<bool> {
    let registry = state.registry();

    match command {
        ChatCommand::Help => write!(out, "{}", commands::help_text())?,
        ChatCommand::Quit => return Ok(false),

        ChatCommand::New => {
            let script = registry.create().await;
            writeln!(
                out,
                "  {} Created and switched to '{}' ({})",
                style("✓").green().bold(),
                style(&script.name).cyan(),
                style(&script.id).dim()
            )?;
            *active = script;
        }

        ChatCommand::Switch(id) => {
            let id = ScriptId::from(id);
            if registry.activate(&id).await.is_ignored() {
                writeln!(out, "  {} script '{id}' not found", style("!").yellow().bold())?;
            } else if let Some(script) = registry.get(&id).await {
                let waiting = state.session.controller().phase(&id).is_sending();
                writeln!(
                    out,
                    "  {} Switched to '{}'{}",
                    style("→").cyan().bold(),
                    style(&script.name).cyan(),
                    if waiting { " (reply pending)" } else { "" }
                )?;
                *active = script;
            }
        }

        ChatCommand::Rename(name) => {
            if registry.rename(&active.id, &name).await.is_ignored() {
                writeln!(out, "  {} name must not be empty", style("!").yellow().bold())?;
            } else if let Some(script) = registry.get(&active.id).await {
                writeln!(out, "  {} Renamed to '{}'", style("✓").green().bold(), script.name)?;
                *active = script;
            }
        }

        ChatCommand::History => {
            let history = registry.history(&active.id).await;
            if history.is_empty() {
                writeln!(out, "  {}", style("(no messages)").dim())?;
            }
            for message in &history {
                writeln!(out, "{}", render_message(message))?;
            }
        }

        ChatCommand::List => {
            let now = registry.now();
            for script in registry.scripts().await {
                let marker = if script.id == active.id { "*" } else { " " };
                writeln!(
                    out,
                    "  {marker} {:<12} {}  {}",
                    script.id.to_string(),
                    style(&script.name).cyan(),
                    style(format_relative_time(&script.last_accessed, now)).dim()
                )?;
            }
        }

        ChatCommand::Unknown(cmd) => {
            writeln!(
                out,
                "  {} Unknown command: {cmd}. Type {} for commands.",
                style("?").yellow().bold(),
                style("/help").cyan()
            )?;
        }
    }

    Ok(true)
}

async fn print_reply(
    out: &mut SharedWriter,
    state: &AppState,
    reply: &ReplyOutcome,
    active_id: &ScriptId,
) -> Result<()> {
    if !reply.delivered {
        return Ok(());
    }

    if &reply.script_id != active_id {
        let name = state
            .registry()
            .get(&reply.script_id)
            .await
            .map(|s| s.name)
            .unwrap_or_else(|| reply.script_id.to_string());
        writeln!(out, "  {}", style(format!("[{name}]")).magenta())?;
    }
    writeln!(out, "{}", render_message(&reply.message))?;
    if reply.message.role == MessageRole::Error {
        debug!(script_id = %reply.script_id, "generation failed, see warn log for cause");
    }
    Ok(())
}

fn prompt_for(script: &Script) -> String {
    format!("{} > ", script.name)
}

fn print_banner(out: &mut SharedWriter, state: &AppState, active: &Script) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} {}",
        style("ScriptDesk").cyan().bold(),
        style(format!(
            "· {} · {} store in {}",
            state.session.controller().generator().name(),
            state.registry().store().describe(),
            state.data_dir.display()
        ))
        .dim()
    )?;
    writeln!(
        out,
        "  Chatting in '{}'. Type {} for commands.",
        style(&active.name).cyan(),
        style("/help").cyan()
    )?;
    writeln!(out)?;
    Ok(())
}
