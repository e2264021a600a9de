//! Script lifecycle CLI commands: new, rename, delete, list, show, sweep.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use scriptdesk_core::registry::{CommandOutcome, IgnoreReason};
use scriptdesk_types::chat::{ChatMessage, MessageRole};
use scriptdesk_types::script::{Script, ScriptId, ScriptView};

use crate::state::AppState;

pub async fn new_script(state: &AppState, json: bool, quiet: bool) -> Result<()> {
    let script = state.registry().create().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&script)?);
    } else if !quiet {
        println!(
            "  {} Created '{}' ({})",
            style("✓").green().bold(),
            style(&script.name).cyan(),
            style(&script.id).dim()
        );
        println!(
            "  Rename it with: {}",
            style(format!("scriptdesk rename {} <name>", script.id)).yellow()
        );
    } else {
        println!("{}", script.id);
    }

    Ok(())
}

pub async fn rename_script(state: &AppState, id: &str, name: &str, json: bool, quiet: bool) -> Result<()> {
    let id = ScriptId::from(id);
    match state.registry().rename(&id, name).await {
        CommandOutcome::Ignored(IgnoreReason::UnknownScript(_)) => bail!("script '{id}' not found"),
        CommandOutcome::Ignored(IgnoreReason::EmptyName) => bail!("script name must not be empty"),
        _ => {}
    }

    let script = require_script(state, &id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&script)?);
    } else if !quiet {
        println!(
            "  {} Renamed to '{}'",
            style("✓").green().bold(),
            style(&script.name).cyan()
        );
    }
    Ok(())
}

pub async fn delete_script(state: &AppState, id: &str, force: bool, json: bool, quiet: bool) -> Result<()> {
    let id = ScriptId::from(id);
    let script = require_script(state, &id).await?;

    if !force && !json {
        let messages = state.registry().history(&id).await.len();
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete script '{}' and its {messages} message(s)?",
                style(&script.name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.session.controller().delete_script(&id).await;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else if !quiet {
        println!(
            "  {} Script '{}' deleted.",
            style("✓").red().bold(),
            script.name
        );
    }
    Ok(())
}

pub async fn list_scripts(state: &AppState, recent: bool, json: bool) -> Result<()> {
    let view = if recent { ScriptView::Recent } else { ScriptView::All };
    let scripts = state.registry().list(view).await;
    let histories = state.registry().histories().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&scripts)?);
        return Ok(());
    }

    if scripts.is_empty() {
        println!();
        match view {
            ScriptView::Recent => println!(
                "  {} No scripts used in the last {}h.",
                style("i").blue().bold(),
                state.config.recent_window_hours
            ),
            ScriptView::All => println!(
                "  {} No scripts yet. Create one with: {}",
                style("i").blue().bold(),
                style("scriptdesk new").yellow()
            ),
        }
        println!();
        return Ok(());
    }

    let now = state.registry().now();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Id").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Last Accessed").fg(Color::White),
    ]);

    for script in &scripts {
        let messages = histories.get(&script.id).map_or(0, Vec::len);
        table.add_row(vec![
            Cell::new(&script.name).fg(Color::Cyan),
            Cell::new(&script.id).fg(Color::DarkGrey),
            Cell::new(messages),
            Cell::new(format_relative_time(&script.last_accessed, now)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {} {} ({})",
        scripts.len(),
        if scripts.len() == 1 { "script" } else { "scripts" },
        view
    );
    println!();
    Ok(())
}

pub async fn show_script(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id = ScriptId::from(id);
    let script = require_script(state, &id).await?;
    let history = state.registry().history(&id).await;

    if json {
        let body = serde_json::json!({"script": script, "messages": history});
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&script.name).cyan().bold());
    println!(
        "  {}",
        style(format!(
            "{} · last accessed {}",
            script.id,
            format_relative_time(&script.last_accessed, state.registry().now())
        ))
        .dim()
    );
    println!();

    if history.is_empty() {
        println!("  {}", style("(no messages)").dim());
    }
    for message in &history {
        println!("{}", render_message(message));
    }
    println!();
    Ok(())
}

pub async fn sweep(state: &AppState, json: bool, quiet: bool) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Purging expired messages...");
    if !json && !quiet {
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    let purged = state.registry().sweep().await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::json!({"purged": purged}));
    } else if !quiet {
        println!(
            "  {} Purged {purged} message(s) older than {}h.",
            style("✓").green().bold(),
            state.config.retention.ttl_hours
        );
    }
    Ok(())
}

async fn require_script(state: &AppState, id: &ScriptId) -> Result<Script> {
    match state.registry().get(id).await {
        Some(script) => Ok(script),
        None => bail!(
            "script '{id}' not found (see {})",
            style("scriptdesk list").yellow()
        ),
    }
}

/// One history line: a colored role tag and the content.
pub fn render_message(message: &ChatMessage) -> String {
    let tag = match message.role {
        MessageRole::User => style("you").green().bold(),
        MessageRole::Assistant => style("assistant").cyan().bold(),
        MessageRole::Error => style("error").red().bold(),
    };
    format!("  {tag} {}", message.content)
}

pub fn format_relative_time(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_relative_time() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(format_relative_time(&now, now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(format_relative_time(&(now - Duration::days(2)), now), "2d ago");
        assert_eq!(
            format_relative_time(&(now - Duration::days(60)), now),
            (now - Duration::days(60)).format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_render_message_contains_content() {
        let now = DateTime::from_timestamp_millis(0).unwrap();
        let line = render_message(&ChatMessage::generation_error(now));
        assert!(line.contains("Sorry, there was an error generating the response."));
    }
}
