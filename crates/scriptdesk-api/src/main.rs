//! ScriptDesk CLI entry point.
//!
//! Binary name: `scriptdesk`
//!
//! Parses CLI arguments, loads config, opens the session, then dispatches
//! to the command handler. The session is always shut down (sweeper stopped,
//! documents flushed) before exit, even when a command fails.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use scriptdesk_infra::config::load_workspace_config;
use scriptdesk_infra::filesystem::resolve_data_dir;
use scriptdesk_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::{AppState, StartMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "scriptdesk", &mut std::io::stdout());
        return Ok(());
    }

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,scriptdesk=debug",
        _ => "trace",
    };
    // No subscriber yet, so config problems are reported by the load in AppState::init.
    let logging = load_workspace_config(&resolve_data_dir()).await.logging;
    let tracing_options = TracingOptions::new(filter)
        .json(logging.json)
        .otel(logging.otel);
    if let Err(err) = init_tracing(&tracing_options) {
        eprintln!("Warning: failed to initialize logging: {err}");
    }

    let mode = if cli.command.is_interactive() {
        StartMode::Interactive
    } else {
        StartMode::OneShot
    };
    let state = AppState::init(mode, cli.ephemeral).await?;

    let result = run(&state, &cli).await;

    state.shutdown().await;
    shutdown_tracing();
    result
}

async fn run(state: &AppState, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::New => cli::script::new_script(state, cli.json, cli.quiet).await,
        Commands::Rename { id, name } => {
            cli::script::rename_script(state, id, name, cli.json, cli.quiet).await
        }
        Commands::Delete { id, force } => {
            cli::script::delete_script(state, id, *force, cli.json, cli.quiet).await
        }
        Commands::List { recent } => cli::script::list_scripts(state, *recent, cli.json).await,
        Commands::Show { id } => cli::script::show_script(state, id, cli.json).await,
        Commands::Chat { id } => cli::chat::loop_runner::run_chat_loop(state, id.clone()).await,
        Commands::Sweep => cli::script::sweep(state, cli.json, cli.quiet).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
