//! Glimpse application entry
//!
//! The first launch becomes the primary instance and owns every window.
//! Later launches hand their files to it and exit.

pub mod cli;
mod state;
mod window;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use glimpse_core::{
    App, AppEvent, AppEventSender, DatabaseSessionStore, InstanceKey, MessageDispatcher,
    Messenger, NoReleaseFeed, ScheduledVersionCheck, WindowManager,
};
use glimpse_ipc::QUIT_DELAY;

use cli::Cli;
use state::AppState;
pub use window::{HeadlessState, HeadlessWindow, HeadlessWindowFactory};

/// Logical application id; every launch by the same user competes for it
pub const APP_ID: &str = "glimpse";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(launch(cli))
}

pub async fn launch(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    config.ensure_dirs()?;

    let log_file = cli
        .log
        .then(|| glimpse_core::log_file_path(&config.log_dir, std::process::id()));
    let background_dir = std::env::temp_dir().join("glimpse");
    glimpse_core::init_logging(cli.log_level(), log_file.as_deref(), Some(&background_dir))?;

    tracing::info!(
        version = VERSION,
        data_dir = %config.data_dir.display(),
        "Glimpse starting"
    );

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let files = cli.absolute_files(&cwd);

    let state = AppState::open(config).context("Failed to open application state")?;
    let messenger = elect(&state, cli.multi).await;

    serve(&cli, state, messenger, files).await
}

/// Secondary: hand `files` to the primary and return once the transport had
/// its grace period. Primary: own the windows until the application quits.
async fn serve(
    cli: &Cli,
    state: AppState,
    mut messenger: Messenger,
    files: Vec<String>,
) -> anyhow::Result<()> {
    if !messenger.is_primary() {
        // Best effort: the primary either takes the files or they are dropped
        messenger.send_to_primary(files).await;
        tokio::time::sleep(QUIT_DELAY).await;
        tracing::info!("Handed off to primary instance, exiting");
        return Ok(());
    }

    run_primary(cli, state, messenger, &files).await
}

async fn elect(state: &AppState, multi: bool) -> Messenger {
    if state.allows_multiple_instances(multi) {
        tracing::info!("Multiple instances allowed, skipping election");
        return Messenger::standalone(VERSION);
    }

    match Messenger::elect(&InstanceKey::new(APP_ID), VERSION).await {
        Ok(messenger) => messenger,
        Err(e) => {
            tracing::warn!(error = %e, "Instance election failed, running standalone");
            Messenger::standalone(VERSION)
        }
    }
}

async fn run_primary(
    cli: &Cli,
    state: AppState,
    mut messenger: Messenger,
    files: &[String],
) -> anyhow::Result<()> {
    let (tx, rx) = glimpse_core::channel();

    let version_check = ScheduledVersionCheck::new(
        state.version_check.clone(),
        VERSION,
        Arc::new(NoReleaseFeed),
    );

    let mut manager = WindowManager::new(
        HeadlessWindowFactory,
        Box::new(DatabaseSessionStore::new(state.db.clone())),
        tx.clone(),
    )
    .with_configuration_store(Box::new(state.preferences.clone()))
    .with_configuration_store(Box::new(state.version_check.clone()))
    .with_version_check(Box::new(version_check));

    if state.restores_session(cli.new_session) {
        manager.restore_session()?;
    }
    manager
        .reload_or_create()
        .context("Failed to restore windows")?;

    for file in files {
        manager.load_file_non_interactive(Path::new(file))?;
    }

    manager.start_background_tasks();

    let forward = tx.clone();
    messenger.listen(move |message| {
        let _ = forward.send(AppEvent::Message(message));
    })?;

    watch_ctrl_c(tx);

    App::new(manager, MessageDispatcher::new(messenger.version()))
        .run(rx)
        .await;

    tracing::info!("Glimpse exited");
    Ok(())
}

fn watch_ctrl_c(events: AppEventSender) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            let _ = events.send(AppEvent::ExitRequested);
        }
    });
}
