//! CLI entrypoint and application wiring.
//!
//! Constructs the single scheduler instance, loads the persisted reminder
//! set, re-registers every trigger and then runs the tick loop. The chat
//! transport is out of process: outbound messages are drained from the bus
//! channel and logged here.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use crate::bus::ChannelNotifier;
use crate::calendar::HolidayCalendar;
use crate::config;
use crate::logging;
use crate::scheduler::ReminderScheduler;
use crate::store;

#[derive(Parser, Debug)]
#[command(name = "remindbot", version, about = "Chat-session reminder and task scheduler")]
struct Cli {
    /// Path to the config file (defaults to ~/.remindbot/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    // First run: persist the defaults so users have a file to edit.
    let cfg_path = cli
        .config
        .clone()
        .unwrap_or_else(config::config_path);
    if !cfg_path.exists() {
        config::save_config(&cfg, Some(&cfg_path))?;
    }
    let _log_guard = logging::init_logging(&cfg)?;

    let backend = store::open_backend(&config::store_url(&cfg))?;
    let reminders = backend.load().await;
    let store = Arc::new(RwLock::new(reminders));

    let calendar = Arc::new(HolidayCalendar::new(
        cfg.holiday.api_base.clone(),
        config::holiday_cache_path(),
    ));

    let (outbound_tx, mut outbound_rx) = mpsc::channel(64);
    let notifier = Arc::new(ChannelNotifier::new(outbound_tx));

    let scheduler = ReminderScheduler::new(store, backend, calendar, notifier);
    scheduler.schedule_all().await;

    let drain = async move {
        while let Some(msg) = outbound_rx.recv().await {
            info!(
                session = %msg.session_key,
                is_task = msg.is_task,
                "outbound: {}",
                msg.content
            );
        }
    };

    tokio::select! {
        _ = scheduler.run() => {}
        _ = drain => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
    Ok(())
}
