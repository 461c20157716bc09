use std::sync::Arc;

use clap::Parser;
use pitwall_core::config::PitwallConfig;
use pitwall_scheduler::{ChannelNotifier, LogNotifier, Managers, Notification, Notifier, Scheduler};
use pitwall_store::{SqliteStore, Store};
use tracing::{info, warn};

mod launcher;

use launcher::StoreLauncher;

/// Restores scheduled races from the database and starts them on time.
#[derive(Debug, Parser)]
#[command(name = "pitwall-daemon", version)]
struct Cli {
    /// Config file (default: ~/.pitwall/pitwall.toml).
    #[arg(long, env = "PITWALL_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match PitwallConfig::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (PitwallConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .init();
    if let Some(e) = config_error {
        warn!("Config load failed ({}), using defaults", e);
    }

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(db)?);
    info!("database migrations complete");

    let notifier = build_notifier(&config);
    let managers = Managers::from_shared(Arc::new(StoreLauncher::new(Arc::clone(&store))));

    let scheduler = Scheduler::new(store, notifier, managers);
    scheduler.init()?;

    info!("pitwall daemon running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    scheduler.shutdown();
    info!("pitwall daemon stopped");
    Ok(())
}

/// Channel-backed notifier drained into the log, or a plain log notifier
/// when notifications are disabled.
fn build_notifier(config: &PitwallConfig) -> Arc<dyn Notifier> {
    if !config.notifications.enabled {
        return Arc::new(LogNotifier);
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Notification>(config.notifications.buffer.max(1));
    tokio::spawn(async move {
        while let Some(n) = rx.recv().await {
            info!(
                kind = ?n.kind,
                event_id = %n.event_id,
                name = %n.name,
                start = ?n.start,
                "notification"
            );
        }
    });
    Arc::new(ChannelNotifier::new(tx))
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
