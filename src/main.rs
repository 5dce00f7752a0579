use anyhow::Context;
use chainsight::services::{JsonHistoryStore, SnapshotHistory};
use chainsight::{ChainEngine, ChainSnapshot, Config, MigrationTracker, StoredSnapshot};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn read_snapshot(path: &Path) -> anyhow::Result<ChainSnapshot> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainsight=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let near_path = args
        .next()
        .context("usage: chainsight <near.json> [far.json]")?;
    let far_path = args.next();

    let config = Config::from_env();
    info!("Analysing {} from {}", config.symbol, near_path);

    let near = read_snapshot(Path::new(&near_path))?;
    let far = far_path
        .as_deref()
        .map(|p| read_snapshot(Path::new(p)))
        .transpose()?;

    // Rebuild intraday migration state from the stored history
    let store = JsonHistoryStore::new(&config.history_file, config.history_max);
    store.append(StoredSnapshot::new(config.symbol.clone(), near.clone()))?;
    let history: Vec<ChainSnapshot> = store
        .last_n_for(&config.symbol, config.analytics.migration.track_period)?
        .into_iter()
        .map(|entry| entry.snapshot)
        .collect();

    let tracker = MigrationTracker::new(config.analytics.migration.clone());
    // The last entry is `near` itself; the engine records it
    if let Some((_, earlier)) = history.split_last() {
        tracker.replay(earlier);
    }

    let engine = ChainEngine::new(&config.analytics);
    let now = chrono::Local::now().naive_local();
    let report = engine.analyze(&near, far.as_ref(), now, Some(&tracker));

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
