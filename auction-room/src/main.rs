// Auction room entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Load the player pool
// 4. Open database, resolve the room id
// 5. Build the engine and check for crash recovery
// 6. Spawn the room actor
// 7. Serve WebSocket clients until Ctrl+C
// 8. Cleanup on exit

use auction_room::app;
use auction_room::auction::AuctionEngine;
use auction_room::config;
use auction_room::db;
use auction_room::seed;
use auction_room::ws_server;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

/// Snapshots buffered per client before a slow reader starts lagging.
const SNAPSHOT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Auction room starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    let rules = config.rules();
    info!(
        "Config loaded: {} teams, purse {} cr, squad {} ({} overseas)",
        config.auction.teams.len(),
        rules.purse,
        rules.max_squad,
        rules.max_overseas
    );

    // 3. Load the player pool
    let players =
        seed::load_all_from_paths(&config.data_paths).context("failed to load player pool")?;
    info!("Loaded {} players", players.len());

    // 4. Open database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let room_id = match db.get_room_id()? {
        Some(id) => id,
        None => {
            let id = db::Database::generate_room_id();
            db.set_room_id(&id)?;
            id
        }
    };

    // 5. Build the engine, then let a saved session replace it
    let engine = AuctionEngine::new(rules, config.team_pairs(), players);
    let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CAPACITY);
    let mut app_state = app::AppState::new(engine, db, room_id, snapshot_tx.clone());

    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Auction state restored from previous session"),
        Ok(false) => info!("Starting fresh auction session"),
        Err(e) => {
            error!("Crash recovery failed: {}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    // 6. Spawn the room actor
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let room = app::RoomHandle::new(cmd_tx);
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, app_state).await {
            error!("Auction room error: {}", e);
        }
    });

    // 7. Serve clients
    let ws_host = config.ws_host.clone();
    let ws_port = config.ws_port;
    let ws_room = room.clone();
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(&ws_host, ws_port, ws_room, snapshot_tx).await {
            error!("WebSocket server error on {}:{}: {}", ws_host, ws_port, e);
        }
    });

    info!(
        "Application ready. WebSocket server listening on {}:{}",
        config.ws_host, config.ws_port
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("Ctrl+C received, shutting down");

    // 8. Cleanup: stop accepting clients, then let the room finish its
    // current command.
    ws_handle.abort();
    room.shutdown().await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Auction room shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("auction-room.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_room=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
