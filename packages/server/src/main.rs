use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracksphere_server::config::AppConfig;
use tracksphere_server::notify::email::LogMailer;
use tracksphere_server::state::AppState;
use tracksphere_server::{build_router, database, reminders, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tracksphere_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    seed::seed_bootstrap_committee(&db, &config.bootstrap)
        .await
        .context("Failed to seed bootstrap account")?;

    let files = FilesystemStore::new(
        PathBuf::from(&config.storage.upload_dir),
        config.storage.max_file_size,
    )
    .await
    .context("Failed to initialize upload storage")?;
    let mailer = LogMailer::new(config.email.from_address.clone(), config.email.enabled);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config: config.clone(),
        files: Arc::new(files),
        mailer: Arc::new(mailer),
    };

    if config.reminders.enabled {
        tokio::spawn(reminders::run_deadline_reminders(
            state.clone(),
            config.reminders.clone(),
        ));
    }

    let app = build_router(state);

    info!("Track Sphere listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
