use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use caretracker_scoring::CareScheme;
use caretracker_server::build_router;
use caretracker_server::config::{config_path, load_config};
use caretracker_server::state::AppState;
use caretracker_storage::store::{Snapshot, Store};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Structured JSON logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let path = config_path(env::var("CARETRACKER_CONFIG").ok())?;
    let config = load_config(&path)?.with_overrides(
        env::var("CARETRACKER_BIND").ok(),
        env::var("CARETRACKER_SNAPSHOT").ok(),
    );

    let scheme: Arc<dyn CareScheme> = Arc::new(config.scheme.clone());
    let store = match &config.snapshot_path {
        Some(snapshot) => Store::open(snapshot, scheme, config.staffing).await?,
        None => {
            tracing::warn!("no snapshot path configured, data is kept in memory only");
            Store::new(Snapshot::default(), scheme, config.staffing)
        }
    };

    let listener = TcpListener::bind(&config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        scheme = store.scheme().name(),
        "caretracker server listening"
    );

    let app = build_router(AppState::new(store, config));
    axum::serve(listener, app).await?;

    Ok(())
}
