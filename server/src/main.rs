use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use devevent_server::assets::CloudinaryUploader;
use devevent_server::config::Config;
use devevent_server::routes::create_routes;
use devevent_server::state::AppState;
use devevent_server::storage::PgEventStore;

const DEFAULT_LOG_FILTER: &str = "devevent_server=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let store = PgEventStore::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    let uploader =
        CloudinaryUploader::new(&config.assets).context("Failed to build asset uploader")?;

    let state = AppState::new(
        Arc::new(store),
        Arc::new(uploader),
        config.assets.folder.clone(),
    );
    let app = create_routes(state, &config.http);

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind address")?;

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
