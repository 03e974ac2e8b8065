use std::net::SocketAddr;
use std::sync::Arc;

use kashaf_core::Config;
use kashaf_core::config_file;
use tracing_subscriber::EnvFilter;

mod handlers;
mod models;
mod state;
mod template;
mod upload;

use state::AppState;

const DEFAULT_PORT: u16 = 5001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::default();
    config.apply_file(&config_file::load_config());
    config.apply_env(|name| std::env::var(name).ok());
    if config.credential().is_some() {
        tracing::info!("using server-side API key when the form leaves it blank");
    }

    let port = match std::env::var("PORT") {
        Ok(p) => p
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", p, e))?,
        Err(_) => DEFAULT_PORT,
    };

    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> axum::Router {
    // Allow book-sized uploads (50MB)
    let body_limit = axum::extract::DefaultBodyLimit::max(50 * 1024 * 1024);

    axum::Router::new()
        .route("/", axum::routing::get(handlers::index::index))
        .route("/analyze", axum::routing::post(handlers::analyze::analyze))
        .route("/export", axum::routing::post(handlers::export::export))
        .layer(body_limit)
        .with_state(state)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
    }
}
