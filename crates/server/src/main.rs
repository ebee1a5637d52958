//! Blockline Server - main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod settings;
mod websocket;

use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from a .env file if one is present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "blockline_server=debug,blockline_session=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Arc::new(Settings::from_env());

    tracing::info!("Starting Blockline Server");
    tracing::info!("In the game: /connect localhost:{}", settings.port);

    let router = axum::Router::new()
        .route("/", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&settings));

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
