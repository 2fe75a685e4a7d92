mod config;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use warden_db::Database;
use warden_registry::{BanRegistry, ChatPolicyRegistry};

use crate::config::Config;
use crate::state::AppStateInner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and load both indices
    let db = Arc::new(Database::open(&config.db_path, config.db_readers)?);
    let state = Arc::new(AppStateInner {
        bans: BanRegistry::new(db.clone())?,
        chats: ChatPolicyRegistry::new(db)?,
        admin_token: config.admin_token.clone(),
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = config.listen_addr()?;
    info!("Warden listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
