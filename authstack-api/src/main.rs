//! # AuthStack API Server
//!
//! Issues a signed session token in an HttpOnly `jwt` cookie on register
//! and login, and guards the profile routes with it.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/authstack JWT_SECRET=... cargo run -p authstack-api
//! ```
//!
//! `DATABASE_URL=memory://` runs against an in-process store instead.

use authstack_api::{
    app::{build_router, AppState},
    config::Config,
};
use authstack_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, PoolConfig},
    },
    store::{memory::MemoryUserStore, postgres::PgUserStore, UserStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authstack_api=debug,authstack_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "AuthStack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::info!(environment = %config.api.environment, "Configuration loaded");

    let users: Arc<dyn UserStore> = if config.database.is_memory() {
        tracing::warn!("Using in-memory user store; accounts are lost on restart");
        Arc::new(MemoryUserStore::new())
    } else {
        let pool_config = PoolConfig {
            max_connections: config.database.max_connections,
            ..PoolConfig::new(config.database.url.clone())
        };
        let pool = create_pool(pool_config).await?;
        run_migrations(&pool).await?;
        Arc::new(PgUserStore::new(pool))
    };

    let addr = config.bind_address();
    let app = build_router(AppState::new(users, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
