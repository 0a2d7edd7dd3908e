use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use drama_bot::{
    api::{create_router, AppState},
    config::Config,
    db::{ConnectionPool, PgConnectionManager},
    services::{DramaLookup, ReplyFormatter},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = ConnectionPool::new(
        config.pool_options(),
        PgConnectionManager::from_config(&config),
    )?;
    if let Err(e) = pool.initialize().await {
        tracing::error!(error = %e, "Failed to initialize database connection pool");
        std::process::exit(1);
    }

    let lookup = DramaLookup::new(pool.clone(), config.query_timeout());
    let state = AppState::new(
        Arc::new(lookup),
        ReplyFormatter::new(config.bot_username.clone()),
        config.bot_token.clone(),
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Bot is running");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pool.teardown().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
