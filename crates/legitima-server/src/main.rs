use anyhow::{Context, Result};
use legitima_directory::{MemoryDirectory, PoolConfig, PostgresDirectory, UserDirectory};
use legitima_server::{router, AppState, Config, DEFAULT_LOG_FILTER};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let directory = open_directory(&config).await?;
    let state = Arc::new(
        AppState::from_config(&config, directory).context("failed to build application state")?,
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    tracing::info!("Legitima listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn open_directory(config: &Config) -> Result<Arc<dyn UserDirectory>> {
    match &config.database_url {
        Some(url) => {
            let pool = PoolConfig::new(url.clone()).with_max_connections(config.db_max_connections);
            let directory = PostgresDirectory::connect(&pool)
                .await
                .context("failed to connect to database")?;
            directory
                .ensure_schema()
                .await
                .context("failed to create users table")?;
            Ok(Arc::new(directory))
        }
        None => {
            tracing::warn!("LEGITIMA_DATABASE_URL not set, users are kept in memory only");
            Ok(Arc::new(MemoryDirectory::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Graceful shutdown initiated");
}
