use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bettrack_backend::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "bettrack_backend={},sqlx=warn,tower_http=info",
                config.log_level
            )
            .into()
        }))
        .init();

    let addr = config.addr().map_err(anyhow::Error::msg)?;

    let pool = db::connect(&config)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    tracing::info!(plan = ?config.plan, limit = ?config.bet_limit(), "bet tracker starting");

    let state = AppState::new(pool, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
