use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::config::AppConfig;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS bets (
        id TEXT PRIMARY KEY NOT NULL,
        sport TEXT NOT NULL,
        team TEXT NOT NULL,
        opponent TEXT NOT NULL,
        bet_type TEXT NOT NULL,
        odds REAL NOT NULL,
        stake REAL NOT NULL CHECK (stake > 0),
        result TEXT,
        payout REAL,
        date TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS bets_created_at_idx ON bets (created_at)",
    "CREATE INDEX IF NOT EXISTS bets_sport_idx ON bets (sport)",
];

pub async fn connect(config: &AppConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory pool with the schema applied.
pub async fn memory() -> Result<SqlitePool, sqlx::Error> {
    // every connection to :memory: is its own database, so keep exactly one
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("schema ready");
    Ok(())
}
