use anyhow::Context;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the shared connection pool. Connections are created on demand up to `max_connections`.
pub async fn connect(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(cfg.connect_options()?)
        .await
        .context("connect to database")?;
    tracing::info!(
        host = %cfg.host,
        database = %cfg.name,
        max_connections = cfg.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    MIGRATOR.run(pool).await.context("run migrations")?;
    Ok(())
}

/// Waits for checked-out connections to come back, then closes all of them.
pub async fn close(pool: PgPool) {
    tracing::info!("closing database pool");
    pool.close().await;
    tracing::info!("database pool closed");
}
