use anyhow::Context;
use sqlx::{
    postgres::{PgPoolOptions, PgQueryResult},
    PgPool,
};

use crate::config::AppConfig;

/// Postgres-backed implementation of every store trait.
///
/// The pool is internally synchronized; clones share it.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Outcome of an INSERT: `Ok(false)` when a unique key already holds the row.
pub(crate) fn inserted(result: Result<PgQueryResult, sqlx::Error>) -> anyhow::Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
        Err(e) => Err(e.into()),
    }
}
