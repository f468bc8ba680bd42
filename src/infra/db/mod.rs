//! Postgres-backed repository implementations.
//!
//! Every statement that touches a counter runs in the same transaction as the
//! row it accounts for, and takes the parent menu row first so concurrent
//! writers under one menu serialize in a fixed lock order.

mod catalog;
mod dishes;
mod fixtures;
mod jobs;
mod menus;
mod submenus;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use apalis_sql::postgres::PostgresStorage;
use sqlx::{
    Postgres, Transaction,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    /// Applies the job queue schema, then the catalog schema. Both share the
    /// `_sqlx_migrations` table, so each migrator ignores the other's versions.
    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        let mut queue = PostgresStorage::<()>::migrations();
        queue.set_ignore_missing(true);
        queue.run(pool).await?;

        let mut catalog = sqlx::migrate!("./migrations");
        catalog.set_ignore_missing(true);
        catalog.run(pool).await.map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

/// Locks the menu row for the rest of the transaction.
async fn lock_menu(tx: &mut Transaction<'_, Postgres>, menu_id: i64) -> Result<(), RepoError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM menus WHERE id = $1 FOR UPDATE")
        .bind(menu_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?
        .map(|_| ())
        .ok_or(RepoError::NotFound)
}

/// Fails with [`RepoError::NotFound`] when an `UPDATE` matched nothing.
fn expect_affected(result: sqlx::postgres::PgQueryResult) -> Result<(), RepoError> {
    if result.rows_affected() == 0 {
        Err(RepoError::NotFound)
    } else {
        Ok(())
    }
}
