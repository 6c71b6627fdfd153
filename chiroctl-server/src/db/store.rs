//! PostgreSQL store: one transaction per unit of work

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use chiroctl_core::repository::{RepoResult, Store, UnitOfWork};

use super::repos::db_err;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Open transaction; dropping it without `commit` rolls back
pub struct PgUnitOfWork {
    pub(crate) tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await.map_err(db_err)
    }
}
