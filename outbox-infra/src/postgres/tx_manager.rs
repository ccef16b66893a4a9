use async_trait::async_trait;
use outbox_domain::error::{DomainError, DomainResult as Result};
use outbox_domain::persist::TransactionManager;
use sqlx::{PgPool, Postgres, Transaction};

pub type PgTx = Transaction<'static, Postgres>;

#[derive(Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::fatal(format!("failed to begin transaction: {e}")))
    }

    async fn commit(&self, tx: PgTx) -> Result<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: PgTx) -> Result<()> {
        tx.rollback().await?;
        Ok(())
    }
}
