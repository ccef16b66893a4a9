use super::{InMemoryDatabase, MemoryTx};
use async_trait::async_trait;
use outbox_domain::error::DomainResult as Result;
use outbox_domain::persist::TransactionManager;

#[derive(Clone)]
pub struct InMemoryTransactionManager {
    db: InMemoryDatabase,
}

impl InMemoryTransactionManager {
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        Ok(self.db.begin())
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        tx.commit()
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<()> {
        tx.rollback();
        Ok(())
    }
}
