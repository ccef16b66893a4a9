use super::MemoryTx;
use async_trait::async_trait;
use outbox_domain::error::DomainResult as Result;
use outbox_domain::persist::{NewOutboxRecord, OutboxRecord, OutboxStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryOutboxStore;

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    type Tx = MemoryTx;

    async fn append(&self, tx: &mut MemoryTx, record: NewOutboxRecord) -> Result<i64> {
        tx.append_outbox(record)
    }

    async fn claim_batch(&self, tx: &mut MemoryTx, limit: usize) -> Result<Vec<OutboxRecord>> {
        tx.claim_outbox(limit)
    }

    async fn mark_processed(&self, tx: &mut MemoryTx, ids: &[i64]) -> Result<()> {
        tx.mark_outbox(ids);
        Ok(())
    }
}
