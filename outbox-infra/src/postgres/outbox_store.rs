use super::PgTx;
use async_trait::async_trait;
use chrono::Utc;
use outbox_domain::error::DomainResult as Result;
use outbox_domain::persist::{NewOutboxRecord, OutboxRecord, OutboxStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct PgOutboxStore;

#[derive(sqlx::FromRow)]
struct OutboxRow {
    id: i64,
    event_type: String,
    aggregate_id: String,
    payload: Vec<u8>,
    created_at: i64,
    is_processed: bool,
    processed_at: Option<i64>,
}

impl From<OutboxRow> for OutboxRecord {
    fn from(row: OutboxRow) -> Self {
        OutboxRecord::builder()
            .id(row.id)
            .event_type(row.event_type)
            .aggregate_id(row.aggregate_id)
            .payload(row.payload)
            .created_at(row.created_at)
            .is_processed(row.is_processed)
            .maybe_processed_at(row.processed_at)
            .build()
    }
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    type Tx = PgTx;

    async fn append(&self, tx: &mut PgTx, record: NewOutboxRecord) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO outbox (event_type, aggregate_id, payload, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(record.event_type())
        .bind(record.aggregate_id())
        .bind(record.payload())
        .bind(record.created_at())
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    async fn claim_batch(&self, tx: &mut PgTx, limit: usize) -> Result<Vec<OutboxRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        // SKIP LOCKED：并发认领得到互不相交的子集，锁持有到事务结束
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r"
            SELECT id, event_type, aggregate_id, payload, created_at, is_processed, processed_at
            FROM outbox
            WHERE is_processed = FALSE
            ORDER BY id ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            ",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(OutboxRecord::from).collect())
    }

    async fn mark_processed(&self, tx: &mut PgTx, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r"
            UPDATE outbox
            SET is_processed = TRUE, processed_at = $1
            WHERE id = ANY($2) AND is_processed = FALSE
            ",
        )
        .bind(Utc::now().timestamp())
        .bind(ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
