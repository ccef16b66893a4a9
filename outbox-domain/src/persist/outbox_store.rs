//! Outbox 存储协议
//!
//! 三个操作都必须在工作单元内执行：
//! - `append`：随聚合变更一同插入一条记录；
//! - `claim_batch`：按 ID 升序认领未处理记录，对已被其他事务锁定的行直接跳过
//!   （skip-locked），锁持有到工作单元结束，回滚后记录原样回到未处理集合；
//! - `mark_processed`：幂等地标记为已处理，空列表为 no-op。
//!
use crate::error::DomainResult as Result;
use crate::persist::{NewOutboxRecord, OutboxRecord};
use async_trait::async_trait;

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// 工作单元类型，需与事务管理器一致
    type Tx: Send;

    /// 插入一条记录，返回存储分配的 ID
    async fn append(&self, tx: &mut Self::Tx, record: NewOutboxRecord) -> Result<i64>;

    /// 认领至多 `limit` 条未处理记录
    async fn claim_batch(&self, tx: &mut Self::Tx, limit: usize) -> Result<Vec<OutboxRecord>>;

    /// 将给定记录标记为已处理
    async fn mark_processed(&self, tx: &mut Self::Tx, ids: &[i64]) -> Result<()>;
}
