//! Outbox 记录
//!
//! `NewOutboxRecord` 是写路径构造的待插入记录；`OutboxRecord` 是存储层返回的持久化形态，
//! 其 `id` 由存储分配且单调递增，决定认领优先级（而非全局投递顺序）。
//!
use crate::domain_event::DomainEvent;
use crate::error::DomainResult;
use bon::Builder;

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct NewOutboxRecord {
    /// 事件名（判别字段）
    event_type: String,
    /// 聚合 ID（消息分区键）
    aggregate_id: String,
    /// 已编码的事件载荷
    payload: Vec<u8>,
    /// 事件创建时间（unix 秒）
    created_at: i64,
}

impl NewOutboxRecord {
    /// 由领域事件构造，载荷在此处一次性编码
    pub fn from_event<E>(event: &E) -> DomainResult<Self>
    where
        E: DomainEvent,
    {
        Ok(Self {
            event_type: event.event_name().to_string(),
            aggregate_id: event.aggregate_id(),
            payload: event.encode_payload()?,
            created_at: event.created_at(),
        })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct OutboxRecord {
    /// 存储分配的自增 ID
    id: i64,
    event_type: String,
    aggregate_id: String,
    payload: Vec<u8>,
    created_at: i64,
    /// 仅能由 false 变为 true 一次
    #[builder(default)]
    is_processed: bool,
    processed_at: Option<i64>,
}

impl OutboxRecord {
    /// 以分配好的 ID 落地一条新记录
    pub fn from_new(id: i64, record: NewOutboxRecord) -> Self {
        Self {
            id,
            event_type: record.event_type,
            aggregate_id: record.aggregate_id,
            payload: record.payload,
            created_at: record.created_at,
            is_processed: false,
            processed_at: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn is_processed(&self) -> bool {
        self.is_processed
    }

    pub fn processed_at(&self) -> Option<i64> {
        self.processed_at
    }

    /// 标记为已处理；已处理的记录保持原样
    pub fn mark_processed(&mut self, at: i64) {
        if self.is_processed {
            return;
        }
        self.is_processed = true;
        self.processed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::CompanyEvent;
    use uuid::Uuid;

    #[test]
    fn from_event_copies_identity_and_encodes_once() {
        let id = Uuid::new_v4();
        let event = CompanyEvent::deleted(id);
        let record = NewOutboxRecord::from_event(&event).unwrap();

        assert_eq!(record.event_type(), "CompanyDeleted");
        assert_eq!(record.aggregate_id(), id.to_string());
        assert_eq!(record.created_at(), event.created_at());
        assert_eq!(record.payload(), event.encode_payload().unwrap().as_slice());
    }

    #[test]
    fn mark_processed_happens_once() {
        let mut record = OutboxRecord::from_new(
            7,
            NewOutboxRecord::builder()
                .event_type("CompanyCreated".into())
                .aggregate_id("c-1".into())
                .payload(b"{}".to_vec())
                .created_at(100)
                .build(),
        );
        assert!(!record.is_processed());
        assert_eq!(record.processed_at(), None);

        record.mark_processed(200);
        record.mark_processed(300);

        assert!(record.is_processed());
        assert_eq!(record.processed_at(), Some(200));
    }
}
