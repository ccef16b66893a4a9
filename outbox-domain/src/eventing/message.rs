//! 消息（BrokerMessage）
//!
//! Outbox 记录到消息中间件消息的映射：
//! - key：聚合 ID（决定分区，保证同一聚合的相对顺序）；
//! - value：已编码的事件载荷；
//! - headers：`event_name`（必需）与 `outbox_id`（供下游幂等与追踪）。
//!
use crate::persist::OutboxRecord;

pub const EVENT_NAME_HEADER: &str = "event_name";
pub const OUTBOX_ID_HEADER: &str = "outbox_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    key: Vec<u8>,
    value: Vec<u8>,
    headers: Vec<MessageHeader>,
}

impl BrokerMessage {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push(MessageHeader {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_slice())
    }

    pub fn event_name(&self) -> Option<&str> {
        self.header(EVENT_NAME_HEADER)
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn outbox_id(&self) -> Option<i64> {
        self.header(OUTBOX_ID_HEADER)
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|v| v.parse().ok())
    }
}

impl From<&OutboxRecord> for BrokerMessage {
    fn from(record: &OutboxRecord) -> Self {
        BrokerMessage::new(record.aggregate_id().as_bytes(), record.payload())
            .with_header(EVENT_NAME_HEADER, record.event_type().as_bytes())
            .with_header(OUTBOX_ID_HEADER, record.id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_maps_to_keyed_message_with_headers() {
        let record = OutboxRecord::builder()
            .id(42)
            .event_type("CompanyUpdated".to_string())
            .aggregate_id("5f1c".to_string())
            .payload(br#"{"schema_version":1}"#.to_vec())
            .created_at(1_700_000_000)
            .build();

        let message = BrokerMessage::from(&record);

        assert_eq!(message.key(), b"5f1c");
        assert_eq!(message.value(), br#"{"schema_version":1}"#);
        assert_eq!(message.event_name(), Some("CompanyUpdated"));
        assert_eq!(message.outbox_id(), Some(42));
        assert_eq!(message.headers().len(), 2);
    }
}
