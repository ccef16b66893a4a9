use super::broker_error;
use async_trait::async_trait;
use outbox_domain::error::{DomainError, DomainResult as Result};
use outbox_domain::eventing::{BrokerMessage, MessagePublisher, partition_for};
use redis::Client;
use redis::aio::MultiplexedConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// 基于 Redis Streams 的批量发布器
///
/// 整批 `XADD` 放在一个 `MULTI/EXEC` 流水线中提交：要么整批被确认，要么调用失败。
pub struct RedisStreamPublisher {
    conn: MultiplexedConnection,
    topic: String,
    partitions: u32,
    closed: AtomicBool,
}

impl RedisStreamPublisher {
    pub async fn connect(redis_url: &str, topic: impl Into<String>, partitions: u32) -> Result<Self> {
        let client = Client::open(redis_url).map_err(broker_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(broker_error)?;

        Ok(Self::new(conn, topic, partitions))
    }

    pub fn new(conn: MultiplexedConnection, topic: impl Into<String>, partitions: u32) -> Self {
        Self {
            conn,
            topic: topic.into(),
            partitions: partitions.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// 复用同一多路复用连接（例如用于健康检查）
    pub fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }

    /// 消息 key 对应的 stream 名称
    pub fn stream_for(&self, key: &[u8]) -> String {
        stream_name(&self.topic, partition_for(key, self.partitions))
    }
}

fn stream_name(topic: &str, partition: u32) -> String {
    format!("{topic}:{partition}")
}

/// stream entry 的字段：key、value 以及每个 header 一项
fn entry_fields(message: &BrokerMessage) -> Vec<(&str, &[u8])> {
    let mut fields = Vec::with_capacity(2 + message.headers().len());
    fields.push(("key", message.key()));
    fields.push(("value", message.value()));
    for header in message.headers() {
        fields.push((header.key.as_str(), header.value.as_slice()));
    }
    fields
}

#[async_trait]
impl MessagePublisher for RedisStreamPublisher {
    async fn publish_batch(&self, messages: &[BrokerMessage]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DomainError::broker("publisher closed"));
        }
        if messages.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for message in messages {
            pipe.xadd(self.stream_for(message.key()), "*", &entry_fields(message));
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(broker_error)?;

        debug!(count = messages.len(), topic = %self.topic, "appended batch to redis streams");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // 连接在发布器释放时关闭，这里只拒绝后续发布
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
