//! 事件投递子系统（eventing）
//!
//! 提供从 Outbox 到消息中间件的投递抽象与运行时：
//! - `BrokerMessage`：Outbox 记录映射出的消息（key / value / headers）；
//! - `partition_for`：按消息 key 哈希选择分区，保证同一聚合的相对顺序；
//! - `MessagePublisher`：全有或全无的批量发布协议；
//! - `OutboxProcessor`：认领 → 发布 → 标记 的周期性工作单元。
//!
//! 该模块仅定义协议与处理器，不绑定具体传输实现；`InMemoryPublisher` 用于测试与本地开发。
//!
mod message;
mod partition;
mod processor;
mod publisher;
mod publisher_inmemory;

pub use message::{BrokerMessage, EVENT_NAME_HEADER, MessageHeader, OUTBOX_ID_HEADER};
pub use partition::partition_for;
pub use processor::{OutboxProcessor, OutboxProcessorConfig, ProcessorHandle, TickOutcome};
pub use publisher::MessagePublisher;
pub use publisher_inmemory::{InMemoryPublisher, PublishedMessage};
