//! Redis Streams 实现
//!
//! 每个分区对应一个 stream（`{topic}:{partition}`），同一 key 始终落在同一 stream，
//! 以此保证同一聚合的相对顺序。
//!
mod health;
mod publisher;

pub use health::RedisHealthCheck;
pub use publisher::RedisStreamPublisher;

use outbox_domain::error::DomainError;

fn broker_error(err: redis::RedisError) -> DomainError {
    DomainError::broker(err.to_string())
}
