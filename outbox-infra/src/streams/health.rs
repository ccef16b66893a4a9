use super::broker_error;
use async_trait::async_trait;
use outbox_domain::error::DomainResult;
use outbox_domain::health::HealthCheck;
use redis::aio::MultiplexedConnection;

#[derive(Clone)]
pub struct RedisHealthCheck {
    conn: MultiplexedConnection,
}

impl RedisHealthCheck {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl HealthCheck for RedisHealthCheck {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> DomainResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(broker_error)?;
        Ok(())
    }
}
