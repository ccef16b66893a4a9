//! Worker 配置
//!
//! 全部来自环境变量；数据库与 Redis 地址必填，其余均有默认值。
//! 数值解析失败视为配置错误，启动即失败。

use anyhow::{Context, Result};
use outbox_domain::eventing::OutboxProcessorConfig;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TOPIC: &str = "company-events";

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub redis_url: String,
    pub broker_topic: String,
    pub broker_partitions: u32,
    pub db_max_connections: u32,
    pub processor: OutboxProcessorConfig,
    pub shutdown_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 以任意键值来源构造配置（便于测试，不必修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is required")?;
        let redis_url = lookup("REDIS_URL").context("REDIS_URL is required")?;
        let broker_topic = lookup("BROKER_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let defaults = OutboxProcessorConfig::default();
        let processor = OutboxProcessorConfig {
            batch_size: parse_or(&lookup, "OUTBOX_BATCH_SIZE", defaults.batch_size)?,
            interval: Duration::from_millis(parse_or(
                &lookup,
                "OUTBOX_INTERVAL_MS",
                defaults.interval.as_millis() as u64,
            )?),
            publish_timeout: Duration::from_millis(parse_or(
                &lookup,
                "OUTBOX_PUBLISH_TIMEOUT_MS",
                defaults.publish_timeout.as_millis() as u64,
            )?),
        };
        if processor.batch_size == 0 {
            anyhow::bail!("OUTBOX_BATCH_SIZE must be greater than zero");
        }
        if processor.interval.is_zero() {
            anyhow::bail!("OUTBOX_INTERVAL_MS must be greater than zero");
        }

        Ok(Self {
            database_url,
            redis_url,
            broker_topic,
            broker_partitions: parse_or::<_, u32>(&lookup, "BROKER_PARTITIONS", 8)?.max(1),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            processor,
            shutdown_timeout: Duration::from_secs(parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 5)?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        None => Ok(default),
    }
}
