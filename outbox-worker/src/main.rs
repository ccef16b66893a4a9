//! Outbox worker
//!
//! 启动流程：加载配置 → 连接 Postgres 并执行迁移 → 连接 Redis → 启动处理器，
//! 收到 Ctrl-C 或 SIGTERM 后发出关闭信号，并在超时内等待进行中的 tick 结束。

use anyhow::{Context, Result};
use outbox_domain::eventing::{OutboxProcessor, ProcessorHandle};
use outbox_domain::health::HealthCheck;
use outbox_infra::config::WorkerConfig;
use outbox_infra::postgres::{self, PgHealthCheck, PgOutboxStore, PgTransactionManager};
use outbox_infra::streams::{RedisHealthCheck, RedisStreamPublisher};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "outbox_worker=info,outbox_domain=info,outbox_infra=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = WorkerConfig::from_env()?;

    let pool = postgres::connect_database(&config.database_url, config.db_max_connections).await?;
    postgres::migrate(&pool).await?;

    let publisher = RedisStreamPublisher::connect(
        &config.redis_url,
        config.broker_topic.clone(),
        config.broker_partitions,
    )
    .await
    .context("failed to connect to redis")?;

    let checks: Vec<Box<dyn HealthCheck>> = vec![
        Box::new(PgHealthCheck::new(pool.clone())),
        Box::new(RedisHealthCheck::new(publisher.connection())),
    ];
    for check in &checks {
        check
            .check()
            .await
            .with_context(|| format!("{} health check failed", check.name()))?;
    }

    info!(
        topic = %config.broker_topic,
        partitions = config.broker_partitions,
        "outbox worker ready"
    );

    let processor = OutboxProcessor::builder()
        .tx_manager(Arc::new(PgTransactionManager::new(pool.clone())))
        .store(Arc::new(PgOutboxStore))
        .publisher(Arc::new(publisher))
        .config(config.processor)
        .build();
    let handle = Arc::new(processor).start();

    shutdown_signal().await;
    info!("shutdown requested");
    stop(handle, &config).await;

    pool.close().await;
    Ok(())
}

async fn stop(handle: ProcessorHandle, config: &WorkerConfig) {
    if !handle.shutdown_timeout(config.shutdown_timeout).await {
        // 被中止的 tick 随事务句柄释放而回滚
        warn!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "processor did not stop in time"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
