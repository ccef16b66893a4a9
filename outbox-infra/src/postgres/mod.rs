//! Postgres 实现（sqlx）
//!
//! 事务句柄即 `sqlx::Transaction<'static, Postgres>`：被丢弃而未提交时由 sqlx 自动回滚，
//! 因此被中止的任务不会留下行锁。
//!
mod company_repo;
mod health;
mod outbox_store;
mod tx_manager;

pub use company_repo::PgCompanyRepository;
pub use health::PgHealthCheck;
pub use outbox_store::PgOutboxStore;
pub use tx_manager::{PgTransactionManager, PgTx};

use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};

/// 建立连接池
pub async fn connect_database(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to postgres")?;

    Ok(pool)
}

/// 执行内置迁移（companies 与 outbox 表）
#[tracing::instrument(skip(pool))]
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run migrations")?;
    Ok(())
}
