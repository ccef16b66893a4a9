//! 领域层统一错误定义
//!
//! 按照处理方式划分为：校验（不落库）、唯一约束冲突、聚合不存在、
//! 可重试的基础设施错误（数据库/消息中间件/超时）以及不可恢复的致命错误。
//! 各实现层统一转换为 `DomainError`，由应用层再映射为对外错误。
//!
use crate::company::CompanyValidationError;
use std::time::Duration;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 业务输入 ---
    #[error("validation: {0}")]
    Validation(#[from] CompanyValidationError),
    #[error("conflict: {reason}")]
    Conflict { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // --- 基础设施（可重试） ---
    #[error("database error: {reason}")]
    Database { reason: String },
    #[error("broker error: {reason}")]
    Broker { reason: String },
    #[error("publish timed out after {after:?}")]
    PublishTimeout { after: Duration },

    // --- 事务 ---
    #[error("fatal: {reason}")]
    Fatal { reason: String },
    #[error("rollback failed: {rollback} (original: {source})")]
    RollbackFailed {
        rollback: Box<DomainError>,
        #[source]
        source: Box<DomainError>,
    },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn conflict(reason: impl Into<String>) -> Self {
        DomainError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        DomainError::NotFound {
            reason: reason.into(),
        }
    }

    pub fn database(reason: impl Into<String>) -> Self {
        DomainError::Database {
            reason: reason.into(),
        }
    }

    pub fn broker(reason: impl Into<String>) -> Self {
        DomainError::Broker {
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        DomainError::Fatal {
            reason: reason.into(),
        }
    }

    /// 是否属于可在下一次调度中重试的基础设施错误
    pub fn is_transient(&self) -> bool {
        match self {
            DomainError::Database { .. }
            | DomainError::Broker { .. }
            | DomainError::PublishTimeout { .. } => true,
            DomainError::RollbackFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 sqlx 错误转换为 DomainError

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::not_found("row not found"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::conflict(db.message().to_string())
            }
            other => DomainError::database(other.to_string()),
        }
    }
}
