use outbox_domain::company::CompanyValidationError;
use outbox_domain::error::DomainError;

/// 应用层对外错误
///
/// 校验、冲突与不存在原样透出，交由接口层翻译；其余领域/基础设施错误一律收敛为
/// 不透明的 `Internal`，不在此处重试。
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(#[from] CompanyValidationError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error")]
    Internal(#[source] DomainError),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(e) => AppError::Validation(e),
            DomainError::Conflict { reason } => AppError::Conflict(reason),
            DomainError::NotFound { reason } => AppError::NotFound(reason),
            other => AppError::Internal(other),
        }
    }
}
