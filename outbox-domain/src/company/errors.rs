use thiserror::Error;

/// 公司聚合的输入校验错误（从不落库）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompanyValidationError {
    #[error("invalid company name length")]
    InvalidNameLength,
    #[error("invalid company description length")]
    InvalidDescriptionLength,
    #[error("invalid employees count")]
    InvalidEmployeesCount,
    #[error("invalid company type")]
    InvalidCompanyType,
    #[error("at least one field must be provided for update")]
    NoFieldsToUpdate,
}
