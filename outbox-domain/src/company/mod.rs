//! 公司聚合（company）
//!
//! 作为事件来源的业务聚合：值对象校验、部分更新、领域事件与仓储协议。
//!
mod aggregate;
mod errors;
mod events;
mod repository;
mod value_objects;

pub use aggregate::{Company, CompanyPatch};
pub use errors::CompanyValidationError;
pub use events::{
    COMPANY_CREATED, COMPANY_DELETED, COMPANY_UPDATED, CompanyChanges, CompanyEvent,
    CompanyState, PAYLOAD_SCHEMA_VERSION,
};
pub use repository::CompanyRepository;
pub use value_objects::{CompanyDescription, CompanyName, CompanyType, EmployeesCount};
