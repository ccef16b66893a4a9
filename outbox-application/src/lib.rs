//! Outbox 应用层（outbox-application）
//!
//! 公司聚合的命令服务：命令/查询、DTO、处理器协议与对外错误映射。
//! 写操作在同一工作单元内写入聚合与 Outbox 记录，事件由后台处理器异步投递。
//!
pub mod command;
pub mod command_handler;
pub mod company_service;
pub mod context;
pub mod dto;
pub mod error;
pub mod query;
pub mod query_handler;

pub use company_service::CompanyService;
