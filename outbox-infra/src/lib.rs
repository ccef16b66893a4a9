//! Outbox 基础设施层（outbox-infra）
//!
//! 领域层协议的具体实现：
//! - `postgres`：基于 sqlx 的事务管理器、Outbox 存储、公司仓储、迁移与健康检查；
//! - `streams`：基于 Redis Streams 的消息发布器与健康检查；
//! - `memory`：具备真实工作单元语义的内存数据库，用于测试与本地开发；
//! - `config`：从环境变量加载 worker 配置。
//!
pub mod config;
pub mod memory;
pub mod postgres;
pub mod streams;
