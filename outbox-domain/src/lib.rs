//! Outbox 领域层（outbox-domain）
//!
//! 事务性 Outbox 模式的核心抽象：
//! - 公司聚合（`company`）：值对象、聚合、领域事件与仓储协议；
//! - 工作单元与 Outbox 存储协议（`persist`）：事务显式传递，认领使用 skip-locked 语义；
//! - 投递（`eventing`）：消息映射、分区、发布协议与周期性处理器；
//! - 健康检查（`health`）与统一错误（`error`）。
//!
//! 本 crate 不绑定任何存储或传输实现，具体适配位于 `outbox-infra`。
//!
//! 典型用法：
//! 1. 在应用层通过 `run_in_transaction` 把聚合写入与 `OutboxStore::append` 放入同一工作单元；
//! 2. 用 `OutboxProcessor::builder()` 组装事务管理器、存储与发布器并 `start`；
//! 3. 关闭时调用 `ProcessorHandle::shutdown` 并等待 `join`。
//!
pub mod company;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod health;
pub mod persist;
pub mod value_object;
