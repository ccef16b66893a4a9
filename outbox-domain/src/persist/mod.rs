//! 持久化协议（persist）
//!
//! 定义工作单元、Outbox 记录与 Outbox 存储协议：
//! - 事务管理（`TransactionManager`/`run_in_transaction`）；
//! - Outbox 记录的写入形态与持久化形态（`NewOutboxRecord`/`OutboxRecord`）；
//! - 追加、跳锁认领与标记已处理（`OutboxStore`）。
//!
//! 该模块聚焦协议，具体存储后端（如 Postgres）由基础设施层实现并注入。
//!
mod outbox_record;
mod outbox_store;
mod unit_of_work;

pub use outbox_record::{NewOutboxRecord, OutboxRecord};
pub use outbox_store::OutboxStore;
pub use unit_of_work::{TransactionManager, run_in_transaction};
