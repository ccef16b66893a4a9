//! 领域事件（Domain Event）
//!
//! 定义事件需要实现的最小接口（`DomainEvent`）：事件名作为判别字段，
//! 聚合 ID 作为分区键，创建时间在构造时固定，载荷按显式版本化的契约编码。

mod domain_event_trait;

pub use domain_event_trait::DomainEvent;
