//! 实体（Entity）基础抽象
//!
//! 为聚合提供统一的标识能力；事件与 Outbox 记录均以该标识作为分区键。
//!
use std::fmt::Display;

/// 具备唯一标识的实体抽象
pub trait Entity: Send + Sync {
    /// 聚合类型名（用于日志与冲突描述）
    const TYPE: &'static str;

    /// 实体标识类型，要求可显示与可克隆
    type Id: Clone + Display + Send + Sync;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;
}
