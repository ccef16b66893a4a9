use crate::{command::Command, context::AppContext, error::AppError};
use async_trait::async_trait;

/// 命令处理器
///
/// 写命令在单个工作单元内完成聚合写入与 Outbox 追加；
/// 返回 `Err` 时两者都不可见。
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, ctx: &AppContext, command: C) -> Result<C::Output, AppError>;
}
