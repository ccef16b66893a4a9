//! 健康检查探针
//!
//! 外部的 HTTP 层只通过该接口探测依赖是否可用（数据库、消息中间件等）。

use crate::error::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// 依赖名称，用于日志与健康报告
    fn name(&self) -> &str;

    async fn check(&self) -> DomainResult<()>;
}
