//! 消息发布器（MessagePublisher）协议
//!
//! 包装消息中间件客户端，对外提供批量发布：
//! 对处理器而言必须是全有或全无——要么整批被确认，要么调用失败。
//! 若底层传输只支持部分确认，实现方需要自行收窄为已确认子集后再返回错误，
//! 不得在部分失败时返回成功。
//!
use crate::error::DomainResult as Result;
use crate::eventing::BrokerMessage;
use async_trait::async_trait;

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// 按给定顺序发布整批消息
    async fn publish_batch(&self, messages: &[BrokerMessage]) -> Result<()>;

    /// 释放底层连接
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
