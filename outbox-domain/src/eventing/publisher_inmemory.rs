//! 内存版消息发布器（InMemoryPublisher）
//!
//! 满足 `MessagePublisher` 协议的轻量实现，典型用途：测试环境、示例与本地开发。
//! - 记录每条已发布消息及其分区（与真实中间件使用同一分区算法）；
//! - 支持故障注入（下 N 次失败、持续不可用、人为延迟）；
//! - `subscribe` 返回 `'static` 生命周期的消息流，便于在 `tokio::spawn` 中消费。
//!
//! 注意：整批要么全部记录，要么全部拒绝，与协议要求一致。

use crate::error::{DomainError, DomainResult as Result};
use crate::eventing::{BrokerMessage, MessagePublisher, partition_for};
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// 已发布的消息及其目标分区
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub partition: u32,
    pub message: BrokerMessage,
}

#[derive(Default)]
struct State {
    published: Vec<PublishedMessage>,
    batches: usize,
    fail_next: usize,
    unavailable: bool,
    delay: Option<Duration>,
    closed: bool,
}

#[derive(Clone)]
pub struct InMemoryPublisher {
    tx: broadcast::Sender<PublishedMessage>,
    state: Arc<Mutex<State>>,
    partitions: u32,
}

impl InMemoryPublisher {
    /// 创建内存发布器，`partitions` 为模拟的分区数
    pub fn new(partitions: u32) -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self {
            tx,
            state: Arc::new(Mutex::new(State::default())),
            partitions: partitions.max(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // 持锁期间不会 panic，中毒时继续使用内部数据
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 接下来的 `n` 次发布失败
    pub fn fail_next(&self, n: usize) {
        self.state().fail_next = n;
    }

    /// 模拟中间件持续不可用
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// 每次发布前等待 `delay`，用于触发发布超时
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state().published.clone()
    }

    /// 成功发布的批次数
    pub fn batches(&self) -> usize {
        self.state().batches
    }

    /// 指定 key 的消息，按发布顺序
    pub fn messages_for_key(&self, key: &[u8]) -> Vec<BrokerMessage> {
        self.state()
            .published
            .iter()
            .filter(|p| p.message.key() == key)
            .map(|p| p.message.clone())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// 订阅后续发布的消息
    pub fn subscribe(&self) -> BoxStream<'static, Result<PublishedMessage>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx).map(|r| r.map_err(|e| DomainError::broker(e.to_string())));
        Box::pin(stream)
    }
}

#[async_trait]
impl MessagePublisher for InMemoryPublisher {
    async fn publish_batch(&self, messages: &[BrokerMessage]) -> Result<()> {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let accepted: Vec<PublishedMessage> = {
            let mut state = self.state();
            if state.closed {
                return Err(DomainError::broker("publisher closed"));
            }
            if state.unavailable {
                return Err(DomainError::broker("broker unavailable"));
            }
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(DomainError::broker("injected publish failure"));
            }

            let accepted: Vec<PublishedMessage> = messages
                .iter()
                .map(|m| PublishedMessage {
                    partition: partition_for(m.key(), self.partitions),
                    message: m.clone(),
                })
                .collect();
            state.published.extend(accepted.iter().cloned());
            state.batches += 1;
            accepted
        };

        for message in accepted {
            // 若当前无订阅者，broadcast 的 send 会返回错误，这里视为非致命并忽略
            let _ = self.tx.send(message);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state().closed = true;
        Ok(())
    }
}
