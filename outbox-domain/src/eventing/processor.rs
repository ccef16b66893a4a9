//! Outbox 处理器（OutboxProcessor）
//!
//! 常驻后台任务，按固定间隔执行一次 tick，每次 tick 是一个完整的工作单元：
//! 1. 认领至多 `batch_size` 条未处理记录（skip-locked）；为空则直接提交结束；
//! 2. 每条记录映射为一条消息（key = 聚合 ID）；
//! 3. 在 `publish_timeout` 内整批发布；
//! 4. 仅当发布完全成功时标记已处理并提交，否则整体回滚，等待下一次 tick 重试。
//!
//! 关闭时先停止定时器，允许进行中的 tick 自然结束，再释放发布器连接。
//! 若承载任务被强制中止，未完成的事务句柄随之释放并回滚，不会留下行锁。
//!
use crate::error::{DomainError, DomainResult as Result};
use crate::eventing::{BrokerMessage, MessagePublisher};
use crate::persist::{OutboxStore, TransactionManager, run_in_transaction};
use bon::Builder;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 处理器配置
#[derive(Clone, Copy, Debug)]
pub struct OutboxProcessorConfig {
    /// 单次 tick 认领的最大记录数
    pub batch_size: usize,
    /// tick 间隔
    pub interval: Duration,
    /// 整批发布的截止时间
    pub publish_timeout: Duration,
}

impl Default for OutboxProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            interval: Duration::from_secs(5),
            publish_timeout: Duration::from_secs(10),
        }
    }
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 没有待处理记录，未调用消息中间件
    Idle,
    /// 已发布并标记 `count` 条记录
    Published {
        count: usize,
        first_id: i64,
        last_id: i64,
    },
}

#[derive(Builder)]
pub struct OutboxProcessor<M, S, P> {
    tx_manager: Arc<M>,
    store: Arc<S>,
    publisher: Arc<P>,
    #[builder(default)]
    config: OutboxProcessorConfig,
}

impl<M, S, P> OutboxProcessor<M, S, P>
where
    M: TransactionManager,
    S: OutboxStore<Tx = M::Tx>,
    P: MessagePublisher,
{
    pub fn config(&self) -> &OutboxProcessorConfig {
        &self.config
    }

    /// 执行一次 认领 → 发布 → 标记。
    ///
    /// 任何步骤失败都会回滚整个工作单元并返回错误，已认领的记录回到未处理集合。
    pub async fn tick(&self) -> Result<TickOutcome> {
        let store = self.store.as_ref();
        let publisher = self.publisher.as_ref();
        let config = self.config;

        run_in_transaction(self.tx_manager.as_ref(), |mut tx| async move {
            let outcome = Self::process_batch(store, publisher, config, &mut tx).await;
            (tx, outcome)
        })
        .await
    }

    async fn process_batch(
        store: &S,
        publisher: &P,
        config: OutboxProcessorConfig,
        tx: &mut M::Tx,
    ) -> Result<TickOutcome> {
        let records = store.claim_batch(tx, config.batch_size).await?;
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return Ok(TickOutcome::Idle);
        };
        let (first_id, last_id) = (first.id(), last.id());
        debug!(count = records.len(), first_id, last_id, "claimed outbox records");

        let messages: Vec<BrokerMessage> = records.iter().map(BrokerMessage::from).collect();
        let ids: Vec<i64> = records.iter().map(|r| r.id()).collect();

        let published = time::timeout(config.publish_timeout, publisher.publish_batch(&messages))
            .await
            .map_err(|_| DomainError::PublishTimeout {
                after: config.publish_timeout,
            })
            .and_then(|r| r);
        if let Err(err) = published {
            warn!(first_id, last_id, error = %err, "publish failed, claimed records will be retried");
            return Err(err);
        }

        store.mark_processed(tx, &ids).await?;

        Ok(TickOutcome::Published {
            count: ids.len(),
            first_id,
            last_id,
        })
    }

    /// 循环执行 tick，直到 `token` 被取消；返回前关闭发布器。
    ///
    /// 取消只在两次 tick 之间被观察到，进行中的 tick 会完整结束。
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            batch_size = self.config.batch_size,
            interval_ms = self.config.interval.as_millis() as u64,
            "outbox processor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::Idle) => debug!("no pending outbox records"),
                        Ok(TickOutcome::Published { count, first_id, last_id }) => {
                            info!(count, first_id, last_id, "published outbox batch");
                        }
                        Err(err) if err.is_transient() => {
                            warn!(error = %err, "outbox tick rolled back");
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "outbox tick failed");
                        }
                    }
                }
            }
        }

        if let Err(err) = self.publisher.close().await {
            warn!(error = %err, "failed to close publisher");
        }
        info!("outbox processor stopped");
    }
}

impl<M, S, P> OutboxProcessor<M, S, P>
where
    M: TransactionManager + 'static,
    M::Tx: 'static,
    S: OutboxStore<Tx = M::Tx> + 'static,
    P: MessagePublisher + 'static,
{
    /// 在独立任务中运行处理器，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> ProcessorHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn(async move { self.run(child).await });

        ProcessorHandle {
            token,
            task: Some(task),
        }
    }
}

/// 处理器运行句柄：用于优雅关闭与等待任务结束；被丢弃时自动发出关闭信号
pub struct ProcessorHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProcessorHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// 发出关闭信号并在 `timeout` 内等待；超时则中止任务。返回任务是否按时结束
    pub async fn shutdown_timeout(mut self, timeout: Duration) -> bool {
        self.shutdown();
        let Some(mut task) = self.task.take() else {
            return true;
        };
        match time::timeout(timeout, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                task.abort();
                let _ = task.await;
                false
            }
        }
    }

    /// 强制中止任务；进行中的工作单元随事务句柄的释放而回滚
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for ProcessorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventing::InMemoryPublisher;
    use crate::persist::{NewOutboxRecord, OutboxRecord};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 最小化的存储替身：标记操作暂存在事务中，提交时才生效
    #[derive(Default)]
    struct Shared {
        rows: Mutex<Vec<OutboxRecord>>,
        committed: AtomicUsize,
        rolled_back: AtomicUsize,
        fail_mark: Mutex<bool>,
    }

    impl Shared {
        fn seed(&self, aggregate: &str, n: usize) {
            let mut rows = self.rows.lock().unwrap();
            for _ in 0..n {
                let id = rows.len() as i64 + 1;
                let record = NewOutboxRecord::builder()
                    .event_type("CompanyUpdated".to_string())
                    .aggregate_id(aggregate.to_string())
                    .payload(b"{}".to_vec())
                    .created_at(1)
                    .build();
                rows.push(OutboxRecord::from_new(id, record));
            }
        }

        fn unprocessed(&self) -> Vec<i64> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| !r.is_processed())
                .map(|r| r.id())
                .collect()
        }
    }

    #[derive(Default)]
    struct SpyTx {
        marked: BTreeSet<i64>,
    }

    struct SpyManager(Arc<Shared>);

    #[async_trait]
    impl TransactionManager for SpyManager {
        type Tx = SpyTx;

        async fn begin(&self) -> Result<SpyTx> {
            Ok(SpyTx::default())
        }

        async fn commit(&self, tx: SpyTx) -> Result<()> {
            let mut rows = self.0.rows.lock().unwrap();
            for row in rows.iter_mut().filter(|r| tx.marked.contains(&r.id())) {
                row.mark_processed(2);
            }
            self.0.committed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&self, _tx: SpyTx) -> Result<()> {
            self.0.rolled_back.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct SpyStore(Arc<Shared>);

    #[async_trait]
    impl OutboxStore for SpyStore {
        type Tx = SpyTx;

        async fn append(&self, _tx: &mut SpyTx, _record: NewOutboxRecord) -> Result<i64> {
            unreachable!("processor never appends")
        }

        async fn claim_batch(&self, _tx: &mut SpyTx, limit: usize) -> Result<Vec<OutboxRecord>> {
            let rows = self.0.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| !r.is_processed())
                .take(limit)
                .cloned()
                .collect())
        }

        async fn mark_processed(&self, tx: &mut SpyTx, ids: &[i64]) -> Result<()> {
            if *self.0.fail_mark.lock().unwrap() {
                return Err(DomainError::database("mark failed"));
            }
            tx.marked.extend(ids.iter().copied());
            Ok(())
        }
    }

    fn processor(
        shared: &Arc<Shared>,
        publisher: &Arc<InMemoryPublisher>,
        config: OutboxProcessorConfig,
    ) -> OutboxProcessor<SpyManager, SpyStore, InMemoryPublisher> {
        OutboxProcessor::builder()
            .tx_manager(Arc::new(SpyManager(shared.clone())))
            .store(Arc::new(SpyStore(shared.clone())))
            .publisher(publisher.clone())
            .config(config)
            .build()
    }

    #[tokio::test]
    async fn empty_outbox_is_idle_and_skips_broker() {
        let shared = Arc::new(Shared::default());
        let publisher = Arc::new(InMemoryPublisher::new(4));
        let processor = processor(&shared, &publisher, OutboxProcessorConfig::default());

        assert_eq!(processor.tick().await.unwrap(), TickOutcome::Idle);
        assert_eq!(publisher.batches(), 0);
        assert_eq!(shared.committed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publishes_then_marks_in_batches() {
        let shared = Arc::new(Shared::default());
        shared.seed("agg-1", 3);
        let publisher = Arc::new(InMemoryPublisher::new(4));
        let config = OutboxProcessorConfig {
            batch_size: 2,
            ..Default::default()
        };
        let processor = processor(&shared, &publisher, config);

        assert_eq!(
            processor.tick().await.unwrap(),
            TickOutcome::Published {
                count: 2,
                first_id: 1,
                last_id: 2
            }
        );
        assert_eq!(shared.unprocessed(), vec![3]);

        assert_eq!(
            processor.tick().await.unwrap(),
            TickOutcome::Published {
                count: 1,
                first_id: 3,
                last_id: 3
            }
        );
        assert!(shared.unprocessed().is_empty());
        assert_eq!(processor.tick().await.unwrap(), TickOutcome::Idle);

        let ids: Vec<Option<i64>> = publisher
            .messages_for_key(b"agg-1")
            .iter()
            .map(|m| m.outbox_id())
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn publish_failure_rolls_back_whole_tick() {
        let shared = Arc::new(Shared::default());
        shared.seed("agg-1", 2);
        let publisher = Arc::new(InMemoryPublisher::new(4));
        publisher.fail_next(1);
        let processor = processor(&shared, &publisher, OutboxProcessorConfig::default());

        let err = processor.tick().await.unwrap_err();
        assert!(matches!(err, DomainError::Broker { .. }));
        assert_eq!(shared.unprocessed(), vec![1, 2]);
        assert_eq!(shared.rolled_back.load(Ordering::SeqCst), 1);

        assert!(matches!(
            processor.tick().await.unwrap(),
            TickOutcome::Published { count: 2, .. }
        ));
        assert!(shared.unprocessed().is_empty());
    }

    #[tokio::test]
    async fn mark_failure_after_publish_leaves_records_for_redelivery() {
        let shared = Arc::new(Shared::default());
        shared.seed("agg-1", 1);
        *shared.fail_mark.lock().unwrap() = true;
        let publisher = Arc::new(InMemoryPublisher::new(4));
        let processor = processor(&shared, &publisher, OutboxProcessorConfig::default());

        assert!(processor.tick().await.is_err());
        // 已发布但未标记：至少一次语义下允许重复投递
        assert_eq!(publisher.published().len(), 1);
        assert_eq!(shared.unprocessed(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_broker_times_out_and_rolls_back() {
        let shared = Arc::new(Shared::default());
        shared.seed("agg-1", 1);
        let publisher = Arc::new(InMemoryPublisher::new(4));
        publisher.set_delay(Some(Duration::from_secs(30)));
        let config = OutboxProcessorConfig {
            publish_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let processor = processor(&shared, &publisher, config);

        let err = processor.tick().await.unwrap_err();
        assert!(matches!(err, DomainError::PublishTimeout { .. }));
        assert!(err.is_transient());
        assert_eq!(shared.unprocessed(), vec![1]);
    }

    #[tokio::test]
    async fn handle_shutdown_stops_loop_and_closes_publisher() {
        let shared = Arc::new(Shared::default());
        shared.seed("agg-1", 2);
        let publisher = Arc::new(InMemoryPublisher::new(4));
        let config = OutboxProcessorConfig {
            interval: Duration::from_millis(10),
            ..Default::default()
        };
        let handle = Arc::new(processor(&shared, &publisher, config)).start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown();
        handle.join().await;

        assert!(shared.unprocessed().is_empty());
        assert!(publisher.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_timeout_aborts_a_stuck_tick() {
        let shared = Arc::new(Shared::default());
        shared.seed("agg-1", 1);
        let publisher = Arc::new(InMemoryPublisher::new(4));
        publisher.set_delay(Some(Duration::from_secs(600)));
        let config = OutboxProcessorConfig {
            publish_timeout: Duration::from_secs(900),
            ..Default::default()
        };
        let handle = Arc::new(processor(&shared, &publisher, config)).start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.shutdown_timeout(Duration::from_secs(1)).await);
        assert_eq!(shared.unprocessed(), vec![1]);
        assert!(publisher.published().is_empty());
    }
}
