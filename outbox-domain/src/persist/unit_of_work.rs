//! 工作单元（Unit of Work）
//!
//! 事务句柄作为显式参数在仓储调用间传递：
//! - `TransactionManager` 负责开启/提交/回滚；
//! - `run_in_transaction` 编排一次完整的工作单元：成功提交，失败回滚并返回原始错误，
//!   回滚本身失败时返回同时保留两者的组合错误。
//!
//! 不支持嵌套事务或保存点：并发的两次调用各自开启独立事务。
//!
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// 活动事务句柄
    type Tx: Send;

    /// 开启事务；失败属于致命错误，直接上抛不在内部重试
    async fn begin(&self) -> Result<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    async fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

#[async_trait]
impl<T> TransactionManager for Arc<T>
where
    T: TransactionManager + ?Sized,
{
    type Tx = T::Tx;

    async fn begin(&self) -> Result<Self::Tx> {
        (**self).begin().await
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        (**self).commit(tx).await
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        (**self).rollback(tx).await
    }
}

/// 在一个工作单元中执行 `work`。
///
/// `work` 获得事务句柄的所有权，并连同执行结果一起交还：
///
/// ```ignore
/// run_in_transaction(&manager, |mut tx| async move {
///     let outcome = store.append(&mut tx, record).await;
///     (tx, outcome)
/// })
/// .await?;
/// ```
pub async fn run_in_transaction<M, T, F, Fut>(manager: &M, work: F) -> Result<T>
where
    M: TransactionManager + ?Sized,
    F: FnOnce(M::Tx) -> Fut,
    Fut: Future<Output = (M::Tx, Result<T>)>,
{
    let tx = manager.begin().await?;
    let (tx, outcome) = work(tx).await;

    match outcome {
        Ok(value) => {
            manager.commit(tx).await?;
            Ok(value)
        }
        Err(err) => match manager.rollback(tx).await {
            Ok(()) => Err(err),
            Err(rollback) => Err(DomainError::RollbackFailed {
                rollback: Box::new(rollback),
                source: Box::new(err),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SpyManager {
        fail_begin: bool,
        fail_rollback: bool,
        begun: AtomicUsize,
        committed: AtomicUsize,
        rolled_back: AtomicUsize,
    }

    #[async_trait]
    impl TransactionManager for SpyManager {
        type Tx = usize;

        async fn begin(&self) -> Result<usize> {
            if self.fail_begin {
                return Err(DomainError::fatal("pool closed"));
            }
            Ok(self.begun.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn commit(&self, _tx: usize) -> Result<()> {
            self.committed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&self, _tx: usize) -> Result<()> {
            self.rolled_back.fetch_add(1, Ordering::SeqCst);
            if self.fail_rollback {
                return Err(DomainError::database("connection reset"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let manager = SpyManager::default();
        let value = run_in_transaction(&manager, |tx| async move { (tx, Ok(tx * 10)) })
            .await
            .unwrap();

        assert_eq!(value, 10);
        assert_eq!(manager.committed.load(Ordering::SeqCst), 1);
        assert_eq!(manager.rolled_back.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rolls_back_and_returns_original_error() {
        let manager = SpyManager::default();
        let err = run_in_transaction(&manager, |tx| async move {
            (tx, Err::<(), _>(DomainError::conflict("name taken")))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(manager.committed.load(Ordering::SeqCst), 0);
        assert_eq!(manager.rolled_back.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rollback_failure_is_composite() {
        let manager = SpyManager {
            fail_rollback: true,
            ..Default::default()
        };
        let err = run_in_transaction(&manager, |tx| async move {
            (tx, Err::<(), _>(DomainError::broker("unreachable")))
        })
        .await
        .unwrap_err();

        match err {
            DomainError::RollbackFailed { rollback, source } => {
                assert!(matches!(*rollback, DomainError::Database { .. }));
                assert!(matches!(*source, DomainError::Broker { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn begin_failure_skips_work() {
        let manager = SpyManager {
            fail_begin: true,
            ..Default::default()
        };
        let called = AtomicUsize::new(0);
        let err = run_in_transaction(&manager, |tx| {
            called.fetch_add(1, Ordering::SeqCst);
            async move { (tx, Ok(())) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DomainError::Fatal { .. }));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn independent_calls_open_independent_transactions() {
        let manager = SpyManager::default();
        let (a, b) = tokio::join!(
            run_in_transaction(&manager, |tx| async move { (tx, Ok(tx)) }),
            run_in_transaction(&manager, |tx| async move { (tx, Ok(tx)) }),
        );

        assert_ne!(a.unwrap(), b.unwrap());
        assert_eq!(manager.begun.load(Ordering::SeqCst), 2);
        assert_eq!(manager.committed.load(Ordering::SeqCst), 2);
    }
}
