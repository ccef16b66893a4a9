//! 内存数据库
//!
//! 以真实的工作单元语义实现领域层的存储协议，典型用途：测试环境、示例与本地开发。
//! - 事务内的写入先暂存，提交时按顺序生效，回滚或丢弃时全部作废；
//! - 行锁记录在共享表中，提交、回滚或事务句柄被丢弃时释放；
//! - Outbox 认领跳过被其他事务锁定的行（skip-locked）；
//! - Outbox ID 在追加时分配，回滚后留下空洞（与序列一致）。
//!
//! 与 Postgres 的差异：对已被其他事务锁定的公司行加锁时立即失败（NOWAIT），而不是等待。
//!
mod company_repo;
mod outbox_store;
mod tx_manager;

pub use company_repo::InMemoryCompanyRepository;
pub use outbox_store::InMemoryOutboxStore;
pub use tx_manager::InMemoryTransactionManager;

use chrono::Utc;
use outbox_domain::company::Company;
use outbox_domain::entity::Entity;
use outbox_domain::error::{DomainError, DomainResult as Result};
use outbox_domain::persist::{NewOutboxRecord, OutboxRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Company(Uuid),
    Outbox(i64),
}

enum Op {
    InsertCompany(Company),
    UpdateCompany(Company),
    DeleteCompany(Uuid),
    AppendOutbox(OutboxRecord),
    MarkProcessed { ids: Vec<i64>, at: i64 },
}

#[derive(Default)]
struct Tables {
    companies: BTreeMap<Uuid, Company>,
    outbox: BTreeMap<i64, OutboxRecord>,
    locks: HashMap<RowKey, u64>,
}

impl Tables {
    fn release(&mut self, tx_id: u64) {
        self.locks.retain(|_, owner| *owner != tx_id);
    }

    fn lock(&mut self, key: RowKey, tx_id: u64) -> Result<()> {
        match self.locks.get(&key) {
            Some(owner) if *owner != tx_id => Err(DomainError::database(format!(
                "{key:?} is locked by a concurrent transaction"
            ))),
            _ => {
                self.locks.insert(key, tx_id);
                Ok(())
            }
        }
    }

    fn locked_by_other(&self, key: RowKey, tx_id: u64) -> bool {
        self.locks.get(&key).is_some_and(|owner| *owner != tx_id)
    }
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    next_tx: AtomicU64,
    next_outbox_id: AtomicI64,
    fail_appends: AtomicUsize,
    fail_commits: AtomicUsize,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 计数型故障注入：计数大于 0 时消耗一次并返回 true
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// 内存数据库句柄，克隆后共享同一份数据
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    shared: Arc<Shared>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tx_manager(&self) -> InMemoryTransactionManager {
        InMemoryTransactionManager::new(self.clone())
    }

    pub fn outbox_store(&self) -> InMemoryOutboxStore {
        InMemoryOutboxStore
    }

    pub fn company_repository(&self) -> InMemoryCompanyRepository {
        InMemoryCompanyRepository
    }

    /// 接下来的 `n` 次 Outbox 追加失败
    pub fn fail_next_appends(&self, n: usize) {
        self.shared.fail_appends.store(n, Ordering::SeqCst);
    }

    /// 接下来的 `n` 次提交失败（事务随之作废）
    pub fn fail_next_commits(&self, n: usize) {
        self.shared.fail_commits.store(n, Ordering::SeqCst);
    }

    /// 已提交的 Outbox 记录，按 ID 升序
    pub fn outbox_records(&self) -> Vec<OutboxRecord> {
        self.shared.tables().outbox.values().cloned().collect()
    }

    pub fn unprocessed_ids(&self) -> Vec<i64> {
        self.shared
            .tables()
            .outbox
            .values()
            .filter(|r| !r.is_processed())
            .map(|r| r.id())
            .collect()
    }

    pub fn company(&self, id: Uuid) -> Option<Company> {
        self.shared.tables().companies.get(&id).cloned()
    }

    pub fn company_count(&self) -> usize {
        self.shared.tables().companies.len()
    }

    /// 当前被持有的行锁数量
    pub fn locked_rows(&self) -> usize {
        self.shared.tables().locks.len()
    }

    /// 直接写入一条已提交的 Outbox 记录（测试数据准备）
    pub fn seed_outbox(&self, record: NewOutboxRecord) -> i64 {
        let id = self.shared.next_outbox_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared
            .tables()
            .outbox
            .insert(id, OutboxRecord::from_new(id, record));
        id
    }

    fn begin(&self) -> MemoryTx {
        MemoryTx {
            id: self.shared.next_tx.fetch_add(1, Ordering::SeqCst) + 1,
            shared: self.shared.clone(),
            ops: Vec::new(),
            finished: false,
        }
    }
}

/// 内存事务句柄
///
/// 被丢弃而未提交时等同回滚：暂存写入作废，持有的行锁释放。
pub struct MemoryTx {
    id: u64,
    shared: Arc<Shared>,
    ops: Vec<Op>,
    finished: bool,
}

impl MemoryTx {
    /// 已提交数据叠加本事务暂存写入后的公司视图
    fn companies_view(&self, tables: &Tables) -> BTreeMap<Uuid, Company> {
        let mut view = tables.companies.clone();
        for op in &self.ops {
            match op {
                Op::InsertCompany(c) | Op::UpdateCompany(c) => {
                    view.insert(*c.id(), c.clone());
                }
                Op::DeleteCompany(id) => {
                    view.remove(id);
                }
                _ => {}
            }
        }
        view
    }

    fn marked_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ops.iter().flat_map(|op| match op {
            Op::MarkProcessed { ids, .. } => ids.as_slice(),
            _ => &[][..],
        })
        .copied()
    }

    fn insert_company(&mut self, company: &Company) -> Result<()> {
        let mut tables = self.shared.tables();
        let view = self.companies_view(&tables);
        if view.contains_key(company.id()) {
            return Err(DomainError::conflict(format!(
                "{} {} already exists",
                Company::TYPE,
                company.id()
            )));
        }
        check_unique_name(&view, company)?;
        tables.lock(RowKey::Company(*company.id()), self.id)?;
        drop(tables);

        self.ops.push(Op::InsertCompany(company.clone()));
        Ok(())
    }

    fn update_company(&mut self, company: &Company) -> Result<()> {
        let mut tables = self.shared.tables();
        let view = self.companies_view(&tables);
        if !view.contains_key(company.id()) {
            return Err(not_found(*company.id()));
        }
        check_unique_name(&view, company)?;
        tables.lock(RowKey::Company(*company.id()), self.id)?;
        drop(tables);

        self.ops.push(Op::UpdateCompany(company.clone()));
        Ok(())
    }

    fn delete_company(&mut self, id: Uuid) -> Result<()> {
        let mut tables = self.shared.tables();
        if !self.companies_view(&tables).contains_key(&id) {
            return Err(not_found(id));
        }
        tables.lock(RowKey::Company(id), self.id)?;
        drop(tables);

        self.ops.push(Op::DeleteCompany(id));
        Ok(())
    }

    fn find_company(&self, id: Uuid, for_update: bool) -> Result<Option<Company>> {
        let mut tables = self.shared.tables();
        let found = self.companies_view(&tables).remove(&id);
        if for_update && found.is_some() {
            tables.lock(RowKey::Company(id), self.id)?;
        }
        Ok(found)
    }

    fn append_outbox(&mut self, record: NewOutboxRecord) -> Result<i64> {
        if take_failure(&self.shared.fail_appends) {
            return Err(DomainError::database("injected outbox append failure"));
        }
        let id = self.shared.next_outbox_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.ops
            .push(Op::AppendOutbox(OutboxRecord::from_new(id, record)));
        Ok(id)
    }

    fn claim_outbox(&mut self, limit: usize) -> Result<Vec<OutboxRecord>> {
        let marked: Vec<i64> = self.marked_ids().collect();
        let mut tables = self.shared.tables();

        let committed: Vec<OutboxRecord> = tables
            .outbox
            .values()
            .filter(|r| !r.is_processed() && !marked.contains(&r.id()))
            .filter(|r| !tables.locked_by_other(RowKey::Outbox(r.id()), self.id))
            .take(limit)
            .cloned()
            .collect();
        for record in &committed {
            tables.lock(RowKey::Outbox(record.id()), self.id)?;
        }
        drop(tables);

        // 本事务自己追加的记录对自身可见
        let own = self.ops.iter().filter_map(|op| match op {
            Op::AppendOutbox(r) if !marked.contains(&r.id()) => Some(r.clone()),
            _ => None,
        });

        let remaining = limit - committed.len();
        Ok(committed.into_iter().chain(own.take(remaining)).collect())
    }

    fn mark_outbox(&mut self, ids: &[i64]) {
        if ids.is_empty() {
            return;
        }
        self.ops.push(Op::MarkProcessed {
            ids: ids.to_vec(),
            at: Utc::now().timestamp(),
        });
    }

    fn commit(mut self) -> Result<()> {
        self.finished = true;
        let ops = std::mem::take(&mut self.ops);
        let mut tables = self.shared.tables();

        if take_failure(&self.shared.fail_commits) {
            tables.release(self.id);
            return Err(DomainError::database("injected commit failure"));
        }

        // 公司表先在副本上校验，失败则整个事务作废
        let mut companies = tables.companies.clone();
        for op in &ops {
            let applied = match op {
                Op::InsertCompany(c) => check_unique_name(&companies, c).map(|_| {
                    companies.insert(*c.id(), c.clone());
                }),
                Op::UpdateCompany(c) => check_unique_name(&companies, c).map(|_| {
                    companies.insert(*c.id(), c.clone());
                }),
                Op::DeleteCompany(id) => {
                    companies.remove(id);
                    Ok(())
                }
                _ => Ok(()),
            };
            if let Err(err) = applied {
                tables.release(self.id);
                return Err(err);
            }
        }
        tables.companies = companies;

        for op in ops {
            match op {
                Op::AppendOutbox(record) => {
                    tables.outbox.insert(record.id(), record);
                }
                Op::MarkProcessed { ids, at } => {
                    for id in ids {
                        if let Some(record) = tables.outbox.get_mut(&id) {
                            record.mark_processed(at);
                        }
                    }
                }
                _ => {}
            }
        }

        tables.release(self.id);
        Ok(())
    }

    fn rollback(mut self) {
        self.finished = true;
        self.ops.clear();
        self.shared.tables().release(self.id);
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.tables().release(self.id);
        }
    }
}

fn check_unique_name(companies: &BTreeMap<Uuid, Company>, company: &Company) -> Result<()> {
    let taken = companies
        .values()
        .any(|c| c.id() != company.id() && c.name() == company.name());
    if taken {
        return Err(DomainError::conflict(format!(
            "company name {} already exists",
            company.name()
        )));
    }
    Ok(())
}

fn not_found(id: Uuid) -> DomainError {
    DomainError::not_found(format!("{} {id}", Company::TYPE))
}
