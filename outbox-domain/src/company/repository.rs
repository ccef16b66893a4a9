//! 公司仓储协议
//!
//! 所有方法都显式接收当前工作单元（事务句柄），不做隐式的全局查找；
//! 具体存储后端由基础设施层实现并注入。
//!
use super::Company;
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// 工作单元类型，需与事务管理器一致
    type Tx: Send;

    /// 插入新公司；名称重复时返回 `DomainError::Conflict`
    async fn create(&self, tx: &mut Self::Tx, company: &Company) -> Result<()>;

    /// 覆盖已有公司；不存在返回 `NotFound`，名称重复返回 `Conflict`
    async fn update(&self, tx: &mut Self::Tx, company: &Company) -> Result<()>;

    /// 删除公司；不存在返回 `NotFound`
    async fn delete(&self, tx: &mut Self::Tx, id: Uuid) -> Result<()>;

    async fn find_by_id(&self, tx: &mut Self::Tx, id: Uuid) -> Result<Option<Company>>;

    /// 读取并锁定该行直到工作单元结束
    async fn find_by_id_for_update(&self, tx: &mut Self::Tx, id: Uuid)
    -> Result<Option<Company>>;
}
