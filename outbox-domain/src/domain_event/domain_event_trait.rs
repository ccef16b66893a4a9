use crate::error::DomainResult;
use std::fmt;

/// 领域事件需要满足的通用能力边界
///
/// 事件在业务变更时同步产生，创建后不可变。
pub trait DomainEvent: Clone + fmt::Debug + Send + Sync {
    /// 事件名（判别字段，如 `CompanyCreated`）
    fn event_name(&self) -> &'static str;

    /// 事件所属聚合的标识（同时作为消息分区键）
    fn aggregate_id(&self) -> String;

    /// 事件创建时间（unix 秒）
    fn created_at(&self) -> i64;

    /// 载荷编码版本
    fn schema_version(&self) -> u16;

    /// 按当前版本编码载荷
    fn encode_payload(&self) -> DomainResult<Vec<u8>>;
}
