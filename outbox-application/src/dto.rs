use outbox_domain::company::Company;
use outbox_domain::entity::Entity;
use serde::Serialize;
use uuid::Uuid;

/// 数据传输对象（DTO）
///
/// - 作为应用层的输出载体，面向接口/外部系统序列化友好；
/// - 与领域模型解耦，避免将领域对象直接暴露到接口层。
pub trait Dto: Serialize + Send + Sync + 'static {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub employees_count: i32,
    pub registered: bool,
    #[serde(rename = "type")]
    pub company_type: String,
}

impl Dto for CompanyDto {}

impl From<&Company> for CompanyDto {
    fn from(company: &Company) -> Self {
        Self {
            id: *company.id(),
            name: company.name().to_string(),
            description: company.description().as_str().to_string(),
            employees_count: company.employees_count().value(),
            registered: company.is_registered(),
            company_type: company.company_type().to_string(),
        }
    }
}
