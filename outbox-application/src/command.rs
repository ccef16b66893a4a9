use outbox_domain::company::{
    Company, CompanyDescription, CompanyName, CompanyPatch, CompanyType, CompanyValidationError,
    EmployeesCount,
};
use outbox_domain::value_object::ValueObject;
use serde::Deserialize;
use uuid::Uuid;

/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，通常会修改领域状态。
/// - 与 [`Query`](crate::query::Query) 相对，`Command` 应避免读写混用。
/// - 建议保持语义化的“动宾结构”命名，如 `CreateCompany`、`DeleteCompany`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于日志、追踪与路由。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 执行成功后返回给调用方的结果
    type Output: Send;
}

/// 创建公司（全部字段为未经校验的原始输入）
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub employees_count: i32,
    #[serde(default)]
    pub registered: bool,
    #[serde(rename = "type")]
    pub company_type: String,
}

impl CreateCompany {
    /// 校验输入并构造聚合；不产生任何副作用
    pub fn into_company(self, id: Uuid) -> Result<Company, CompanyValidationError> {
        let mut company = Company::new(
            id,
            CompanyName::parse(self.name)?,
            CompanyDescription::parse(self.description)?,
            EmployeesCount::parse(self.employees_count)?,
            CompanyType::parse(self.company_type)?,
        );
        company.set_registered(self.registered);
        Ok(company)
    }
}

impl Command for CreateCompany {
    const NAME: &'static str = "CreateCompany";
    type Output = crate::dto::CompanyDto;
}

/// 部分更新公司；未给出的字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompany {
    #[serde(skip)]
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub employees_count: Option<i32>,
    pub registered: Option<bool>,
    #[serde(rename = "type")]
    pub company_type: Option<String>,
}

impl UpdateCompany {
    /// 校验给出的字段并构造补丁；空补丁视为校验错误
    pub fn to_patch(&self) -> Result<CompanyPatch, CompanyValidationError> {
        let patch = CompanyPatch {
            name: self.name.clone().map(CompanyName::parse).transpose()?,
            description: self
                .description
                .clone()
                .map(CompanyDescription::parse)
                .transpose()?,
            employees_count: self.employees_count.map(EmployeesCount::parse).transpose()?,
            registered: self.registered,
            company_type: self.company_type.clone().map(CompanyType::parse).transpose()?,
        };
        if patch.is_empty() {
            return Err(CompanyValidationError::NoFieldsToUpdate);
        }
        Ok(patch)
    }
}

impl Command for UpdateCompany {
    const NAME: &'static str = "UpdateCompany";
    type Output = crate::dto::CompanyDto;
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteCompany {
    pub id: Uuid,
}

impl Command for DeleteCompany {
    const NAME: &'static str = "DeleteCompany";
    type Output = ();
}
