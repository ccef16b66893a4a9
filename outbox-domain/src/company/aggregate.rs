//! 公司聚合
//!
//! 字段只能通过已校验的值对象修改；聚合本身不产生副作用，
//! 事件由命令服务在同一工作单元内写入 Outbox。
//!
use super::{CompanyDescription, CompanyName, CompanyType, EmployeesCount};
use crate::entity::Entity;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    id: Uuid,
    name: CompanyName,
    description: CompanyDescription,
    employees_count: EmployeesCount,
    registered: bool,
    company_type: CompanyType,
}

impl Company {
    /// 新建公司，默认未注册
    pub fn new(
        id: Uuid,
        name: CompanyName,
        description: CompanyDescription,
        employees_count: EmployeesCount,
        company_type: CompanyType,
    ) -> Self {
        Self {
            id,
            name,
            description,
            employees_count,
            registered: false,
            company_type,
        }
    }

    pub fn name(&self) -> &CompanyName {
        &self.name
    }

    pub fn description(&self) -> &CompanyDescription {
        &self.description
    }

    pub fn employees_count(&self) -> EmployeesCount {
        self.employees_count
    }

    pub fn company_type(&self) -> CompanyType {
        self.company_type
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn register(&mut self) {
        self.registered = true;
    }

    pub fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    /// 应用部分更新，未提供的字段保持不变
    pub fn apply(&mut self, patch: &CompanyPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(count) = patch.employees_count {
            self.employees_count = count;
        }
        if let Some(registered) = patch.registered {
            self.registered = registered;
        }
        if let Some(company_type) = patch.company_type {
            self.company_type = company_type;
        }
    }
}

impl Entity for Company {
    const TYPE: &'static str = "company";
    type Id = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }
}

/// 已校验的部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<CompanyName>,
    pub description: Option<CompanyDescription>,
    pub employees_count: Option<EmployeesCount>,
    pub registered: Option<bool>,
    pub company_type: Option<CompanyType>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.employees_count.is_none()
            && self.registered.is_none()
            && self.company_type.is_none()
    }
}
