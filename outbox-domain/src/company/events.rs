//! 公司领域事件
//!
//! 事件集合是封闭的：新增事件需要新增变体并同步更新编码。
//! 载荷编码契约（版本 1）：JSON 对象，包含 `schema_version`、`company_id`
//! 以及各变体自身的字段。
//!
use super::{Company, CompanyPatch};
use crate::domain_event::DomainEvent;
use crate::entity::Entity;
use crate::error::DomainResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const COMPANY_CREATED: &str = "CompanyCreated";
pub const COMPANY_UPDATED: &str = "CompanyUpdated";
pub const COMPANY_DELETED: &str = "CompanyDeleted";

/// 当前载荷版本
pub const PAYLOAD_SCHEMA_VERSION: u16 = 1;

/// 创建事件携带的完整状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyState {
    pub name: String,
    pub description: String,
    pub employees_count: i32,
    pub registered: bool,
    #[serde(rename = "type")]
    pub company_type: String,
}

impl From<&Company> for CompanyState {
    fn from(company: &Company) -> Self {
        Self {
            name: company.name().to_string(),
            description: company.description().as_str().to_string(),
            employees_count: company.employees_count().value(),
            registered: company.is_registered(),
            company_type: company.company_type().to_string(),
        }
    }
}

/// 更新事件仅携带发生变化的字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
}

impl From<&CompanyPatch> for CompanyChanges {
    fn from(patch: &CompanyPatch) -> Self {
        Self {
            name: patch.name.as_ref().map(|n| n.to_string()),
            description: patch.description.as_ref().map(|d| d.as_str().to_string()),
            employees_count: patch.employees_count.map(|c| c.value()),
            registered: patch.registered,
            company_type: patch.company_type.map(|t| t.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyEvent {
    Created {
        company_id: Uuid,
        created_at: i64,
        state: CompanyState,
    },
    Updated {
        company_id: Uuid,
        created_at: i64,
        changes: CompanyChanges,
    },
    Deleted {
        company_id: Uuid,
        created_at: i64,
    },
}

impl CompanyEvent {
    pub fn created(company: &Company) -> Self {
        CompanyEvent::Created {
            company_id: *company.id(),
            created_at: Utc::now().timestamp(),
            state: CompanyState::from(company),
        }
    }

    pub fn updated(company_id: Uuid, patch: &CompanyPatch) -> Self {
        CompanyEvent::Updated {
            company_id,
            created_at: Utc::now().timestamp(),
            changes: CompanyChanges::from(patch),
        }
    }

    pub fn deleted(company_id: Uuid) -> Self {
        CompanyEvent::Deleted {
            company_id,
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn company_id(&self) -> Uuid {
        match self {
            CompanyEvent::Created { company_id, .. }
            | CompanyEvent::Updated { company_id, .. }
            | CompanyEvent::Deleted { company_id, .. } => *company_id,
        }
    }
}

#[derive(Serialize)]
struct PayloadV1<'a, T: Serialize> {
    schema_version: u16,
    company_id: &'a Uuid,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct NoFields {}

fn encode<T: Serialize>(company_id: &Uuid, body: &T) -> DomainResult<Vec<u8>> {
    let payload = PayloadV1 {
        schema_version: PAYLOAD_SCHEMA_VERSION,
        company_id,
        body,
    };
    Ok(serde_json::to_vec(&payload)?)
}

impl DomainEvent for CompanyEvent {
    fn event_name(&self) -> &'static str {
        match self {
            CompanyEvent::Created { .. } => COMPANY_CREATED,
            CompanyEvent::Updated { .. } => COMPANY_UPDATED,
            CompanyEvent::Deleted { .. } => COMPANY_DELETED,
        }
    }

    fn aggregate_id(&self) -> String {
        self.company_id().to_string()
    }

    fn created_at(&self) -> i64 {
        match self {
            CompanyEvent::Created { created_at, .. }
            | CompanyEvent::Updated { created_at, .. }
            | CompanyEvent::Deleted { created_at, .. } => *created_at,
        }
    }

    fn schema_version(&self) -> u16 {
        PAYLOAD_SCHEMA_VERSION
    }

    fn encode_payload(&self) -> DomainResult<Vec<u8>> {
        match self {
            CompanyEvent::Created {
                company_id, state, ..
            } => encode(company_id, state),
            CompanyEvent::Updated {
                company_id,
                changes,
                ..
            } => encode(company_id, changes),
            CompanyEvent::Deleted { company_id, .. } => encode(company_id, &NoFields {}),
        }
    }
}
