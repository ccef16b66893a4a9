//! 命令服务写路径：聚合写入与 Outbox 追加的原子性，以及与处理器的衔接

use outbox_application::CompanyService;
use outbox_application::command::{CreateCompany, DeleteCompany, UpdateCompany};
use outbox_application::context::AppContext;
use outbox_application::error::AppError;
use outbox_application::query::GetCompany;
use outbox_domain::company::CompanyValidationError;
use outbox_domain::eventing::{InMemoryPublisher, OutboxProcessor, TickOutcome};
use outbox_infra::memory::{
    InMemoryCompanyRepository, InMemoryDatabase, InMemoryOutboxStore, InMemoryTransactionManager,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

type Service =
    CompanyService<InMemoryTransactionManager, InMemoryCompanyRepository, InMemoryOutboxStore>;

fn service(db: &InMemoryDatabase) -> Service {
    CompanyService::builder()
        .tx_manager(Arc::new(db.tx_manager()))
        .companies(Arc::new(db.company_repository()))
        .outbox(Arc::new(db.outbox_store()))
        .build()
}

fn create(name: &str) -> CreateCompany {
    CreateCompany {
        name: name.to_string(),
        description: "Widgets".to_string(),
        employees_count: 12,
        registered: false,
        company_type: "Corporations".to_string(),
    }
}

fn ctx() -> AppContext {
    AppContext::builder().correlation_id("test".into()).build()
}

#[tokio::test]
async fn create_writes_company_and_one_outbox_row_then_processor_drains_it() {
    let db = InMemoryDatabase::new();
    let service = service(&db);

    let dto = service.create_company(&ctx(), create("Acme")).await.unwrap();
    assert_eq!(dto.name, "Acme");
    assert!(db.company(dto.id).is_some());

    let rows = db.outbox_records();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type(), "CompanyCreated");
    assert_eq!(rows[0].aggregate_id(), dto.id.to_string());
    assert!(!rows[0].is_processed());

    let payload: Value = serde_json::from_slice(rows[0].payload()).unwrap();
    assert_eq!(payload["schema_version"], 1);
    assert_eq!(payload["company_id"], dto.id.to_string());
    assert_eq!(payload["type"], "Corporations");

    let publisher = Arc::new(InMemoryPublisher::new(8));
    let processor = OutboxProcessor::builder()
        .tx_manager(Arc::new(db.tx_manager()))
        .store(Arc::new(db.outbox_store()))
        .publisher(publisher.clone())
        .build();

    assert!(matches!(
        processor.tick().await.unwrap(),
        TickOutcome::Published { count: 1, .. }
    ));
    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].message.key(), dto.id.to_string().as_bytes());
    assert!(db.unprocessed_ids().is_empty());

    assert_eq!(processor.tick().await.unwrap(), TickOutcome::Idle);
    assert_eq!(publisher.published().len(), 1);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let db = InMemoryDatabase::new();
    let service = service(&db);

    let mut cmd = create("Acme");
    cmd.employees_count = 0;
    let err = service.create_company(&ctx(), cmd).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Validation(CompanyValidationError::InvalidEmployeesCount)
    ));
    assert_eq!(db.company_count(), 0);
    assert!(db.outbox_records().is_empty());
}

#[tokio::test]
async fn failed_outbox_append_rolls_back_the_company() {
    let db = InMemoryDatabase::new();
    let service = service(&db);

    db.fail_next_appends(1);
    let err = service.create_company(&ctx(), create("Acme")).await.unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(db.company_count(), 0);
    assert!(db.outbox_records().is_empty());
    assert_eq!(db.locked_rows(), 0);
}

#[tokio::test]
async fn duplicate_name_is_a_conflict_without_outbox_row() {
    let db = InMemoryDatabase::new();
    let service = service(&db);

    service.create_company(&ctx(), create("Acme")).await.unwrap();
    let err = service.create_company(&ctx(), create("Acme")).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(db.company_count(), 1);
    assert_eq!(db.outbox_records().len(), 1);
}

#[tokio::test]
async fn update_applies_patch_and_records_only_changed_fields() {
    let db = InMemoryDatabase::new();
    let service = service(&db);
    let created = service.create_company(&ctx(), create("Acme")).await.unwrap();

    let updated = service
        .update_company(
            &ctx(),
            UpdateCompany {
                id: created.id,
                registered: Some(true),
                employees_count: Some(40),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.registered);
    assert_eq!(updated.employees_count, 40);
    assert_eq!(updated.name, "Acme");

    let rows = db.outbox_records();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].event_type(), "CompanyUpdated");
    let payload: Value = serde_json::from_slice(rows[1].payload()).unwrap();
    assert_eq!(payload["registered"], true);
    assert_eq!(payload["employees_count"], 40);
    assert!(payload.get("name").is_none());
}

#[tokio::test]
async fn empty_update_is_a_validation_error() {
    let db = InMemoryDatabase::new();
    let service = service(&db);
    let created = service.create_company(&ctx(), create("Acme")).await.unwrap();

    let err = service
        .update_company(
            &ctx(),
            UpdateCompany {
                id: created.id,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Validation(CompanyValidationError::NoFieldsToUpdate)
    ));
    assert_eq!(db.outbox_records().len(), 1);
}

#[tokio::test]
async fn missing_company_is_not_found_for_update_delete_and_get() {
    let db = InMemoryDatabase::new();
    let service = service(&db);
    let id = Uuid::new_v4();

    let update = UpdateCompany {
        id,
        name: Some("Ghost".into()),
        ..Default::default()
    };
    assert!(matches!(
        service.update_company(&ctx(), update).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        service
            .delete_company(&ctx(), DeleteCompany { id })
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        service.get_company(&ctx(), GetCompany { id }).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(db.outbox_records().is_empty());
}

#[tokio::test]
async fn delete_removes_company_and_appends_deleted_event() {
    let db = InMemoryDatabase::new();
    let service = service(&db);
    let created = service.create_company(&ctx(), create("Acme")).await.unwrap();

    let fetched = service
        .get_company(&ctx(), GetCompany { id: created.id })
        .await
        .unwrap();
    assert_eq!(fetched, created);

    service
        .delete_company(&ctx(), DeleteCompany { id: created.id })
        .await
        .unwrap();

    assert!(db.company(created.id).is_none());
    let rows = db.outbox_records();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].event_type(), "CompanyDeleted");
    assert_eq!(rows[1].aggregate_id(), created.id.to_string());
}
