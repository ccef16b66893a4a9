//! 公司命令服务（写路径）
//!
//! 每个写操作遵循同一顺序：
//! 1. 在开启事务之前完成全部输入校验，非法输入直接返回，不产生副作用；
//! 2. 在同一个工作单元中写入聚合并追加对应的 Outbox 记录；
//! 3. 两者一起提交或一起回滚。
//!
//! 服务本身不直接调用消息中间件，事件由后台的 Outbox 处理器异步投递。
//!
use crate::command::{Command, CreateCompany, DeleteCompany, UpdateCompany};
use crate::command_handler::CommandHandler;
use crate::context::AppContext;
use crate::dto::CompanyDto;
use crate::error::AppError;
use crate::query::{GetCompany, Query};
use crate::query_handler::QueryHandler;
use async_trait::async_trait;
use bon::Builder;
use outbox_domain::company::{Company, CompanyEvent, CompanyRepository};
use outbox_domain::error::{DomainError, DomainResult};
use outbox_domain::persist::{NewOutboxRecord, OutboxStore, TransactionManager, run_in_transaction};
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

#[derive(Builder)]
pub struct CompanyService<M, R, S> {
    tx_manager: Arc<M>,
    companies: Arc<R>,
    outbox: Arc<S>,
}

fn command_span(name: &'static str, ctx: &AppContext) -> tracing::Span {
    info_span!(
        "command",
        name,
        correlation_id = ctx.correlation_id.as_deref(),
        actor_id = ctx.actor_id.as_deref(),
    )
}

impl<M, R, S> CompanyService<M, R, S>
where
    M: TransactionManager,
    R: CompanyRepository<Tx = M::Tx>,
    S: OutboxStore<Tx = M::Tx>,
{
    pub async fn create_company(
        &self,
        ctx: &AppContext,
        cmd: CreateCompany,
    ) -> Result<CompanyDto, AppError> {
        <Self as CommandHandler<CreateCompany>>::handle(self, ctx, cmd).await
    }

    pub async fn update_company(
        &self,
        ctx: &AppContext,
        cmd: UpdateCompany,
    ) -> Result<CompanyDto, AppError> {
        <Self as CommandHandler<UpdateCompany>>::handle(self, ctx, cmd).await
    }

    pub async fn delete_company(&self, ctx: &AppContext, cmd: DeleteCompany) -> Result<(), AppError> {
        <Self as CommandHandler<DeleteCompany>>::handle(self, ctx, cmd).await
    }

    pub async fn get_company(&self, ctx: &AppContext, q: GetCompany) -> Result<CompanyDto, AppError> {
        <Self as QueryHandler<GetCompany>>::handle(self, ctx, q).await
    }
}

#[async_trait]
impl<M, R, S> CommandHandler<CreateCompany> for CompanyService<M, R, S>
where
    M: TransactionManager,
    R: CompanyRepository<Tx = M::Tx>,
    S: OutboxStore<Tx = M::Tx>,
{
    async fn handle(&self, ctx: &AppContext, cmd: CreateCompany) -> Result<CompanyDto, AppError> {
        let span = command_span(CreateCompany::NAME, ctx);
        async move {
            let company = cmd.into_company(Uuid::new_v4())?;
            let record = NewOutboxRecord::from_event(&CompanyEvent::created(&company))?;

            let companies = self.companies.as_ref();
            let outbox = self.outbox.as_ref();
            let company = run_in_transaction(self.tx_manager.as_ref(), |mut tx| async move {
                let outcome: DomainResult<i64> = async {
                    companies.create(&mut tx, &company).await?;
                    outbox.append(&mut tx, record).await
                }
                .await;
                (tx, outcome.map(|outbox_id| (company, outbox_id)))
            })
            .await
            .map(|(company, outbox_id)| {
                debug!(outbox_id, "company created");
                company
            })?;

            Ok::<_, AppError>(CompanyDto::from(&company))
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<M, R, S> CommandHandler<UpdateCompany> for CompanyService<M, R, S>
where
    M: TransactionManager,
    R: CompanyRepository<Tx = M::Tx>,
    S: OutboxStore<Tx = M::Tx>,
{
    async fn handle(&self, ctx: &AppContext, cmd: UpdateCompany) -> Result<CompanyDto, AppError> {
        let span = command_span(UpdateCompany::NAME, ctx);
        async move {
            let patch = cmd.to_patch()?;
            let id = cmd.id;
            let record = NewOutboxRecord::from_event(&CompanyEvent::updated(id, &patch))?;

            let companies = self.companies.as_ref();
            let outbox = self.outbox.as_ref();
            let company = run_in_transaction(self.tx_manager.as_ref(), |mut tx| async move {
                let outcome: DomainResult<Company> = async {
                    let mut company = companies
                        .find_by_id_for_update(&mut tx, id)
                        .await?
                        .ok_or_else(|| DomainError::not_found(format!("company {id}")))?;
                    company.apply(&patch);
                    companies.update(&mut tx, &company).await?;
                    outbox.append(&mut tx, record).await?;
                    Ok::<_, DomainError>(company)
                }
                .await;
                (tx, outcome)
            })
            .await?;

            Ok::<_, AppError>(CompanyDto::from(&company))
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<M, R, S> CommandHandler<DeleteCompany> for CompanyService<M, R, S>
where
    M: TransactionManager,
    R: CompanyRepository<Tx = M::Tx>,
    S: OutboxStore<Tx = M::Tx>,
{
    async fn handle(&self, ctx: &AppContext, cmd: DeleteCompany) -> Result<(), AppError> {
        let span = command_span(DeleteCompany::NAME, ctx);
        async move {
            let id = cmd.id;
            let record = NewOutboxRecord::from_event(&CompanyEvent::deleted(id))?;

            let companies = self.companies.as_ref();
            let outbox = self.outbox.as_ref();
            run_in_transaction(self.tx_manager.as_ref(), |mut tx| async move {
                let outcome: DomainResult<()> = async {
                    companies.delete(&mut tx, id).await?;
                    outbox.append(&mut tx, record).await?;
                    Ok::<_, DomainError>(())
                }
                .await;
                (tx, outcome)
            })
            .await?;

            Ok::<_, AppError>(())
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<M, R, S> QueryHandler<GetCompany> for CompanyService<M, R, S>
where
    M: TransactionManager,
    R: CompanyRepository<Tx = M::Tx>,
    S: OutboxStore<Tx = M::Tx>,
{
    async fn handle(&self, ctx: &AppContext, q: GetCompany) -> Result<CompanyDto, AppError> {
        let span = command_span(GetCompany::NAME, ctx);
        async move {
            let id = q.id;
            let companies = self.companies.as_ref();
            let company = run_in_transaction(self.tx_manager.as_ref(), |mut tx| async move {
                let outcome = companies.find_by_id(&mut tx, id).await;
                (tx, outcome)
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("company {id}")))?;

            Ok::<_, AppError>(CompanyDto::from(&company))
        }
        .instrument(span)
        .await
    }
}
