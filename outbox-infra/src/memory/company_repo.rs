use super::MemoryTx;
use async_trait::async_trait;
use outbox_domain::company::{Company, CompanyRepository};
use outbox_domain::error::DomainResult as Result;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryCompanyRepository;

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    type Tx = MemoryTx;

    async fn create(&self, tx: &mut MemoryTx, company: &Company) -> Result<()> {
        tx.insert_company(company)
    }

    async fn update(&self, tx: &mut MemoryTx, company: &Company) -> Result<()> {
        tx.update_company(company)
    }

    async fn delete(&self, tx: &mut MemoryTx, id: Uuid) -> Result<()> {
        tx.delete_company(id)
    }

    async fn find_by_id(&self, tx: &mut MemoryTx, id: Uuid) -> Result<Option<Company>> {
        tx.find_company(id, false)
    }

    async fn find_by_id_for_update(&self, tx: &mut MemoryTx, id: Uuid) -> Result<Option<Company>> {
        tx.find_company(id, true)
    }
}
