use super::PgTx;
use async_trait::async_trait;
use outbox_domain::company::{
    Company, CompanyDescription, CompanyName, CompanyRepository, CompanyType, EmployeesCount,
};
use outbox_domain::entity::Entity;
use outbox_domain::error::{DomainError, DomainResult as Result};
use outbox_domain::value_object::ValueObject;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct PgCompanyRepository;

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    description: String,
    employees_count: i32,
    registered: bool,
    #[sqlx(rename = "type")]
    company_type: i16,
}

impl TryFrom<CompanyRow> for Company {
    type Error = DomainError;

    fn try_from(row: CompanyRow) -> Result<Self> {
        let mut company = Company::new(
            row.id,
            CompanyName::parse(row.name)?,
            CompanyDescription::parse(row.description)?,
            EmployeesCount::parse(row.employees_count)?,
            CompanyType::from_code(row.company_type)?,
        );
        company.set_registered(row.registered);
        Ok(company)
    }
}

fn name_conflict(company: &Company) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |err| match DomainError::from(err) {
        DomainError::Conflict { .. } => {
            DomainError::conflict(format!("company name {} already exists", company.name()))
        }
        other => other,
    }
}

fn not_found(id: Uuid) -> DomainError {
    DomainError::not_found(format!("{} {id}", Company::TYPE))
}

const SELECT_COMPANY: &str = r"
    SELECT id, name, description, employees_count, registered, type
    FROM companies
    WHERE id = $1
";

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    type Tx = PgTx;

    async fn create(&self, tx: &mut PgTx, company: &Company) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO companies (id, name, description, employees_count, registered, type)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(company.id())
        .bind(company.name().as_str())
        .bind(company.description().as_str())
        .bind(company.employees_count().value())
        .bind(company.is_registered())
        .bind(company.company_type().code())
        .execute(&mut **tx)
        .await
        .map_err(name_conflict(company))?;

        Ok(())
    }

    async fn update(&self, tx: &mut PgTx, company: &Company) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE companies
            SET name = $2, description = $3, employees_count = $4, registered = $5, type = $6
            WHERE id = $1
            ",
        )
        .bind(company.id())
        .bind(company.name().as_str())
        .bind(company.description().as_str())
        .bind(company.employees_count().value())
        .bind(company.is_registered())
        .bind(company.company_type().code())
        .execute(&mut **tx)
        .await
        .map_err(name_conflict(company))?;

        if result.rows_affected() == 0 {
            return Err(not_found(*company.id()));
        }
        Ok(())
    }

    async fn delete(&self, tx: &mut PgTx, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_by_id(&self, tx: &mut PgTx, id: Uuid) -> Result<Option<Company>> {
        let row: Option<CompanyRow> = sqlx::query_as(SELECT_COMPANY)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(Company::try_from).transpose()
    }

    async fn find_by_id_for_update(&self, tx: &mut PgTx, id: Uuid) -> Result<Option<Company>> {
        let sql = format!("{SELECT_COMPANY} FOR UPDATE");
        let row: Option<CompanyRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(Company::try_from).transpose()
    }
}
