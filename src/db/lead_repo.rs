// src/db/lead_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    models::lead::{CreateLeadPayload, Lead, LeadFilter, LeadSource, LeadStage, UpdateLeadPayload},
};

// Colunas que definem o "dono" de um lead para o escopo
const LEAD_OWNERS: &[&str] = &["assigned_to", "created_by"];

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_lead<'e, E>(
        &self,
        executor: E,
        created_by: Uuid,
        payload: &CreateLeadPayload,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                name, company, email, phone, value, stage, source,
                assigned_to, created_by, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.company)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.value)
        .bind(payload.stage.unwrap_or(LeadStage::Prospecting))
        .bind(payload.source.unwrap_or(LeadSource::Other))
        .bind(payload.assigned_to)
        .bind(created_by)
        .bind(&payload.notes)
        .fetch_one(executor)
        .await?;

        Ok(lead)
    }

    /// Lista os leads visíveis, do mais novo para o mais antigo
    pub async fn list_leads(&self, scope: &Scope, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE TRUE");
        scope.push_condition(&mut qb, LEAD_OWNERS);

        if let Some(stage) = filter.stage {
            qb.push(" AND stage = ").push_bind(stage);
        }
        if let Some(assigned_to) = filter.assigned_to {
            qb.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR company ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY created_at DESC");

        let leads = qb.build_query_as::<Lead>().fetch_all(&self.pool).await?;
        Ok(leads)
    }

    /// Busca um lead respeitando o escopo. Fora do escopo = não encontrado.
    pub async fn find_visible(&self, id: Uuid, scope: &Scope) -> Result<Option<Lead>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE id = ");
        qb.push_bind(id);
        scope.push_condition(&mut qb, LEAD_OWNERS);

        let lead = qb.build_query_as::<Lead>().fetch_optional(&self.pool).await?;
        Ok(lead)
    }

    // Trava a linha até o fim da transação (conversão, mudança de etapa)
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    pub async fn update_lead<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateLeadPayload,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                name = COALESCE($2, name),
                company = COALESCE($3, company),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                value = COALESCE($6, value),
                source = COALESCE($7, source),
                notes = COALESCE($8, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.company)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.value)
        .bind(payload.source)
        .bind(&payload.notes)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound)?;

        Ok(lead)
    }

    pub async fn update_stage<'e, E>(&self, executor: E, id: Uuid, stage: LeadStage) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET stage = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(stage)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound)?;

        Ok(lead)
    }

    pub async fn update_assignee<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET assigned_to = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(assigned_to)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound)?;

        Ok(lead)
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn has_customer<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE lead_id = $1)")
                .bind(lead_id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }
}
