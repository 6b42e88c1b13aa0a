// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    db::map_unique_violation,
    models::customer::{CreateCustomerPayload, Customer, UpdateCustomerPayload},
};

const CUSTOMER_OWNERS: &[&str] = &["assigned_to", "created_by"];

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        created_by: Uuid,
        payload: &CreateCustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, company, email, phone, lead_id, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.company)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.lead_id)
        .bind(payload.assigned_to)
        .bind(created_by)
        .fetch_one(executor)
        .await
        // customers.lead_id é UNIQUE: um lead só vira um cliente
        .map_err(|e| map_unique_violation(e, "customers.lead_id"))
    }

    pub async fn list_customers(&self, scope: &Scope, search: Option<&str>) -> Result<Vec<Customer>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM customers WHERE TRUE");
        scope.push_condition(&mut qb, CUSTOMER_OWNERS);

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR company ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY name ASC");

        let customers = qb.build_query_as::<Customer>().fetch_all(&self.pool).await?;
        Ok(customers)
    }

    pub async fn find_visible(&self, id: Uuid, scope: &Scope) -> Result<Option<Customer>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM customers WHERE id = ");
        qb.push_bind(id);
        scope.push_condition(&mut qb, CUSTOMER_OWNERS);

        let customer = qb.build_query_as::<Customer>().fetch_optional(&self.pool).await?;
        Ok(customer)
    }

    pub async fn update_customer(&self, id: Uuid, payload: &UpdateCustomerPayload) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                company = COALESCE($3, company),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                assigned_to = COALESCE($6, assigned_to),
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
        .bind(payload.assigned_to)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

        Ok(customer)
    }

    pub async fn has_revenue(&self, id: Uuid) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM daily_revenue WHERE customer_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
