// src/db/revenue_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    models::revenue::{CreateRevenuePayload, DailyRevenue, RevenueFilter},
};

#[derive(Clone)]
pub struct RevenueRepository {
    pool: PgPool,
}

impl RevenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `user_id` já resolvido pelo serviço (o payload pode vir sem ele)
    pub async fn create_entry(&self, user_id: Uuid, payload: &CreateRevenuePayload) -> Result<DailyRevenue, AppError> {
        let entry = sqlx::query_as::<_, DailyRevenue>(
            r#"
            INSERT INTO daily_revenue (entry_date, user_id, customer_id, merchant_name, revenue, orders)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(payload.entry_date)
        .bind(user_id)
        .bind(payload.customer_id)
        .bind(payload.merchant_name.trim())
        .bind(payload.revenue)
        .bind(payload.orders)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn list_entries(&self, scope: &Scope, filter: &RevenueFilter) -> Result<Vec<DailyRevenue>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM daily_revenue WHERE TRUE");
        scope.push_condition(&mut qb, &["user_id"]);

        if let Some(from) = filter.from {
            qb.push(" AND entry_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND entry_date <= ").push_bind(to);
        }
        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        qb.push(" ORDER BY entry_date DESC, created_at DESC");

        let entries = qb.build_query_as::<DailyRevenue>().fetch_all(&self.pool).await?;
        Ok(entries)
    }

    pub async fn find_visible(&self, id: Uuid, scope: &Scope) -> Result<Option<DailyRevenue>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM daily_revenue WHERE id = ");
        qb.push_bind(id);
        scope.push_condition(&mut qb, &["user_id"]);

        let entry = qb.build_query_as::<DailyRevenue>().fetch_optional(&self.pool).await?;
        Ok(entry)
    }

    pub async fn delete_entry(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM daily_revenue WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
