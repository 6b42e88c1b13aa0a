// src/db/target_repo.rs

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, scope::Scope},
    models::target::{CreateTargetPayload, Target, TargetActuals},
};

#[derive(Clone)]
pub struct TargetRepository {
    pool: PgPool,
}

impl TargetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_target(&self, created_by: Uuid, payload: &CreateTargetPayload) -> Result<Target, AppError> {
        let target = sqlx::query_as::<_, Target>(
            r#"
            INSERT INTO targets (
                user_id, period_start, period_end,
                revenue_target, orders_target, merchants_target, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.user_id)
        .bind(payload.period_start)
        .bind(payload.period_end)
        .bind(payload.revenue_target)
        .bind(payload.orders_target)
        .bind(payload.merchants_target)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(target)
    }

    pub async fn list_targets(&self, scope: &Scope, user_id: Option<Uuid>) -> Result<Vec<Target>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM targets WHERE TRUE");
        scope.push_condition(&mut qb, &["user_id"]);
        if let Some(user_id) = user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        qb.push(" ORDER BY period_start DESC");

        let targets = qb.build_query_as::<Target>().fetch_all(&self.pool).await?;
        Ok(targets)
    }

    pub async fn find_visible(&self, id: Uuid, scope: &Scope) -> Result<Option<Target>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM targets WHERE id = ");
        qb.push_bind(id);
        scope.push_condition(&mut qb, &["user_id"]);

        let target = qb.build_query_as::<Target>().fetch_optional(&self.pool).await?;
        Ok(target)
    }

    pub async fn delete_target(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM targets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Realizado do usuário no período (inclusivo), a partir da receita diária
    pub async fn actuals(&self, user_id: Uuid, start: NaiveDate, end: NaiveDate) -> Result<TargetActuals, AppError> {
        let actuals = sqlx::query_as::<_, TargetActuals>(
            r#"
            SELECT
                COALESCE(SUM(revenue), 0) AS revenue,
                COALESCE(SUM(orders), 0)::BIGINT AS orders,
                COUNT(DISTINCT lower(merchant_name)) AS merchants
            FROM daily_revenue
            WHERE user_id = $1
              AND entry_date BETWEEN $2 AND $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(actuals)
    }
}
