// src/db/analytics_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{error::AppError, scope::Scope},
    models::analytics::{LeadCounts, PeriodQuery, RevenueTotals, StageSummary, UserRevenue},
};

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Funil agrupado por etapa (etapas sem leads não aparecem aqui)
    pub async fn pipeline(&self, scope: &Scope) -> Result<Vec<StageSummary>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT stage, COUNT(*) AS count, COALESCE(SUM(value), 0) AS total_value FROM leads WHERE TRUE",
        );
        scope.push_condition(&mut qb, &["assigned_to", "created_by"]);
        qb.push(" GROUP BY stage");

        let rows = qb.build_query_as::<StageSummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    // 2. Contagem de leads criados no período
    pub async fn lead_counts(&self, scope: &Scope, period: &PeriodQuery) -> Result<LeadCounts, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COUNT(*) AS total_leads,
                COUNT(*) FILTER (WHERE stage = 'closed_won') AS won,
                COUNT(*) FILTER (WHERE stage = 'closed_lost') AS lost
            FROM leads WHERE TRUE
            "#,
        );
        scope.push_condition(&mut qb, &["assigned_to", "created_by"]);
        push_period(&mut qb, period, "created_at::date");

        let counts = qb.build_query_as::<LeadCounts>().fetch_one(&self.pool).await?;
        Ok(counts)
    }

    // 3. Receita e pedidos no período
    pub async fn revenue_totals(&self, scope: &Scope, period: &PeriodQuery) -> Result<RevenueTotals, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COALESCE(SUM(revenue), 0) AS revenue_total,
                COALESCE(SUM(orders), 0)::BIGINT AS orders_total
            FROM daily_revenue WHERE TRUE
            "#,
        );
        scope.push_condition(&mut qb, &["user_id"]);
        push_period(&mut qb, period, "entry_date");

        let totals = qb.build_query_as::<RevenueTotals>().fetch_one(&self.pool).await?;
        Ok(totals)
    }

    // 4. Ranking de vendedores
    pub async fn revenue_by_user(&self, scope: &Scope, period: &PeriodQuery) -> Result<Vec<UserRevenue>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                u.id AS user_id,
                u.full_name,
                COALESCE(SUM(r.revenue), 0) AS revenue,
                COALESCE(SUM(r.orders), 0)::BIGINT AS orders
            FROM daily_revenue r
            JOIN users u ON u.id = r.user_id
            WHERE TRUE
            "#,
        );
        scope.push_condition(&mut qb, &["r.user_id"]);
        push_period(&mut qb, period, "r.entry_date");
        qb.push(" GROUP BY u.id, u.full_name ORDER BY revenue DESC");

        let rows = qb.build_query_as::<UserRevenue>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

fn push_period(qb: &mut QueryBuilder<'_, Postgres>, period: &PeriodQuery, column: &str) {
    if let Some(from) = period.from {
        qb.push(" AND ").push(column).push(" >= ").push_bind(from);
    }
    if let Some(to) = period.to {
        qb.push(" AND ").push(column).push(" <= ").push_bind(to);
    }
}
