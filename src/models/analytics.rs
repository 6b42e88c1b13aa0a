// src/models/analytics.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::lead::LeadStage;

// 1. Funil: uma linha por etapa
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: LeadStage,
    pub count: i64,
    #[schema(value_type = f64)]
    pub total_value: Decimal,
}

// 2. Cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_leads: i64,
    pub won: i64,
    pub lost: i64,
    /// won / (won + lost), em percentual
    #[schema(value_type = f64)]
    pub conversion_rate: Decimal,
    #[schema(value_type = f64)]
    pub revenue_total: Decimal,
    pub orders_total: i64,
}

// Contagens cruas vindas do banco
#[derive(Debug, Default, FromRow)]
pub struct LeadCounts {
    pub total_leads: i64,
    pub won: i64,
    pub lost: i64,
}

#[derive(Debug, Default, FromRow)]
pub struct RevenueTotals {
    pub revenue_total: Decimal,
    pub orders_total: i64,
}

// 3. Receita por vendedor
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRevenue {
    pub user_id: Uuid,
    pub full_name: String,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Zero quando ainda não há leads fechados
pub fn conversion_rate(won: i64, lost: i64) -> Decimal {
    let closed = won + lost;
    if closed == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(won) * Decimal::ONE_HUNDRED / Decimal::from(closed)).round_dp(2)
}

/// Garante as seis etapas, na ordem do funil, mesmo sem leads
pub fn fill_pipeline(rows: Vec<StageSummary>) -> Vec<StageSummary> {
    LeadStage::ALL
        .into_iter()
        .map(|stage| {
            rows.iter()
                .find(|row| row.stage == stage)
                .cloned()
                .unwrap_or(StageSummary {
                    stage,
                    count: 0,
                    total_value: Decimal::ZERO,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_rate_without_closed_leads_is_zero() {
        assert_eq!(conversion_rate(0, 0), Decimal::ZERO);
    }

    #[test]
    fn conversion_rate_is_a_percentage() {
        assert_eq!(conversion_rate(1, 3), Decimal::from(25));
        assert_eq!(conversion_rate(2, 1), Decimal::new(6667, 2));
    }

    #[test]
    fn pipeline_is_zero_filled_in_funnel_order() {
        let rows = vec![StageSummary {
            stage: LeadStage::Proposal,
            count: 2,
            total_value: Decimal::from(300),
        }];
        let filled = fill_pipeline(rows);
        assert_eq!(filled.len(), 6);
        assert_eq!(filled[0].stage, LeadStage::Prospecting);
        assert_eq!(filled[2].count, 2);
        assert_eq!(filled[5].total_value, Decimal::ZERO);
    }
}
