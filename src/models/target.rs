// src/models/target.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::lead::validate_money;

// Meta de um usuário para um período (receita, pedidos, lojistas)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: Uuid,
    pub user_id: Uuid,

    pub period_start: NaiveDate,
    pub period_end: NaiveDate,

    #[schema(value_type = f64, example = 50000.0)]
    pub revenue_target: Decimal,
    pub orders_target: i32,
    pub merchants_target: i32,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

fn validate_period(payload: &CreateTargetPayload) -> Result<(), ValidationError> {
    if payload.period_end < payload.period_start {
        let mut err = ValidationError::new("period");
        err.message = Some("invalid_period".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_period", skip_on_field_errors = false))]
pub struct CreateTargetPayload {
    pub user_id: Uuid,

    pub period_start: NaiveDate,
    pub period_end: NaiveDate,

    #[validate(custom(function = "validate_money"))]
    #[serde(default)]
    #[schema(value_type = f64)]
    pub revenue_target: Decimal,

    #[validate(range(min = 0, message = "not_negative"))]
    #[serde(default)]
    pub orders_target: i32,

    #[validate(range(min = 0, message = "not_negative"))]
    #[serde(default)]
    pub merchants_target: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TargetFilter {
    pub user_id: Option<Uuid>,
}

// Realizado no período, agregado a partir da receita diária
#[derive(Debug, Clone, Default, FromRow)]
pub struct TargetActuals {
    pub revenue: Decimal,
    pub orders: i64,
    pub merchants: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetProgress {
    pub target: Target,

    #[schema(value_type = f64)]
    pub actual_revenue: Decimal,
    pub actual_orders: i64,
    pub actual_merchants: i64,

    /// `null` quando a meta da métrica é zero
    #[schema(value_type = Option<f64>)]
    pub revenue_pct: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub orders_pct: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub merchants_pct: Option<Decimal>,
}

impl TargetProgress {
    pub fn compute(target: Target, actuals: TargetActuals) -> Self {
        Self {
            revenue_pct: percentage(actuals.revenue, target.revenue_target),
            orders_pct: percentage(
                Decimal::from(actuals.orders),
                Decimal::from(target.orders_target),
            ),
            merchants_pct: percentage(
                Decimal::from(actuals.merchants),
                Decimal::from(target.merchants_target),
            ),
            actual_revenue: actuals.revenue,
            actual_orders: actuals.orders,
            actual_merchants: actuals.merchants,
            target,
        }
    }
}

/// Percentual atingido com duas casas. Meta zero não tem percentual.
pub fn percentage(actual: Decimal, target: Decimal) -> Option<Decimal> {
    if target.is_zero() {
        return None;
    }
    let pct = actual * Decimal::ONE_HUNDRED / target;
    Some(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(revenue: i64, orders: i32, merchants: i32) -> Target {
        Target {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            revenue_target: Decimal::from(revenue),
            orders_target: orders,
            merchants_target: merchants,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(Decimal::from(1), Decimal::from(3)), Some(Decimal::new(3333, 2)));
        assert_eq!(percentage(Decimal::from(150), Decimal::from(100)), Some(Decimal::from(150)));
    }

    #[test]
    fn zero_target_has_no_percentage() {
        assert_eq!(percentage(Decimal::from(10), Decimal::ZERO), None);
    }

    #[test]
    fn progress_combines_actuals() {
        let actuals = TargetActuals {
            revenue: Decimal::from(2500),
            orders: 5,
            merchants: 0,
        };
        let progress = TargetProgress::compute(target(10000, 20, 0), actuals);
        assert_eq!(progress.revenue_pct, Some(Decimal::from(25)));
        assert_eq!(progress.orders_pct, Some(Decimal::from(25)));
        assert_eq!(progress.merchants_pct, None);
    }

    #[test]
    fn payload_rejects_inverted_period() {
        let payload: CreateTargetPayload = serde_json::from_value(serde_json::json!({
            "userId": Uuid::new_v4(),
            "periodStart": "2024-02-01",
            "periodEnd": "2024-01-01",
            "revenueTarget": 1000
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn payload_rejects_negative_counts() {
        let payload: CreateTargetPayload = serde_json::from_value(serde_json::json!({
            "userId": Uuid::new_v4(),
            "periodStart": "2024-01-01",
            "periodEnd": "2024-01-31",
            "ordersTarget": -1
        }))
        .unwrap();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("orders_target"));
    }
}
