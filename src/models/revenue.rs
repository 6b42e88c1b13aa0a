// src/models/revenue.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::lead::validate_money;

// Lançamento diário de receita + pedidos de um lojista
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub user_id: Uuid,
    pub customer_id: Option<Uuid>,

    #[schema(example = "Padaria Central")]
    pub merchant_name: String,

    #[schema(value_type = f64, example = 1250.5)]
    pub revenue: Decimal,

    /// Sempre >= 1
    pub orders: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRevenuePayload {
    pub entry_date: NaiveDate,

    /// Só gerentes e admins podem lançar em nome de outro usuário
    pub user_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "required"))]
    pub merchant_name: String,

    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = f64)]
    pub revenue: Decimal,

    #[validate(range(min = 1, message = "min_orders"))]
    pub orders: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RevenueFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(orders: i32, revenue: Decimal) -> CreateRevenuePayload {
        CreateRevenuePayload {
            entry_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            user_id: None,
            customer_id: None,
            merchant_name: "Loja".into(),
            revenue,
            orders,
        }
    }

    #[test]
    fn orders_must_be_at_least_one() {
        assert!(payload(1, Decimal::from(10)).validate().is_ok());
        let errors = payload(0, Decimal::from(10)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("orders"));
    }

    #[test]
    fn revenue_cannot_be_negative() {
        assert!(payload(3, Decimal::new(-5, 1)).validate().is_err());
        assert!(payload(3, Decimal::ZERO).validate().is_ok());
    }

    #[test]
    fn revenue_must_fit_the_column() {
        let errors = payload(3, Decimal::new(1_000_000_000_000, 0)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("revenue"));
    }
}
