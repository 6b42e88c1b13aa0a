// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Cliente pós-conversão. `lead_id` aponta para o lead de origem, quando houver.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "Padaria Central")]
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub lead_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub name: String,

    #[validate(length(max = 200, message = "too_long"))]
    pub company: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[validate(length(max = 40, message = "too_long"))]
    pub phone: Option<String>,

    pub lead_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "too_long"))]
    pub company: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[validate(length(max = 40, message = "too_long"))]
    pub phone: Option<String>,

    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    pub search: Option<String>,
}
