// src/models/lead.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_stage do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl LeadStage {
    /// Ordem do funil (usada para preencher o gráfico do pipeline)
    pub const ALL: [LeadStage; 6] = [
        LeadStage::Prospecting,
        LeadStage::Qualification,
        LeadStage::Proposal,
        LeadStage::Negotiation,
        LeadStage::ClosedWon,
        LeadStage::ClosedLost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStage::Prospecting => "prospecting",
            LeadStage::Qualification => "qualification",
            LeadStage::Proposal => "proposal",
            LeadStage::Negotiation => "negotiation",
            LeadStage::ClosedWon => "closed_won",
            LeadStage::ClosedLost => "closed_lost",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, LeadStage::ClosedWon | LeadStage::ClosedLost)
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStage {
    type Err = ();

    // Aceita "Closed Won", "closed-won", "CLOSED_WON"... (planilhas variam muito)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        LeadStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    Referral,
    ColdCall,
    SocialMedia,
    Event,
    Other,
}

impl FromStr for LeadSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "website" => Ok(LeadSource::Website),
            "referral" => Ok(LeadSource::Referral),
            "cold_call" => Ok(LeadSource::ColdCall),
            "social_media" => Ok(LeadSource::SocialMedia),
            "event" => Ok(LeadSource::Event),
            "other" => Ok(LeadSource::Other),
            _ => Err(()),
        }
    }
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,

    #[schema(example = "Padaria Central")]
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(value_type = f64, example = 15000.0)]
    pub value: Decimal,

    pub stage: LeadStage,
    pub source: LeadSource,

    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Validação Customizada
// ---
/// Maior valor que cabe numa coluna NUMERIC(14, 2)
pub const MAX_MONEY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

pub fn validate_money(val: &Decimal) -> Result<(), ValidationError> {
    let message = if val.is_sign_negative() && !val.is_zero() {
        "not_negative"
    } else if *val > MAX_MONEY {
        "too_large"
    } else {
        return Ok(());
    };
    let mut err = ValidationError::new("range");
    err.message = Some(message.into());
    Err(err)
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "Padaria Central")]
    pub name: String,

    #[validate(length(max = 200, message = "too_long"))]
    pub company: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[validate(length(max = 40, message = "too_long"))]
    pub phone: Option<String>,

    #[validate(custom(function = "validate_money"))]
    #[serde(default)] // Se o JSON não tiver esse campo, assume 0
    #[schema(value_type = f64)]
    pub value: Decimal,

    pub stage: Option<LeadStage>,
    pub source: Option<LeadSource>,

    pub assigned_to: Option<Uuid>,

    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,
}

// Atualização parcial: só altera o que vier preenchido
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "too_long"))]
    pub company: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[validate(length(max = 40, message = "too_long"))]
    pub phone: Option<String>,

    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<f64>)]
    pub value: Option<Decimal>,

    pub source: Option<LeadSource>,

    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStagePayload {
    pub stage: LeadStage,
}

// `assignedTo: null` remove o responsável
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadPayload {
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadFilter {
    pub stage: Option<LeadStage>,
    pub assigned_to: Option<Uuid>,
    /// Busca por nome, empresa ou e-mail
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_parses_spreadsheet_spellings() {
        assert_eq!("Closed Won".parse::<LeadStage>(), Ok(LeadStage::ClosedWon));
        assert_eq!("closed-lost".parse::<LeadStage>(), Ok(LeadStage::ClosedLost));
        assert_eq!(" PROPOSAL ".parse::<LeadStage>(), Ok(LeadStage::Proposal));
        assert_eq!("won".parse::<LeadStage>(), Err(()));
    }

    #[test]
    fn stage_rejects_unknown_json_values() {
        let ok: Result<ChangeStagePayload, _> = serde_json::from_str(r#"{"stage":"negotiation"}"#);
        assert_eq!(ok.unwrap().stage, LeadStage::Negotiation);
        let bad: Result<ChangeStagePayload, _> = serde_json::from_str(r#"{"stage":"lost"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn only_two_stages_are_closed() {
        let closed: Vec<_> = LeadStage::ALL.into_iter().filter(|s| s.is_closed()).collect();
        assert_eq!(closed, vec![LeadStage::ClosedWon, LeadStage::ClosedLost]);
    }

    #[test]
    fn create_payload_rejects_negative_value_and_bad_email() {
        let payload = CreateLeadPayload {
            name: "Loja".into(),
            company: None,
            email: Some("not-an-email".into()),
            phone: None,
            value: Decimal::new(-100, 0),
            stage: None,
            source: None,
            assigned_to: None,
            notes: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("value"));
    }

    #[test]
    fn money_fits_numeric_14_2() {
        assert_eq!(MAX_MONEY.to_string(), "999999999999.99");
        assert!(validate_money(&MAX_MONEY).is_ok());
        assert!(validate_money(&Decimal::ZERO).is_ok());

        let too_large = validate_money(&Decimal::new(10_000_000_000_000, 0)).unwrap_err();
        assert_eq!(too_large.message.as_deref(), Some("too_large"));
        let negative = validate_money(&Decimal::new(-1, 2)).unwrap_err();
        assert_eq!(negative.message.as_deref(), Some("not_negative"));
    }

    #[test]
    fn create_payload_requires_a_name() {
        let payload: CreateLeadPayload = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("name"));
        assert_eq!(payload.value, Decimal::ZERO);
    }

    #[test]
    fn update_payload_validates_only_present_fields() {
        assert!(UpdateLeadPayload::default().validate().is_ok());
        let bad = UpdateLeadPayload {
            value: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
