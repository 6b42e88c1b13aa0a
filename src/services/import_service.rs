// src/services/import_service.rs

use std::str::FromStr;

use chrono::NaiveDate;
use csv::{Position, ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::{
        error::{validation_messages, AppError},
        i18n::I18nStore,
    },
    db::UserRepository,
    middleware::i18n::Locale,
    models::{
        auth::User,
        import::ImportReport,
        lead::{CreateLeadPayload, LeadSource, LeadStage},
        notification::NotificationKind,
        revenue::CreateRevenuePayload,
    },
    services::{
        lead_service::LeadService, notification_service::NotificationService,
        revenue_service::RevenueService,
    },
};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const LEAD_REQUIRED: &[&str] = &["name"];
const REVENUE_REQUIRED: &[&str] = &["date", "merchant_name", "revenue", "orders"];

// ---
// Linhas do CSV (tudo texto; a conversão acontece depois, com erro por campo)
// ---

#[derive(Debug, Default, Deserialize)]
pub struct LeadCsvRow {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub value: Option<String>,
    pub stage: Option<String>,
    pub source: Option<String>,
    pub assigned_to_email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevenueCsvRow {
    pub date: Option<String>,
    pub merchant_name: Option<String>,
    pub revenue: Option<String>,
    pub orders: Option<String>,
    pub user_email: Option<String>,
}

/// Uma linha de dados com o número da linha no arquivo (cabeçalho = 1)
#[derive(Debug)]
pub struct CsvRow<T> {
    pub line: usize,
    pub parsed: Result<T, String>,
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

// O leitor pula linhas em branco sem avançar a posição do registro;
// conta as quebras de linha entre a posição e o primeiro caractere real.
fn record_line(data: &[u8], position: &Position) -> usize {
    let start = usize::try_from(position.byte()).unwrap_or(usize::MAX);
    let skipped = data
        .get(start..)
        .unwrap_or_default()
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .filter(|b| **b == b'\n')
        .count();
    position.line() as usize + skipped
}

/// Lê o arquivo inteiro. Erro no cabeçalho derruba a importação;
/// erro numa linha vira erro daquela linha.
pub fn read_rows<T: DeserializeOwned>(data: &[u8], required: &[&str]) -> Result<Vec<CsvRow<T>>, AppError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::InvalidCsv(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::InvalidCsv("empty header".into()));
    }
    if let Some(missing) = required.iter().find(|col| !headers.iter().any(|h| h == *col)) {
        return Err(AppError::InvalidCsv(format!("missing column '{}'", missing)));
    }
    let headers = StringRecord::from(headers);

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(record) => {
                // Linhas só com separadores (",,,") contam como vazias
                if record.iter().all(|field| field.is_empty()) {
                    continue;
                }
                CsvRow {
                    line: record.position().map_or(0, |p| record_line(data, p)),
                    parsed: record.deserialize::<T>(Some(&headers)).map_err(|e| e.to_string()),
                }
            }
            Err(e) => CsvRow {
                line: e.position().map_or(0, |p| p.line() as usize),
                parsed: Err(e.to_string()),
            },
        };
        rows.push(row);
    }
    Ok(rows)
}

// ---
// Conversão linha -> payload
// ---

type FieldErrors = Vec<(&'static str, ValidationError)>;

fn field_error(code: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(code.into());
    err
}

fn parse_field<T: FromStr>(
    value: Option<&str>,
    field: &'static str,
    code: &'static str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = value?;
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push((field, field_error(code)));
            None
        }
    }
}

// Junta os erros de conversão com os do `validate()` do payload
fn finish<P: Validate>(payload: P, parse_errors: FieldErrors) -> Result<P, ValidationErrors> {
    let mut errors = match payload.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    for (field, err) in parse_errors {
        errors.add(field, err);
    }
    if errors.is_empty() {
        Ok(payload)
    } else {
        Err(errors)
    }
}

/// Monta o payload de criação de lead. O e-mail do responsável é resolvido depois.
pub fn lead_payload(row: LeadCsvRow) -> Result<(CreateLeadPayload, Option<String>), ValidationErrors> {
    let mut parse_errors = FieldErrors::new();

    let value = parse_field::<Decimal>(row.value.as_deref(), "value", "invalid_number", &mut parse_errors);
    let stage = parse_field::<LeadStage>(row.stage.as_deref(), "stage", "invalid_stage", &mut parse_errors);
    let source = parse_field::<LeadSource>(row.source.as_deref(), "source", "invalid_source", &mut parse_errors);

    let payload = CreateLeadPayload {
        name: row.name.unwrap_or_default(),
        company: row.company,
        email: row.email,
        phone: row.phone,
        value: value.unwrap_or_default(),
        stage: Some(stage.unwrap_or(LeadStage::Prospecting)),
        source: Some(source.unwrap_or(LeadSource::Other)),
        assigned_to: None,
        notes: row.notes,
    };

    finish(payload, parse_errors).map(|payload| (payload, row.assigned_to_email))
}

/// Monta o lançamento de receita. Campos ausentes ou inválidos viram erro do campo.
pub fn revenue_payload(row: RevenueCsvRow) -> Result<(CreateRevenuePayload, Option<String>), ValidationErrors> {
    let mut parse_errors = FieldErrors::new();

    let mut required = |value: &Option<String>, field: &'static str| {
        if value.is_none() {
            parse_errors.push((field, field_error("required")));
        }
    };
    required(&row.date, "date");
    required(&row.revenue, "revenue");
    required(&row.orders, "orders");

    let entry_date = row.date.as_deref().and_then(|raw| {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                parse_errors.push(("date", field_error("invalid_date")));
                None
            }
        }
    });
    let revenue = parse_field::<Decimal>(row.revenue.as_deref(), "revenue", "invalid_number", &mut parse_errors);
    let orders = parse_field::<i32>(row.orders.as_deref(), "orders", "invalid_number", &mut parse_errors);

    // Valores provisórios só para o `validate()` rodar; a linha já tem erro registrado
    let payload = CreateRevenuePayload {
        entry_date: entry_date.unwrap_or_default(),
        user_id: None,
        customer_id: None,
        merchant_name: row.merchant_name.unwrap_or_default(),
        revenue: revenue.unwrap_or_default(),
        orders: orders.unwrap_or(1),
    };

    finish(payload, parse_errors).map(|payload| (payload, row.user_email))
}

/// Texto do erro de uma linha, no idioma de quem importou
pub fn row_message(err: AppError, lang: &str, store: &I18nStore) -> String {
    match err {
        AppError::ValidationError(errors) => validation_messages(&errors, lang, store)
            .into_iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_api_error(&Locale(lang.to_string()), store).error,
    }
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct ImportService {
    lead_service: LeadService,
    revenue_service: RevenueService,
    user_repo: UserRepository,
    notifications: NotificationService,
    i18n: I18nStore,
}

impl ImportService {
    pub fn new(
        lead_service: LeadService,
        revenue_service: RevenueService,
        user_repo: UserRepository,
        notifications: NotificationService,
        i18n: I18nStore,
    ) -> Self {
        Self {
            lead_service,
            revenue_service,
            user_repo,
            notifications,
            i18n,
        }
    }

    /// Cada linha é gravada de forma independente: uma linha ruim não desfaz as outras.
    pub async fn import_leads(&self, user: &User, data: &[u8], lang: &str) -> Result<ImportReport, AppError> {
        let rows = read_rows::<LeadCsvRow>(data, LEAD_REQUIRED)?;
        let mut report = ImportReport::default();

        for row in rows {
            let outcome = match row.parsed {
                Ok(csv_row) => self.import_lead(user, csv_row).await,
                Err(reason) => Err(AppError::InvalidCsv(reason)),
            };
            match outcome {
                Ok(()) => report.record_success(),
                Err(e) => report.record_failure(row.line, row_message(e, lang, &self.i18n)),
            }
        }

        self.finish_import(user, "leads", &report).await;
        Ok(report)
    }

    pub async fn import_revenue(&self, user: &User, data: &[u8], lang: &str) -> Result<ImportReport, AppError> {
        let rows = read_rows::<RevenueCsvRow>(data, REVENUE_REQUIRED)?;
        let mut report = ImportReport::default();

        for row in rows {
            let outcome = match row.parsed {
                Ok(csv_row) => self.import_revenue_row(user, csv_row).await,
                Err(reason) => Err(AppError::InvalidCsv(reason)),
            };
            match outcome {
                Ok(()) => report.record_success(),
                Err(e) => report.record_failure(row.line, row_message(e, lang, &self.i18n)),
            }
        }

        self.finish_import(user, "revenue", &report).await;
        Ok(report)
    }

    async fn import_lead(&self, user: &User, row: LeadCsvRow) -> Result<(), AppError> {
        let (mut payload, assignee_email) = lead_payload(row)?;
        if let Some(email) = assignee_email {
            payload.assigned_to = Some(self.resolve_user(&email).await?);
        }
        self.lead_service.create_lead(user, &payload).await?;
        Ok(())
    }

    async fn import_revenue_row(&self, user: &User, row: RevenueCsvRow) -> Result<(), AppError> {
        let (mut payload, user_email) = revenue_payload(row)?;
        if let Some(email) = user_email {
            payload.user_id = Some(self.resolve_user(&email).await?);
        }
        self.revenue_service.create_entry(user, &payload).await?;
        Ok(())
    }

    async fn resolve_user(&self, email: &str) -> Result<uuid::Uuid, AppError> {
        self.user_repo
            .find_active_by_email(email)
            .await?
            .map(|u| u.id)
            .ok_or(AppError::InvalidAssignee)
    }

    async fn finish_import(&self, user: &User, what: &str, report: &ImportReport) {
        tracing::info!(
            "📥 Importação de {} por {}: {} processadas, {} importadas, {} com erro",
            what,
            user.id,
            report.processed,
            report.imported,
            report.failed
        );

        let imported = report.imported.to_string();
        let processed = report.processed.to_string();
        let failed = report.failed.to_string();
        self.notifications
            .notify(
                user.id,
                NotificationKind::ImportFinished,
                "import_finished",
                &[
                    ("imported", imported.as_str()),
                    ("processed", processed.as_str()),
                    ("failed", failed.as_str()),
                ],
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_normalized_and_blank_lines_skipped() {
        let data = "\u{feff}Name , Company,Value\nLoja A,ACME,100\n\n,,\nLoja B,,\n";
        let rows = read_rows::<LeadCsvRow>(data.as_bytes(), LEAD_REQUIRED).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 5);

        let first = rows[0].parsed.as_ref().unwrap();
        assert_eq!(first.name.as_deref(), Some("Loja A"));
        assert_eq!(first.company.as_deref(), Some("ACME"));
        let second = rows[1].parsed.as_ref().unwrap();
        assert_eq!(second.company, None);
    }

    #[test]
    fn missing_required_column_rejects_the_file() {
        let data = "date,merchant_name,revenue\n2024-05-01,Loja,10\n";
        let err = read_rows::<RevenueCsvRow>(data.as_bytes(), REVENUE_REQUIRED).unwrap_err();
        assert!(matches!(err, AppError::InvalidCsv(reason) if reason.contains("orders")));
    }

    #[test]
    fn empty_file_is_invalid() {
        let err = read_rows::<LeadCsvRow>(b"", LEAD_REQUIRED).unwrap_err();
        assert!(matches!(err, AppError::InvalidCsv(_)));
    }

    #[test]
    fn lead_row_gets_defaults() {
        let row = LeadCsvRow {
            name: Some("Padaria".into()),
            ..Default::default()
        };
        let (payload, email) = lead_payload(row).unwrap();
        assert_eq!(payload.stage, Some(LeadStage::Prospecting));
        assert_eq!(payload.source, Some(LeadSource::Other));
        assert_eq!(payload.value, Decimal::ZERO);
        assert_eq!(email, None);
    }

    #[test]
    fn lead_row_collects_every_field_error() {
        let row = LeadCsvRow {
            name: None,
            value: Some("abc".into()),
            stage: Some("won".into()),
            email: Some("nope".into()),
            ..Default::default()
        };
        let errors = lead_payload(row).unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "value", "stage", "email"] {
            assert!(fields.contains_key(field), "faltou erro em {}", field);
        }
    }

    #[test]
    fn revenue_row_parses_numbers_and_date() {
        let row = RevenueCsvRow {
            date: Some("2024-05-02".into()),
            merchant_name: Some("Loja".into()),
            revenue: Some("1250.50".into()),
            orders: Some("3".into()),
            user_email: Some("ana@crm.com".into()),
        };
        let (payload, email) = revenue_payload(row).unwrap();
        assert_eq!(payload.entry_date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(payload.revenue, Decimal::new(125050, 2));
        assert_eq!(payload.orders, 3);
        assert_eq!(email.as_deref(), Some("ana@crm.com"));
    }

    #[test]
    fn revenue_row_rejects_zero_orders_and_bad_date() {
        let row = RevenueCsvRow {
            date: Some("02/05/2024".into()),
            merchant_name: Some("Loja".into()),
            revenue: Some("10".into()),
            orders: Some("0".into()),
            user_email: None,
        };
        let errors = revenue_payload(row).unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("orders"));
    }

    #[test]
    fn row_message_lists_translated_fields() {
        let store = I18nStore::load().unwrap();
        let errors = revenue_payload(RevenueCsvRow {
            merchant_name: Some("Loja".into()),
            revenue: Some("10".into()),
            orders: Some("2".into()),
            ..Default::default()
        })
        .unwrap_err();

        let message = row_message(AppError::ValidationError(errors), "en", &store);
        assert!(message.starts_with("date: "));
        assert!(!message.contains("validation."));

        let other = row_message(AppError::InvalidAssignee, "en", &store);
        assert!(!other.is_empty());
    }

    // Todas as linhas falham na validação, antes de qualquer query.
    // A notificação final falha no pool sem banco e fica só no log.
    fn service_without_database() -> ImportService {
        use crate::config::{AppState, Config};
        use sqlx::postgres::PgPoolOptions;
        use std::time::Duration;

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/crm_test".to_string()),
            "JWT_SECRET" => Some("test-secret-with-at-least-32-chars!!".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::from_pool(config, pool).unwrap().import_service
    }

    fn agent() -> User {
        User {
            id: uuid::Uuid::new_v4(),
            email: "ana@crm.com".into(),
            password_hash: String::new(),
            full_name: "Ana".into(),
            role: crate::models::auth::UserRole::Agent,
            team: None,
            is_active: true,
            email_verified: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn rejected_rows_are_counted_with_their_file_line() {
        let data = "name,company,value,stage
                    ,ACME,100,
                    Loja B,,,won
                    
                    Loja C,,10000000000000,
";

        let report = service_without_database()
            .import_leads(&agent(), data.as_bytes(), "en")
            .await
            .unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.failed, report.processed);
        assert_eq!(report.imported, 0);
        assert_eq!(report.processed, report.imported + report.failed);

        let rows: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3, 5]);
        assert!(report.errors[0].message.starts_with("name: "));
        assert!(report.errors[1].message.starts_with("stage: "));
        assert!(report.errors[2].message.starts_with("value: "));
        assert!(report.errors[2].message.contains("too large"));
    }

    #[test]
    fn lead_row_value_must_fit_the_column() {
        let row = LeadCsvRow {
            name: Some("Padaria".into()),
            value: Some("10000000000000".into()),
            ..Default::default()
        };
        let errors = lead_payload(row).unwrap_err();
        assert!(errors.field_errors().contains_key("value"));
    }
}
