// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::{I18nStore, DEFAULT_LANG},
    db::{
        AnalyticsRepository, CustomerRepository, InteractionRepository, LeadRepository,
        NotificationRepository, RevenueRepository, TargetRepository, UserRepository,
    },
    services::{
        analytics_service::AnalyticsService,
        auth::AuthService,
        calendar_service::CalendarService,
        customer_service::CustomerService,
        import_service::ImportService,
        lead_service::LeadService,
        notification_service::{NotificationHub, NotificationService},
        revenue_service::RevenueService,
        target_service::TargetService,
        user_service::UserService,
    },
};

const MIN_JWT_SECRET_LEN: usize = 32;

// ---
// Configuração lida do ambiente (.env)
// ---

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub jwt_ttl_hours: i64,
    pub notification_channel_capacity: usize,
    /// Sem valor, qualquer origem é aceita
    pub cors_origin: Option<HeaderValue>,
    /// Idioma em que as notificações são gravadas
    pub default_locale: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!("JWT_SECRET precisa ter pelo menos {} caracteres", MIN_JWT_SECRET_LEN);
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let jwt_ttl_hours = parse_or(&lookup, "JWT_TTL_HOURS", 168)?;
        let notification_channel_capacity = parse_or(&lookup, "NOTIFICATION_CHANNEL_CAPACITY", 256)?;
        if notification_channel_capacity == 0 {
            bail!("NOTIFICATION_CHANNEL_CAPACITY deve ser maior que zero");
        }

        let cors_origin = match lookup("CORS_ORIGIN").filter(|origin| !origin.trim().is_empty()) {
            Some(origin) => Some(
                HeaderValue::from_str(origin.trim())
                    .with_context(|| format!("CORS_ORIGIN inválido: '{}'", origin))?,
            ),
            None => None,
        };
        let default_locale = lookup("DEFAULT_LOCALE")
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            database_max_connections,
            jwt_ttl_hours,
            notification_channel_capacity,
            cors_origin,
            default_locale,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválido: '{}'", key, raw)),
        None => Ok(default),
    }
}

// ---
// Estado compartilhado da aplicação
// ---

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub lead_service: LeadService,
    pub customer_service: CustomerService,
    pub calendar_service: CalendarService,
    pub target_service: TargetService,
    pub revenue_service: RevenueService,
    pub analytics_service: AnalyticsService,
    pub notification_service: NotificationService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(config, db_pool)
    }

    /// Monta o gráfico de dependências sobre um pool já criado
    pub fn from_pool(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;
        if !i18n_store.supports(&config.default_locale) {
            bail!("DEFAULT_LOCALE '{}' não tem catálogo de tradução", config.default_locale);
        }

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let interaction_repo = InteractionRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let target_repo = TargetRepository::new(db_pool.clone());
        let revenue_repo = RevenueRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let analytics_repo = AnalyticsRepository::new(db_pool.clone());

        // --- Serviços ---
        let hub = NotificationHub::new(config.notification_channel_capacity);
        let notification_service = NotificationService::new(
            notification_repo,
            hub,
            i18n_store.clone(),
            config.default_locale.clone(),
        );

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone(), notification_service.clone());
        let lead_service = LeadService::new(
            lead_repo.clone(),
            customer_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
            db_pool.clone(),
        );
        let customer_service = CustomerService::new(
            customer_repo.clone(),
            lead_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );
        let calendar_service = CalendarService::new(interaction_repo, lead_repo);
        let target_service = TargetService::new(
            target_repo,
            user_repo.clone(),
            notification_service.clone(),
            db_pool.clone(),
        );
        let revenue_service = RevenueService::new(
            revenue_repo,
            customer_repo,
            user_repo.clone(),
            db_pool.clone(),
        );
        let analytics_service = AnalyticsService::new(analytics_repo);
        let import_service = ImportService::new(
            lead_service.clone(),
            revenue_service.clone(),
            user_repo,
            notification_service.clone(),
            i18n_store.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            user_service,
            lead_service,
            customer_service,
            calendar_service,
            target_service,
            revenue_service,
            analytics_service,
            notification_service,
            import_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/crm"),
            ("JWT_SECRET", SECRET),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.jwt_ttl_hours, 168);
        assert_eq!(config.notification_channel_capacity, 256);
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.default_locale, "en");
    }

    #[test]
    fn required_vars_fail_startup() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", SECRET)])).is_err());
        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).is_err());
    }

    #[test]
    fn short_secret_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "curto"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn numeric_vars_are_parsed_and_validated() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", SECRET),
            ("DATABASE_MAX_CONNECTIONS", " 12 "),
            ("JWT_TTL_HOURS", "24"),
            ("DEFAULT_LOCALE", "PT"),
            ("CORS_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();
        assert_eq!(config.cors_origin, Some(HeaderValue::from_static("http://localhost:5173")));
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.default_locale, "pt");

        let bad = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_HOURS", "uma semana"),
        ]));
        assert!(bad.is_err());

        let zero = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", SECRET),
            ("NOTIFICATION_CHANNEL_CAPACITY", "0"),
        ]));
        assert!(zero.is_err());
    }
}
