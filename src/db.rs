pub mod user_repo;
pub use user_repo::UserRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod interaction_repo;
pub use interaction_repo::InteractionRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod target_repo;
pub use target_repo::TargetRepository;
pub mod revenue_repo;
pub use revenue_repo::RevenueRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod analytics_repo;
pub use analytics_repo::AnalyticsRepository;

use crate::common::error::AppError;

/// Converte violação de chave única em `AppError::UniqueConstraintViolation`
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what.to_string());
        }
    }
    e.into()
}
