pub mod analytics_service;
pub mod auth;
pub mod calendar_service;
pub mod customer_service;
pub mod import_service;
pub mod lead_service;
pub mod notification_service;
pub mod revenue_service;
pub mod target_service;
pub mod user_service;
