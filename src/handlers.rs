pub mod analytics;
pub mod auth;
pub mod calendar;
pub mod customers;
pub mod imports;
pub mod leads;
pub mod notifications;
pub mod rbac;
pub mod revenue;
pub mod targets;
pub mod users;
