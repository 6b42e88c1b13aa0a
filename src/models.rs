pub mod analytics;
pub mod auth;
pub mod customer;
pub mod import;
pub mod interaction;
pub mod lead;
pub mod notification;
pub mod rbac;
pub mod revenue;
pub mod target;
