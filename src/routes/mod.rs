pub mod analytics;
pub mod auth;
pub mod health;
pub mod session;
