pub mod analytics_service;
pub mod auth_service;
pub mod device_trust_service;
pub mod geo_service;
