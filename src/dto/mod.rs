pub mod analytics_dto;
pub mod auth_dto;
pub mod session_dto;
