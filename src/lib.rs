pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    analytics_service::AnalyticsService,
    auth_service::AuthService,
    device_trust_service::{DeviceTrustService, PgSessionStore},
    geo_service::IpApiGeoResolver,
};
use crate::utils::credentials::PlaintextVerifier;
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub device_trust_service: DeviceTrustService,
    pub auth_service: AuthService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        let store = Arc::new(PgSessionStore::new(pool.clone()));
        let geo = Arc::new(IpApiGeoResolver::new(
            http_client,
            config.geo_lookup_url.clone(),
        ));
        let device_trust_service = DeviceTrustService::new(store, geo);

        let verifier = Arc::new(PlaintextVerifier::new(
            config.admin_username.clone(),
            config.admin_password.clone(),
        ));
        let auth_service = AuthService::new(
            device_trust_service.clone(),
            verifier,
            config.owner_name.clone(),
            crate::config::QUIZ_QUESTIONS,
            config.trust_threshold,
            config.jwt_secret.clone(),
        );

        let analytics_service = AnalyticsService::new(pool.clone());

        Self {
            pool,
            device_trust_service,
            auth_service,
            analytics_service,
        }
    }
}
