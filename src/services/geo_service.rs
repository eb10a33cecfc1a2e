use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Sentinel stored when the lookup fails or returns nothing usable.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Best-effort IP geolocation. One outbound call per login attempt, no
/// retries; callers fall back to [`UNKNOWN_LOCATION`] on `Err`.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, ip: Option<&str>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GeoLookupResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default, rename = "regionName")]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Clone)]
pub struct IpApiGeoResolver {
    client: Client,
    base_url: String,
}

impl IpApiGeoResolver {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl GeoResolver for IpApiGeoResolver {
    async fn resolve(&self, ip: Option<&str>) -> Result<String> {
        let url = match ip {
            Some(ip) if !ip.trim().is_empty() => {
                format!("{}/{}", self.base_url.trim_end_matches('/'), ip.trim())
            }
            // Without a caller address the endpoint resolves the requester.
            _ => format!("{}/", self.base_url.trim_end_matches('/')),
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<GeoLookupResponse>()
            .await?;

        let parts: Vec<String> = [resp.city, resp.region, resp.country]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();

        if parts.is_empty() {
            return Err(Error::Internal("Geolocation response was empty".into()));
        }
        Ok(parts.join(", "))
    }
}
