// src/core/collectors/geo.rs

use crate::core::collectors::http::HttpClient;
use crate::core::error::CollectorError;
use crate::core::models::IpInfo;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct GeoResponse {
    city: Option<String>,
    /// ipapi.co sends both the ISO code and the full name.
    country: Option<String>,
    country_name: Option<String>,
    org: Option<String>,
    asn: Option<String>,
    /// ipapi-style services answer 200 with `{"error": true}` when rate limited.
    #[serde(default)]
    error: bool,
}

/// Geolocates `ip` through `<endpoint>/<ip>/json/`.
pub async fn locate_ip(http: &HttpClient, endpoint: &str, ip: &str) -> Result<IpInfo, CollectorError> {
    let url = format!("{}/{}/json/", endpoint.trim_end_matches('/'), ip);
    let response: GeoResponse = http.get_json(&url, &[]).await?;
    if response.error {
        return Err(CollectorError::Parse("geolocation service reported an error".to_string()));
    }
    info!(ip, country = ?response.country_name, "IP geolocation finished.");
    Ok(IpInfo {
        ip: ip.to_string(),
        city: response.city,
        country: response.country_name.or(response.country),
        org: response.org,
        asn: response.asn,
    })
}
