//! Reverse geocoding: coordinate to country name
//!
//! Uses the Nominatim reverse endpoint. Nominatim requires an identifying
//! User-Agent and rate-limits anonymous callers, so requests carry one and
//! time out quickly; any failure is reported and the cache records "Unknown".

use crate::error::GeocodeError;
use serde::Deserialize;
use std::time::Duration;

/// Country recorded for failed or empty lookups
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Anything that can turn a coordinate into a country name.
/// Called from worker threads.
pub trait Geocoder: Send + Sync {
    fn country(&self, lat: f64, lon: f64) -> Result<String, GeocodeError>;
}

// ============================================================================
// Nominatim
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    country: Option<String>,
}

impl ReverseResponse {
    fn country(self) -> String {
        self.address
            .and_then(|a| a.country)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }
}

pub struct NominatimGeocoder {
    agent: ureq::Agent,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn country(&self, lat: f64, lon: f64) -> Result<String, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .agent
            .get(&url)
            .query("format", "json")
            .query("lat", &lat.to_string())
            .query("lon", &lon.to_string())
            .call()?;

        let body: ReverseResponse = response
            .into_json()
            .map_err(|e| GeocodeError::Decode(e.to_string()))?;

        Ok(body.country())
    }
}

// ============================================================================
// Offline
// ============================================================================

/// Used with `--no-geocode`: every coordinate resolves to "Unknown"
/// without touching the network.
pub struct OfflineGeocoder;

impl Geocoder for OfflineGeocoder {
    fn country(&self, _lat: f64, _lon: f64) -> Result<String, GeocodeError> {
        Ok(UNKNOWN_COUNTRY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> String {
        serde_json::from_str::<ReverseResponse>(body).unwrap().country()
    }

    #[test]
    fn reads_country_from_address() {
        let body = r#"{"place_id":1,"address":{"city":"New York","country":"United States","country_code":"us"}}"#;
        assert_eq!(parse(body), "United States");
    }

    #[test]
    fn missing_address_is_unknown() {
        assert_eq!(parse(r#"{"error":"Unable to geocode"}"#), UNKNOWN_COUNTRY);
    }

    #[test]
    fn missing_or_blank_country_is_unknown() {
        assert_eq!(parse(r#"{"address":{"state":"Nowhere"}}"#), UNKNOWN_COUNTRY);
        assert_eq!(parse(r#"{"address":{"country":"  "}}"#), UNKNOWN_COUNTRY);
    }

    #[test]
    fn offline_geocoder_never_fails() {
        assert_eq!(OfflineGeocoder.country(1.0, 2.0).unwrap(), UNKNOWN_COUNTRY);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let g = NominatimGeocoder::new("https://example.org/", "test", Duration::from_secs(1));
        assert_eq!(g.base_url, "https://example.org");
    }
}
