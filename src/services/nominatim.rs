//! Nominatim geocoding client

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::GeoPoint;

/// Nominatim API response
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    /// 0.0-1.0, only present in some deployments
    #[serde(default)]
    pub importance: Option<f64>,
    /// 4 (country) .. 30 (house)
    #[serde(default)]
    pub place_rank: Option<u32>,
}

/// Best match for a free-form query.
#[derive(Debug, Clone)]
pub struct NominatimMatch {
    pub location: GeoPoint,
    pub display_name: String,
    pub importance: Option<f64>,
    pub place_rank: Option<u32>,
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    country_codes: Option<String>,
    client: reqwest::Client,
}

impl NominatimClient {
    /// Create a new client
    pub fn new(base_url: &str, country_codes: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("route-planner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            country_codes,
            client,
        })
    }

    fn search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        if let Some(codes) = &self.country_codes {
            url.push_str("&countrycodes=");
            url.push_str(&urlencoding::encode(codes));
        }
        url
    }

    /// Geocode a free-form address line
    pub async fn geocode(&self, query: &str) -> Result<Option<NominatimMatch>> {
        let response = self
            .client
            .get(self.search_url(query))
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Geocoding request failed with status {}", response.status());
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        let Some(result) = results.into_iter().next() else {
            return Ok(None);
        };

        let lat: f64 = result.lat.parse().context("Invalid latitude")?;
        let lng: f64 = result.lon.parse().context("Invalid longitude")?;

        Ok(Some(NominatimMatch {
            location: GeoPoint { lat, lng },
            display_name: result.display_name,
            importance: result.importance,
            place_rank: result.place_rank,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query_and_countries() {
        let client = NominatimClient::new("https://nominatim.example.org/", Some("es,pt".into())).unwrap();
        let url = client.search_url("Calle Mayor 1, Madrid");

        assert_eq!(
            url,
            "https://nominatim.example.org/search?q=Calle%20Mayor%201%2C%20Madrid&format=json&limit=1&countrycodes=es%2Cpt"
        );
    }

    #[test]
    fn result_parses_optional_fields() {
        let json = r#"[{"lat":"40.4","lon":"-3.7","display_name":"Madrid","importance":0.9}]"#;
        let parsed: Vec<NominatimResult> = serde_json::from_str(json).unwrap();

        assert_eq!(parsed[0].importance, Some(0.9));
        assert_eq!(parsed[0].place_rank, None);
    }

    // Note: hits the public Nominatim API
    #[tokio::test]
    #[ignore]
    async fn test_geocode_madrid() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org", None).unwrap();

        let result = client.geocode("Puerta del Sol, Madrid").await.unwrap();
        let found = result.unwrap();

        assert!((found.location.lat - 40.41).abs() < 0.1);
        assert!((found.location.lng + 3.70).abs() < 0.1);
    }
}
