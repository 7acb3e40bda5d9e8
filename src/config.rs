//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{self, Context, Result};
use chrono::NaiveTime;

use crate::defaults::*;
use crate::types::time::parse_time_of_day;

/// Which geocoder resolves addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocoderBackend {
    Mock,
    Nominatim,
}

impl FromStr for GeocoderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "nominatim" => Ok(Self::Nominatim),
            other => anyhow::bail!("Unknown geocoder backend '{}' (expected mock or nominatim)", other),
        }
    }
}

/// Geocoding settings
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub backend: GeocoderBackend,
    pub nominatim_url: String,
    /// Comma separated ISO codes passed to Nominatim
    pub country_codes: Option<String>,
    /// Minimum interval between requests
    pub rate_limit_interval: Duration,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_recovery: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub average_speed_kmh: f64,
    pub default_dwell_minutes: u32,
    pub start_time: NaiveTime,
    /// Where named routes are stored
    pub routes_dir: PathBuf,
    pub geocoder: GeocoderConfig,
}

/// Read `name` and parse it, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: '{}'", name, raw)),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let average_speed_kmh: f64 = env_or("PLANNER_SPEED_KMH", DEFAULT_SPEED_KMH)?;
        if !(average_speed_kmh.is_finite() && average_speed_kmh > 0.0) {
            anyhow::bail!("PLANNER_SPEED_KMH must be positive (got {})", average_speed_kmh);
        }

        let default_dwell_minutes = env_or("PLANNER_DEFAULT_DWELL_MINUTES", DEFAULT_DWELL_MINUTES)?;

        let start_time = match std::env::var("PLANNER_START_TIME") {
            Ok(raw) if !raw.trim().is_empty() => parse_time_of_day(&raw)
                .with_context(|| format!("Invalid value for PLANNER_START_TIME: '{}' (expected HH:MM)", raw))?,
            _ => default_start_time(),
        };

        let routes_dir = std::env::var("PLANNER_ROUTES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ROUTES_DIR));

        let geocoder = GeocoderConfig {
            backend: env_or("GEOCODER_BACKEND", GeocoderBackend::Mock)?,
            nominatim_url: std::env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string()),
            country_codes: std::env::var("NOMINATIM_COUNTRY_CODES")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            rate_limit_interval: Duration::from_millis(env_or(
                "NOMINATIM_RATE_LIMIT_MS",
                DEFAULT_RATE_LIMIT_MS,
            )?),
            circuit_breaker_threshold: env_or(
                "NOMINATIM_CB_THRESHOLD",
                DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            )?,
            circuit_breaker_recovery: Duration::from_secs(env_or(
                "NOMINATIM_CB_RECOVERY_SECS",
                DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS,
            )?),
        };

        if geocoder.backend == GeocoderBackend::Nominatim
            && geocoder.nominatim_url == DEFAULT_NOMINATIM_URL
            && geocoder.rate_limit_interval < Duration::from_secs(1)
        {
            tracing::warn!("⚠ Public Nominatim allows one request per second; raise NOMINATIM_RATE_LIMIT_MS");
        }

        Ok(Self {
            average_speed_kmh,
            default_dwell_minutes,
            start_time,
            routes_dir,
            geocoder,
        })
    }
}
