//! Geocoding abstraction layer
//!
//! Planning needs every stop resolved to coordinates first. This module
//! provides:
//! - `MockGeocoder` for tests and offline use (deterministic, no network)
//! - `RateLimitedNominatimGeocoder` for real addresses (minimum interval
//!   between requests plus a circuit breaker)
//!
//! The backend is chosen by `GEOCODER_BACKEND` ("mock" or "nominatim").

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{GeocoderBackend, GeocoderConfig};
use crate::services::nominatim::{NominatimClient, NominatimMatch};
use crate::types::{GeoPoint, Stop};

/// Confidence from which a match counts as exact
pub const EXACT_CONFIDENCE: f64 = 0.85;

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a free-form address line.
    /// Returns None if the address cannot be found.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodingResult>>;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

/// Result of geocoding operation
#[derive(Debug, Clone)]
pub struct GeocodingResult {
    pub location: GeoPoint,
    /// Confidence score 0.0-1.0
    pub confidence: f64,
    /// Display name returned by geocoder
    pub display_name: String,
}

impl GeocodingResult {
    pub fn is_exact(&self) -> bool {
        self.confidence >= EXACT_CONFIDENCE
    }
}

/// Outcome of resolving a batch of stops
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeSummary {
    /// Stops that got a location in this run
    pub resolved: usize,
    /// Of those, how many were approximate
    pub approximate: usize,
    /// Stops that already had a location
    pub skipped: usize,
    /// Indices of stops still without a location
    pub unresolved: Vec<usize>,
}

/// Resolve every stop that lacks a location, one request at a time.
///
/// Failures are logged and leave the stop unresolved; planning will then
/// refuse the route and name the stop.
pub async fn geocode_stops(geocoder: &dyn Geocoder, stops: &mut [Stop]) -> GeocodeSummary {
    let mut summary = GeocodeSummary::default();

    for (index, stop) in stops.iter_mut().enumerate() {
        if stop.location.is_some() {
            summary.skipped += 1;
            continue;
        }

        match geocoder.geocode(&stop.address).await {
            Ok(Some(found)) => {
                debug!("Geocoded '{}' -> {:?} ({:.2})", stop.address, found.location, found.confidence);
                stop.location = Some(found.location);
                stop.geocode_exact = Some(found.is_exact());
                summary.resolved += 1;
                if !found.is_exact() {
                    summary.approximate += 1;
                }
            }
            Ok(None) => {
                warn!("No geocoding match for '{}'", stop.address);
                summary.unresolved.push(index);
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", stop.address, e);
                summary.unresolved.push(index);
            }
        }
    }

    info!(
        "Geocoding via {}: {} resolved ({} approximate), {} already located, {} unresolved",
        geocoder.name(),
        summary.resolved,
        summary.approximate,
        summary.skipped,
        summary.unresolved.len()
    );

    summary
}

// ==========================================================================
// MockGeocoder Implementation
// ==========================================================================

/// Mock geocoder for testing - returns deterministic fake coordinates
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    /// Generate deterministic coordinates from address hash.
    /// Coordinates fall inside a city-sized box so routes stay drivable.
    fn hash_to_location(query: &str) -> GeoPoint {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        query.trim().to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        const LAT_MIN: f64 = 40.30;
        const LAT_MAX: f64 = 40.55;
        const LNG_MIN: f64 = -3.85;
        const LNG_MAX: f64 = -3.55;

        // Use different parts of the hash for lat and lng
        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        GeoPoint {
            lat: LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            lng: LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        }
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodingResult>> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(GeocodingResult {
            location: Self::hash_to_location(query),
            confidence: 0.95,
            display_name: query.trim().to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// RateLimiter Implementation
// ==========================================================================

/// Rate limiter that enforces minimum interval between calls
pub struct RateLimiter {
    last_call: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    /// Wait until it's safe to make another call
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ==========================================================================
// CircuitBreaker Implementation
// ==========================================================================

/// Circuit breaker to prevent hammering a failing service
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    threshold: u32,
    last_failure: parking_lot::Mutex<Option<Instant>>,
    recovery_time: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            threshold,
            last_failure: parking_lot::Mutex::new(None),
            recovery_time,
        }
    }

    /// Check if circuit is open (blocking calls)
    pub fn is_open(&self) -> bool {
        if self.failure_count.load(Ordering::Relaxed) < self.threshold {
            return false;
        }
        match *self.last_failure.lock() {
            // Recovery time passed: allow a retry (half-open)
            Some(last) if last.elapsed() >= self.recovery_time => false,
            _ => true,
        }
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        *self.last_failure.lock() = Some(Instant::now());
    }

    /// Record a success (resets failure count)
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }
}

// ==========================================================================
// RateLimitedNominatimGeocoder Implementation
// ==========================================================================

/// Confidence for a Nominatim match.
///
/// Place rank 26+ is street level or finer; importance is the fallback when
/// no rank is reported.
fn nominatim_confidence(found: &NominatimMatch) -> f64 {
    match (found.place_rank, found.importance) {
        (Some(rank), _) => (rank as f64 / 30.0).min(1.0),
        (None, Some(importance)) => importance.clamp(0.0, 1.0),
        (None, None) => 0.5,
    }
}

/// Rate-limited Nominatim geocoder with circuit breaker protection
pub struct RateLimitedNominatimGeocoder {
    client: NominatimClient,
    rate_limiter: RateLimiter,
    pub(crate) circuit_breaker: CircuitBreaker,
}

impl RateLimitedNominatimGeocoder {
    pub fn with_config(config: &GeocoderConfig) -> Result<Self> {
        Ok(Self {
            client: NominatimClient::new(&config.nominatim_url, config.country_codes.clone())?,
            rate_limiter: RateLimiter::new(config.rate_limit_interval),
            circuit_breaker: CircuitBreaker::new(
                config.circuit_breaker_threshold,
                config.circuit_breaker_recovery,
            ),
        })
    }
}

#[async_trait]
impl Geocoder for RateLimitedNominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodingResult>> {
        if self.circuit_breaker.is_open() {
            warn!("Circuit breaker is open, rejecting geocoding request");
            anyhow::bail!("Geocoding service temporarily unavailable (circuit breaker open)");
        }

        self.rate_limiter.wait().await;

        match self.client.geocode(query).await {
            Ok(Some(found)) => {
                self.circuit_breaker.record_success();
                Ok(Some(GeocodingResult {
                    location: found.location,
                    confidence: nominatim_confidence(&found),
                    display_name: found.display_name,
                }))
            }
            Ok(None) => {
                // No result found is not a failure
                self.circuit_breaker.record_success();
                Ok(None)
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

// ==========================================================================
// Factory function
// ==========================================================================

/// Create the geocoder selected in configuration
pub fn create_geocoder(config: &GeocoderConfig) -> Result<Box<dyn Geocoder>> {
    match config.backend {
        GeocoderBackend::Mock => {
            info!("Using MockGeocoder");
            Ok(Box::new(MockGeocoder::new()))
        }
        GeocoderBackend::Nominatim => {
            info!("Using RateLimitedNominatimGeocoder ({})", config.nominatim_url);
            Ok(Box::new(RateLimitedNominatimGeocoder::with_config(config)?))
        }
    }
}
