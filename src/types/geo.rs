//! Geographic point type

use serde::{Deserialize, Serialize};

/// A resolved geographic location (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Parse `"lat,lng"` as typed on the command line.
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lng) = text.split_once(',')?;
        let point = Self {
            lat: lat.trim().parse().ok()?,
            lng: lng.trim().parse().ok()?,
        };
        point.is_valid().then_some(point)
    }
}
