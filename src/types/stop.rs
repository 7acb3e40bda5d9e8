//! Stop types

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// A place to visit, as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// Display name (falls back to the address)
    pub label: String,
    pub address: String,
    /// Filled in by geocoding; required before scheduling
    pub location: Option<GeoPoint>,
    /// Whether the geocoder considered the match exact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_exact: Option<bool>,
    pub dwell_minutes: u32,
    /// Earliest service start
    pub window_open: Option<NaiveTime>,
    /// Latest departure
    pub window_close: Option<NaiveTime>,
}

impl Stop {
    pub fn new(address: impl Into<String>, dwell_minutes: u32) -> Self {
        let address = address.into();
        Self {
            label: address.clone(),
            address,
            location: None,
            geocode_exact: None,
            dwell_minutes,
            window_open: None,
            window_close: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_window(mut self, open: Option<NaiveTime>, close: Option<NaiveTime>) -> Self {
        self.window_open = open;
        self.window_close = close;
        self
    }

    pub fn has_window(&self) -> bool {
        self.window_open.is_some() || self.window_close.is_some()
    }

    /// Human readable precision tag for itinerary output.
    pub fn precision_label(&self) -> &'static str {
        match self.geocode_exact {
            Some(true) => "exact",
            Some(false) => "approx.",
            None => "",
        }
    }
}
