//! Route types

use serde::{Deserialize, Serialize};

use super::{GeoPoint, Stop};

/// Variations of a planning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOptions {
    /// Clamp departures to the window close time
    pub enforce_windows: bool,
    /// Append a final leg back to the start point
    pub circular_return_to_start: bool,
    /// Run the distance-only 2-opt pass before simulating
    pub apply_distance_local_search: bool,
    /// Skip ordering and schedule the stops as typed
    #[serde(default)]
    pub keep_input_order: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            enforce_windows: true,
            circular_return_to_start: false,
            apply_distance_local_search: false,
            keep_input_order: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Visit,
    ReturnToStart,
}

/// One line of the itinerary. Minutes are counted from the midnight of the
/// start day and rounded to whole minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub sequence_index: usize,
    pub kind: EntryKind,
    pub stop: Stop,
    pub distance_km_from_previous: f64,
    pub travel_minutes_from_previous: i32,
    pub arrival_minutes_of_day: i32,
    pub wait_minutes: i32,
    pub departure_minutes_of_day: i32,
    /// Departure was cut back to the window close
    pub departure_clamped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTotals {
    /// Visit stops only; the closing leg is not counted
    pub stop_count: usize,
    pub total_distance_km: f64,
    pub total_duration_minutes: i32,
}

/// Result of a planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub start: GeoPoint,
    pub start_time_minutes: i32,
    pub options: PlanOptions,
    pub order: Vec<ScheduleEntry>,
    pub totals: RouteTotals,
}

impl RoutePlan {
    /// Nothing to schedule
    pub fn empty(start: GeoPoint, start_time_minutes: i32, options: PlanOptions) -> Self {
        Self {
            start,
            start_time_minutes,
            options,
            order: vec![],
            totals: RouteTotals::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Visit entries in route order, without the closing leg.
    pub fn visits(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.order.iter().filter(|e| e.kind == EntryKind::Visit)
    }
}
