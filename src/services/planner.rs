//! Route planning entry point.
//!
//! `plan_route` validates the stops, picks an order (greedy construction,
//! optionally refined by 2-opt, or the order as typed) and runs the forward
//! simulation over it. It holds no state between calls.

use thiserror::Error;
use tracing::debug;

use crate::services::geo::{effective_speed, DistanceMatrix};
use crate::services::greedy::greedy_order;
use crate::services::simulator::{
    compute_sequential_schedule, ComputedStopSchedule, ScheduleInput, ScheduleStop,
};
use crate::services::two_opt::two_opt_improvement;
use crate::types::time::MINUTES_PER_DAY;
use crate::types::{EntryKind, GeoPoint, PlanOptions, RoutePlan, RouteTotals, ScheduleEntry, Stop};

/// Label of the closing leg entry on circular routes
pub const RETURN_LABEL: &str = "Start";

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("stop #{} ({label}) has no location; geocode it before planning", .index + 1)]
    UnresolvedLocation { index: usize, label: String },

    #[error("stop #{} ({label}) has invalid coordinates {lat},{lng}", .index + 1)]
    InvalidCoordinates {
        index: usize,
        label: String,
        lat: f64,
        lng: f64,
    },

    #[error("start point has invalid coordinates {lat},{lng}")]
    InvalidStart { lat: f64, lng: f64 },
}

/// Clamp a start time into the day.
pub fn clamp_start_minutes(minutes: i32) -> i32 {
    minutes.clamp(0, MINUTES_PER_DAY - 1)
}

fn resolve_locations(stops: &[Stop]) -> Result<Vec<GeoPoint>, PlanError> {
    stops
        .iter()
        .enumerate()
        .map(|(index, stop)| match stop.location {
            None => Err(PlanError::UnresolvedLocation {
                index,
                label: stop.label.clone(),
            }),
            Some(p) if !p.is_valid() => Err(PlanError::InvalidCoordinates {
                index,
                label: stop.label.clone(),
                lat: p.lat,
                lng: p.lng,
            }),
            Some(p) => Ok(p),
        })
        .collect()
}

fn to_entry(sequence_index: usize, kind: EntryKind, stop: Stop, computed: &ComputedStopSchedule) -> ScheduleEntry {
    ScheduleEntry {
        sequence_index,
        kind,
        stop,
        distance_km_from_previous: computed.distance_from_previous_km,
        travel_minutes_from_previous: computed.travel_minutes.round() as i32,
        arrival_minutes_of_day: computed.arrival.round() as i32,
        wait_minutes: computed.wait_minutes.round() as i32,
        departure_minutes_of_day: computed.departure.round() as i32,
        departure_clamped: computed.departure_clamped,
    }
}

/// Plan a route over `stops`, leaving `start` at `start_time_minutes`.
///
/// Every stop must already carry a location. An empty stop list is not an
/// error and yields an empty plan.
pub fn plan_route(
    stops: &[Stop],
    start: GeoPoint,
    start_time_minutes: i32,
    average_speed_kmh: f64,
    options: &PlanOptions,
) -> Result<RoutePlan, PlanError> {
    if !start.is_valid() {
        return Err(PlanError::InvalidStart {
            lat: start.lat,
            lng: start.lng,
        });
    }
    let locations = resolve_locations(stops)?;

    let start_time_minutes = clamp_start_minutes(start_time_minutes);
    if stops.is_empty() {
        debug!("Nothing to schedule");
        return Ok(RoutePlan::empty(start, start_time_minutes, *options));
    }

    let speed_kmh = effective_speed(average_speed_kmh);
    let matrix = DistanceMatrix::new(&start, &locations);
    let schedule_stops: Vec<ScheduleStop> = stops.iter().map(ScheduleStop::from_stop).collect();
    let start_minutes = start_time_minutes as f64;

    let mut order: Vec<usize> = if options.keep_input_order {
        (0..stops.len()).collect()
    } else {
        greedy_order(&schedule_stops, &matrix, start_minutes, speed_kmh)
    };

    if options.apply_distance_local_search {
        order = two_opt_improvement(order, &matrix, options.circular_return_to_start);
    }

    let input = ScheduleInput {
        start_minutes,
        speed_kmh,
        enforce_windows: options.enforce_windows,
        return_to_start: options.circular_return_to_start,
    };
    let schedule = compute_sequential_schedule(&input, &schedule_stops, &order, &matrix);

    let mut entries = Vec::with_capacity(order.len() + 1);
    for (sequence_index, computed) in schedule.stops.iter().enumerate() {
        let Some(stop_idx) = computed.stop_idx else {
            continue;
        };
        entries.push(to_entry(sequence_index, EntryKind::Visit, stops[stop_idx].clone(), computed));
    }
    if let Some(back) = &schedule.return_leg {
        let home = Stop::new(RETURN_LABEL, 0).with_location(start);
        entries.push(to_entry(entries.len(), EntryKind::ReturnToStart, home, back));
    }

    let totals = RouteTotals {
        stop_count: stops.len(),
        total_distance_km: schedule.total_distance_km,
        total_duration_minutes: schedule.total_duration_minutes.round() as i32,
    };

    debug!(
        "Planned {} stops: {:.1} km, {} min (local search: {}, as typed: {})",
        totals.stop_count,
        totals.total_distance_km,
        totals.total_duration_minutes,
        options.apply_distance_local_search,
        options.keep_input_order,
    );

    Ok(RoutePlan {
        start,
        start_time_minutes,
        options: *options,
        order: entries,
        totals,
    })
}
