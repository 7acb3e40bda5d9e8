//! Forward schedule simulation.
//!
//! Given a fixed stop order, the start point and the departure time, this
//! module walks the route sequentially and derives arrival, wait and
//! departure for each stop. It never reorders anything; ordering lives in
//! `greedy` and `two_opt`.
//!
//! Clock values are minutes since the midnight of the start day and are
//! carried at full precision from stop to stop. Rounding to whole minutes
//! happens only when the planner turns the result into `ScheduleEntry`s.

use crate::services::geo::DistanceMatrix;
use crate::types::{time::time_to_minutes, Stop};

/// Scheduling view of a stop, with windows as minutes of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleStop {
    pub dwell_minutes: f64,
    pub window_open: Option<f64>,
    pub window_close: Option<f64>,
}

impl ScheduleStop {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            dwell_minutes: stop.dwell_minutes as f64,
            window_open: stop.window_open.map(|t| time_to_minutes(t) as f64),
            window_close: stop.window_close.map(|t| time_to_minutes(t) as f64),
        }
    }
}

/// Parameters for a simulation run.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleInput {
    /// Departure from the start point
    pub start_minutes: f64,
    pub speed_kmh: f64,
    /// Clamp departures to the window close
    pub enforce_windows: bool,
    /// Add the leg back to the start point
    pub return_to_start: bool,
}

/// Computed timings for one leg of the route.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStopSchedule {
    /// Index into the stop slice; `None` for the return to start
    pub stop_idx: Option<usize>,
    pub distance_from_previous_km: f64,
    pub travel_minutes: f64,
    pub arrival: f64,
    pub wait_minutes: f64,
    pub departure: f64,
    pub departure_clamped: bool,
}

/// Result of the sequential schedule computation.
#[derive(Debug, Clone)]
pub struct ScheduleResult {
    /// Per-stop schedule, parallel to the order
    pub stops: Vec<ComputedStopSchedule>,
    /// Closing leg when `return_to_start` was requested
    pub return_leg: Option<ComputedStopSchedule>,
    /// Includes the closing leg
    pub total_distance_km: f64,
    /// From departure at the start to the final departure (or return)
    pub total_duration_minutes: f64,
}

/// Service start for someone ready at `ready`, and how long they waited.
pub fn service_start(ready: f64, window_open: Option<f64>) -> (f64, f64) {
    match window_open {
        Some(open) if ready < open => (open, open - ready),
        _ => (ready, 0.0),
    }
}

/// Compute a sequential schedule for `order` (indices into `stops`).
pub fn compute_sequential_schedule(
    input: &ScheduleInput,
    stops: &[ScheduleStop],
    order: &[usize],
    matrix: &DistanceMatrix,
) -> ScheduleResult {
    let mut result_stops = Vec::with_capacity(order.len());
    let mut clock = input.start_minutes;
    let mut total_distance_km = 0.0;
    let mut prev_node = DistanceMatrix::START;

    for &stop_idx in order {
        let stop = &stops[stop_idx];
        let node = DistanceMatrix::node(stop_idx);

        let distance = matrix.km(prev_node, node);
        let travel = matrix.minutes(prev_node, node, input.speed_kmh);

        let (arrival, wait) = service_start(clock + travel, stop.window_open);
        let mut departure = arrival + stop.dwell_minutes;

        // The stop is still visited; it just "leaves" at closing time.
        let mut clamped = false;
        if input.enforce_windows {
            if let Some(close) = stop.window_close {
                if departure > close {
                    departure = close;
                    clamped = true;
                }
            }
        }

        result_stops.push(ComputedStopSchedule {
            stop_idx: Some(stop_idx),
            distance_from_previous_km: distance,
            travel_minutes: travel,
            arrival,
            wait_minutes: wait,
            departure,
            departure_clamped: clamped,
        });

        total_distance_km += distance;
        clock = departure;
        prev_node = node;
    }

    let return_leg = if input.return_to_start && !order.is_empty() {
        let distance = matrix.km(prev_node, DistanceMatrix::START);
        let travel = matrix.minutes(prev_node, DistanceMatrix::START, input.speed_kmh);
        let arrival = clock + travel;

        total_distance_km += distance;
        clock = arrival;

        Some(ComputedStopSchedule {
            stop_idx: None,
            distance_from_previous_km: distance,
            travel_minutes: travel,
            arrival,
            wait_minutes: 0.0,
            departure: arrival,
            departure_clamped: false,
        })
    } else {
        None
    };

    // A clamp to a close time before the start would go negative.
    let total_duration_minutes = if order.is_empty() {
        0.0
    } else {
        (clock - input.start_minutes).max(0.0)
    };

    ScheduleResult {
        stops: result_stops,
        return_leg,
        total_distance_km,
        total_duration_minutes,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    const START: GeoPoint = GeoPoint { lat: 0.0, lng: 0.0 };

    /// Point `km` kilometres due north of START.
    fn north(km: f64) -> GeoPoint {
        GeoPoint::new((km / 6371.0).to_degrees(), 0.0)
    }

    fn input(start_minutes: f64, enforce_windows: bool) -> ScheduleInput {
        // 60 km/h: one kilometre per minute
        ScheduleInput {
            start_minutes,
            speed_kmh: 60.0,
            enforce_windows,
            return_to_start: false,
        }
    }

    fn plain(dwell: f64) -> ScheduleStop {
        ScheduleStop { dwell_minutes: dwell, window_open: None, window_close: None }
    }

    // -----------------------------------------------------------------------
    // Empty route
    // -----------------------------------------------------------------------
    #[test]
    fn empty_route_returns_zeros() {
        let matrix = DistanceMatrix::new(&START, &[]);
        let mut inp = input(480.0, true);
        inp.return_to_start = true;

        let result = compute_sequential_schedule(&inp, &[], &[], &matrix);

        assert!(result.stops.is_empty());
        assert!(result.return_leg.is_none());
        assert_eq!(result.total_distance_km, 0.0);
        assert_eq!(result.total_duration_minutes, 0.0);
    }

    // -----------------------------------------------------------------------
    // Early arrival waits for the window to open
    // -----------------------------------------------------------------------
    #[test]
    fn early_arrival_waits_for_open() {
        let matrix = DistanceMatrix::new(&START, &[north(10.0)]);
        let stops = [ScheduleStop { dwell_minutes: 0.0, window_open: Some(510.0), window_close: None }];

        let result = compute_sequential_schedule(&input(480.0, true), &stops, &[0], &matrix);
        let s = &result.stops[0];

        assert_eq!(s.arrival, 510.0); // 08:30, not 08:10
        assert!((s.wait_minutes - 20.0).abs() < 1e-6);
        assert_eq!(s.departure, 510.0);
        assert!((s.travel_minutes - 10.0).abs() < 1e-6);
    }

    // -----------------------------------------------------------------------
    // Window close: clamp only when enforced
    // -----------------------------------------------------------------------
    #[test]
    fn late_departure_is_clamped_when_enforced() {
        // Leave at 08:40, 10 min drive -> arrive 08:50, dwell 30 -> 09:20
        let matrix = DistanceMatrix::new(&START, &[north(10.0)]);
        let stops = [ScheduleStop { dwell_minutes: 30.0, window_open: None, window_close: Some(540.0) }];

        let result = compute_sequential_schedule(&input(520.0, true), &stops, &[0], &matrix);
        let s = &result.stops[0];

        assert!((s.arrival - 530.0).abs() < 1e-6);
        assert_eq!(s.departure, 540.0);
        assert!(s.departure_clamped);
    }

    #[test]
    fn late_departure_kept_when_not_enforced() {
        let matrix = DistanceMatrix::new(&START, &[north(10.0)]);
        let stops = [ScheduleStop { dwell_minutes: 30.0, window_open: None, window_close: Some(540.0) }];

        let result = compute_sequential_schedule(&input(520.0, false), &stops, &[0], &matrix);
        let s = &result.stops[0];

        assert!((s.departure - 560.0).abs() < 1e-6);
        assert!(!s.departure_clamped);
    }

    // -----------------------------------------------------------------------
    // No windows: no waiting, departure = arrival + dwell
    // -----------------------------------------------------------------------
    #[test]
    fn no_windows_never_wait() {
        let points = [north(5.0), north(12.0), north(20.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [plain(10.0), plain(0.0), plain(25.0)];

        let result = compute_sequential_schedule(&input(480.0, true), &stops, &[0, 1, 2], &matrix);

        for (s, stop) in result.stops.iter().zip(stops.iter()) {
            assert_eq!(s.wait_minutes, 0.0);
            assert_eq!(s.departure, s.arrival + stop.dwell_minutes);
        }
    }

    // -----------------------------------------------------------------------
    // Clock chains from one stop to the next
    // -----------------------------------------------------------------------
    #[test]
    fn two_stops_sequential_no_gaps() {
        let points = [north(10.0), north(25.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [plain(30.0), plain(45.0)];

        let result = compute_sequential_schedule(&input(480.0, true), &stops, &[0, 1], &matrix);

        let a = &result.stops[0];
        let b = &result.stops[1];
        assert!((a.arrival - 490.0).abs() < 1e-6);
        assert!((a.departure - 520.0).abs() < 1e-6);
        assert!((b.arrival - 535.0).abs() < 1e-6);
        assert!((b.departure - 580.0).abs() < 1e-6);
        assert_eq!(b.stop_idx, Some(1));

        assert!((result.total_distance_km - 25.0).abs() < 1e-6);
        assert!((result.total_duration_minutes - 100.0).abs() < 1e-6);
    }

    #[test]
    fn order_is_followed_not_input_position() {
        let points = [north(10.0), north(25.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [plain(0.0), plain(0.0)];

        let result = compute_sequential_schedule(&input(480.0, true), &stops, &[1, 0], &matrix);

        assert_eq!(result.stops[0].stop_idx, Some(1));
        assert!((result.stops[0].distance_from_previous_km - 25.0).abs() < 1e-6);
        assert!((result.stops[1].distance_from_previous_km - 15.0).abs() < 1e-6);
        assert!((result.total_distance_km - 40.0).abs() < 1e-6);
    }

    // -----------------------------------------------------------------------
    // Circular route adds the leg home
    // -----------------------------------------------------------------------
    #[test]
    fn return_leg_counts_towards_totals() {
        let matrix = DistanceMatrix::new(&START, &[north(10.0)]);
        let stops = [plain(20.0)];
        let mut inp = input(480.0, true);
        inp.return_to_start = true;

        let result = compute_sequential_schedule(&inp, &stops, &[0], &matrix);
        let back = result.return_leg.as_ref().unwrap();

        assert_eq!(back.stop_idx, None);
        assert!((back.arrival - 520.0).abs() < 1e-6);
        assert_eq!(back.departure, back.arrival);
        assert!((result.total_distance_km - 20.0).abs() < 1e-6);
        assert!((result.total_duration_minutes - 40.0).abs() < 1e-6);
    }

    // -----------------------------------------------------------------------
    // Schedules crossing midnight keep counting
    // -----------------------------------------------------------------------
    #[test]
    fn past_midnight_is_not_wrapped() {
        let matrix = DistanceMatrix::new(&START, &[north(30.0)]);
        let stops = [plain(60.0)];

        let result = compute_sequential_schedule(&input(1430.0, true), &stops, &[0], &matrix);

        assert!((result.stops[0].departure - 1520.0).abs() < 1e-6);
        assert!((result.total_duration_minutes - 90.0).abs() < 1e-6);
    }

    #[test]
    fn service_start_before_and_after_open() {
        assert_eq!(service_start(480.0, Some(510.0)), (510.0, 30.0));
        assert_eq!(service_start(520.0, Some(510.0)), (520.0, 0.0));
        assert_eq!(service_start(520.0, None), (520.0, 0.0));
    }
}
