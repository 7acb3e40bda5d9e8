//! Greedy construction of the initial stop order.
//!
//! Starting at the start point, the next stop is always the cheapest one to
//! reach from the current position at the current clock. The cost mixes
//! drive time, waiting for a window to open and lateness against the window
//! close, so nearby stops win unless that would make somebody late.

use crate::services::geo::DistanceMatrix;
use crate::services::simulator::{service_start, ScheduleStop};
use crate::types::time::MINUTES_PER_DAY;

/// Weight of each minute of lateness relative to a minute of driving.
const LATENESS_WEIGHT: f64 = 1_000.0;

/// Earliest-deadline tie breaker, per minute of close time.
const DEADLINE_WEIGHT: f64 = 0.001;

/// Cost of visiting one stop next.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Arrival would fall after the window close
    late: bool,
    score: f64,
    departure: f64,
}

impl Candidate {
    /// Feasible candidates always rank ahead of late ones, whatever the score.
    fn beats(&self, other: &Candidate) -> bool {
        (self.late, self.score) < (other.late, other.score)
    }
}

/// Cost of visiting `stop` next, given the drive time to it and the clock.
///
/// Lower scores are better.
fn candidate_score(stop: &ScheduleStop, drive_minutes: f64, clock: f64) -> Candidate {
    let (arrival, wait) = service_start(clock + drive_minutes, stop.window_open);

    let late = stop
        .window_close
        .map(|close| (arrival - close).max(0.0))
        .unwrap_or(0.0);
    let deadline = stop.window_close.unwrap_or(MINUTES_PER_DAY as f64);

    let score = deadline * DEADLINE_WEIGHT + drive_minutes + wait + late * LATENESS_WEIGHT;

    Candidate {
        late: late > 0.0,
        score,
        departure: arrival + stop.dwell_minutes,
    }
}

/// Build a full visiting order over `stops`.
///
/// Every stop is placed exactly once. Stops that can only be reached late
/// are still placed, after every stop that can be reached in time. Equal
/// scores keep the input order.
pub fn greedy_order(
    stops: &[ScheduleStop],
    matrix: &DistanceMatrix,
    start_minutes: f64,
    speed_kmh: f64,
) -> Vec<usize> {
    let n = stops.len();
    let mut order = Vec::with_capacity(n);
    let mut remaining: Vec<usize> = (0..n).collect();

    let mut current = DistanceMatrix::START;
    let mut clock = start_minutes;

    while !remaining.is_empty() {
        let mut best: Option<(usize, Candidate)> = None;

        for (pos, &stop_idx) in remaining.iter().enumerate() {
            let drive = matrix.minutes(current, DistanceMatrix::node(stop_idx), speed_kmh);
            let candidate = candidate_score(&stops[stop_idx], drive, clock);

            // Strict comparison: first seen wins ties
            if best.map_or(true, |(_, current_best)| candidate.beats(&current_best)) {
                best = Some((pos, candidate));
            }
        }

        let Some((pos, Candidate { departure, .. })) = best else {
            break;
        };

        let stop_idx = remaining.remove(pos);
        order.push(stop_idx);
        current = DistanceMatrix::node(stop_idx);
        clock = departure;
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    const START: GeoPoint = GeoPoint { lat: 0.0, lng: 0.0 };

    fn north(km: f64) -> GeoPoint {
        GeoPoint::new((km / 6371.0).to_degrees(), 0.0)
    }

    fn east(km: f64) -> GeoPoint {
        GeoPoint::new(0.0, (km / 6371.0).to_degrees())
    }

    fn plain() -> ScheduleStop {
        ScheduleStop { dwell_minutes: 10.0, window_open: None, window_close: None }
    }

    fn windowed(open: f64, close: f64, dwell: f64) -> ScheduleStop {
        ScheduleStop { dwell_minutes: dwell, window_open: Some(open), window_close: Some(close) }
    }

    #[test]
    fn empty_input_gives_empty_order() {
        let matrix = DistanceMatrix::new(&START, &[]);
        assert!(greedy_order(&[], &matrix, 480.0, 60.0).is_empty());
    }

    #[test]
    fn without_windows_visits_nearest_first() {
        let points = [north(30.0), north(10.0), north(20.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [plain(), plain(), plain()];

        let order = greedy_order(&stops, &matrix, 480.0, 60.0);

        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn earlier_deadline_goes_first() {
        // A: 09:00-09:30 dwell 10, B: 08:00-08:30 dwell 5, both 5 min away.
        let points = [north(5.0), east(5.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [windowed(540.0, 570.0, 10.0), windowed(480.0, 510.0, 5.0)];

        let order = greedy_order(&stops, &matrix, 480.0, 60.0);

        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn avoids_lateness_when_a_feasible_option_exists() {
        // The near stop is already closed; the far one is still open.
        let points = [north(1.0), north(40.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [windowed(400.0, 450.0, 5.0), windowed(480.0, 600.0, 5.0)];

        let order = greedy_order(&stops, &matrix, 480.0, 60.0);

        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn unreachable_stops_are_still_placed() {
        let points = [north(5.0), north(10.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [windowed(300.0, 360.0, 5.0), windowed(300.0, 400.0, 5.0)];

        let order = greedy_order(&stops, &matrix, 480.0, 60.0);

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn feasible_stop_wins_however_far_away() {
        // At 1 km/h the open stop is over a million minutes away; the near
        // one closed a minute before departure.
        let points = [GeoPoint::new(0.0, 170.0), east(0.1)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [plain(), windowed(400.0, 479.0, 5.0)];

        let order = greedy_order(&stops, &matrix, 480.0, 1.0);

        assert!(matrix.minutes(DistanceMatrix::START, DistanceMatrix::node(0), 1.0) > 1_000_000.0);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn ties_keep_input_order() {
        // Same place, same (lack of) window
        let points = [north(5.0), north(5.0), north(5.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [plain(), plain(), plain()];

        assert_eq!(greedy_order(&stops, &matrix, 480.0, 60.0), vec![0, 1, 2]);
    }

    #[test]
    fn waiting_counts_against_a_candidate() {
        // Near stop opens in two hours, far stop is open now.
        let points = [north(2.0), north(15.0)];
        let matrix = DistanceMatrix::new(&START, &points);
        let stops = [
            ScheduleStop { dwell_minutes: 5.0, window_open: Some(600.0), window_close: None },
            plain(),
        ];

        let order = greedy_order(&stops, &matrix, 480.0, 60.0);

        assert_eq!(order[0], 1);
    }
}
