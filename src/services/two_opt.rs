//! 2-opt local search over total driving distance.
//!
//! Time windows are ignored here. Run it before the forward simulation, never
//! after timings have been accepted, since a shorter path can easily break
//! window feasibility.

use crate::services::geo::DistanceMatrix;

/// Smallest gain (km) accepted as an improvement.
const IMPROVEMENT_EPSILON_KM: f64 = 1e-9;

/// Orders shorter than this cannot be improved by a segment reversal.
const MIN_STOPS: usize = 4;

/// Distance change from reversing `order[i..=k]`.
///
/// Only the two edges around the segment change; the segment interior is
/// the same set of edges walked backwards.
fn reversal_delta(matrix: &DistanceMatrix, order: &[usize], i: usize, k: usize, closed: bool) -> f64 {
    let before = if i == 0 {
        DistanceMatrix::START
    } else {
        DistanceMatrix::node(order[i - 1])
    };
    let first = DistanceMatrix::node(order[i]);
    let last = DistanceMatrix::node(order[k]);

    let after = if k + 1 < order.len() {
        Some(DistanceMatrix::node(order[k + 1]))
    } else if closed {
        Some(DistanceMatrix::START)
    } else {
        None
    };

    let mut delta = matrix.km(before, last) - matrix.km(before, first);
    if let Some(after) = after {
        delta += matrix.km(first, after) - matrix.km(last, after);
    }
    delta
}

/// Improve `order` by segment reversals until no reversal shortens it.
///
/// First improvement: the first shortening reversal found is applied and the
/// scan starts over.
pub fn two_opt_improvement(mut order: Vec<usize>, matrix: &DistanceMatrix, closed: bool) -> Vec<usize> {
    let n = order.len();
    if n < MIN_STOPS {
        return order;
    }

    let initial_km = matrix.path_km(&order, closed);
    let mut passes = 0usize;
    'scan: loop {
        passes += 1;
        for i in 0..n - 1 {
            for k in i + 1..n {
                if reversal_delta(matrix, &order, i, k, closed) < -IMPROVEMENT_EPSILON_KM {
                    order[i..=k].reverse();
                    continue 'scan;
                }
            }
        }
        break;
    }

    tracing::debug!(
        "2-opt settled after {} passes: {:.1} km -> {:.1} km",
        passes,
        initial_km,
        matrix.path_km(&order, closed)
    );
    order
}
