//! Geographic calculations

use crate::types::GeoPoint;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Lowest speed used for travel time estimation
pub const MIN_SPEED_KMH: f64 = 1.0;

/// Calculate Haversine distance between two points in kilometers
pub fn distance_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    if from == to {
        return 0.0;
    }
    // Canonical argument order keeps the result bit-for-bit symmetric.
    let (from, to) = if (from.lat, from.lng) <= (to.lat, to.lng) {
        (from, to)
    } else {
        (to, from)
    };

    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Floor the speed so travel times stay finite.
pub fn effective_speed(speed_kmh: f64) -> f64 {
    if speed_kmh.is_finite() {
        speed_kmh.max(MIN_SPEED_KMH)
    } else {
        MIN_SPEED_KMH
    }
}

/// Minutes needed to cover `distance_km`
pub fn minutes_for_distance(distance_km: f64, speed_kmh: f64) -> f64 {
    distance_km / effective_speed(speed_kmh) * 60.0
}

/// Pairwise distances over `[start, stop0, stop1, ...]`.
///
/// Node 0 is the start point; stop `i` lives at node `i + 1`.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    km: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub const START: usize = 0;

    pub fn new(start: &GeoPoint, stops: &[GeoPoint]) -> Self {
        let mut points = Vec::with_capacity(stops.len() + 1);
        points.push(*start);
        points.extend_from_slice(stops);

        let n = points.len();
        let mut km = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance_km(&points[i], &points[j]);
                km[i][j] = d;
                km[j][i] = d;
            }
        }

        Self { km }
    }

    /// Matrix node for a stop index
    pub const fn node(stop_idx: usize) -> usize {
        stop_idx + 1
    }

    pub fn km(&self, from: usize, to: usize) -> f64 {
        self.km[from][to]
    }

    pub fn minutes(&self, from: usize, to: usize, speed_kmh: f64) -> f64 {
        minutes_for_distance(self.km[from][to], speed_kmh)
    }

    /// Length of start -> stops in `order`, plus the way back when `closed`.
    pub fn path_km(&self, order: &[usize], closed: bool) -> f64 {
        let mut total = 0.0;
        let mut prev = Self::START;
        for &stop_idx in order {
            let node = Self::node(stop_idx);
            total += self.km(prev, node);
            prev = node;
        }
        if closed && !order.is_empty() {
            total += self.km(prev, Self::START);
        }
        total
    }
}
