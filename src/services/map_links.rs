//! Turn-by-turn navigation links for a planned route.
//!
//! Google Maps accepts at most 9 intermediate waypoints per directions URL,
//! so long routes are split into consecutive legs that share their boundary
//! stop.

use crate::types::{GeoPoint, RoutePlan};

const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1";

/// Intermediate waypoints allowed per URL
pub const MAX_WAYPOINTS: usize = 9;

fn format_point(p: &GeoPoint) -> String {
    format!("{:.6},{:.6}", p.lat, p.lng)
}

fn directions_url(origin: &GeoPoint, waypoints: &[GeoPoint], destination: &GeoPoint) -> String {
    let mut url = format!(
        "{}&origin={}&destination={}",
        DIRECTIONS_BASE,
        urlencoding::encode(&format_point(origin)),
        urlencoding::encode(&format_point(destination)),
    );
    if !waypoints.is_empty() {
        let joined = waypoints.iter().map(format_point).collect::<Vec<_>>().join("|");
        url.push_str("&waypoints=");
        url.push_str(&urlencoding::encode(&joined));
    }
    url.push_str("&travelmode=driving");
    url
}

/// Directions URLs for an ordered list of points.
pub fn directions_links(points: &[GeoPoint]) -> Vec<String> {
    let mut links = Vec::new();
    if points.len() < 2 {
        return links;
    }

    let last = points.len() - 1;
    let mut from = 0;
    while from < last {
        let to = (from + MAX_WAYPOINTS + 1).min(last);
        links.push(directions_url(&points[from], &points[from + 1..to], &points[to]));
        from = to;
    }
    links
}

/// Links for a plan: start, every entry in order (the closing leg included).
pub fn plan_links(plan: &RoutePlan) -> Vec<String> {
    let mut points = Vec::with_capacity(plan.order.len() + 1);
    points.push(plan.start);
    points.extend(plan.order.iter().filter_map(|e| e.stop.location));
    directions_links(&points)
}
