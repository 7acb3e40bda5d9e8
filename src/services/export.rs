//! Itinerary output: CSV export and console table

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::types::time::format_minutes;
use crate::types::{EntryKind, RoutePlan, ScheduleEntry};

#[derive(Debug, Serialize)]
struct CsvItineraryRow<'a> {
    seq: usize,
    name: &'a str,
    address: &'a str,
    lat: Option<f64>,
    lng: Option<f64>,
    travel_min: i32,
    arrival: String,
    wait_min: i32,
    dwell_min: u32,
    departure: String,
}

impl<'a> From<&'a ScheduleEntry> for CsvItineraryRow<'a> {
    fn from(entry: &'a ScheduleEntry) -> Self {
        Self {
            seq: entry.sequence_index + 1,
            name: &entry.stop.label,
            address: &entry.stop.address,
            lat: entry.stop.location.map(|p| p.lat),
            lng: entry.stop.location.map(|p| p.lng),
            travel_min: entry.travel_minutes_from_previous,
            arrival: format_minutes(entry.arrival_minutes_of_day),
            wait_min: entry.wait_minutes,
            dwell_min: entry.stop.dwell_minutes,
            departure: format_minutes(entry.departure_minutes_of_day),
        }
    }
}

/// Write one CSV row per itinerary entry.
pub fn write_itinerary_csv<W: Write>(writer: W, plan: &RoutePlan) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for entry in &plan.order {
        writer
            .serialize(CsvItineraryRow::from(entry))
            .with_context(|| format!("Failed to write itinerary row {}", entry.sequence_index + 1))?;
    }
    writer.flush().context("Failed to flush itinerary CSV")?;
    Ok(())
}

/// Plain-text itinerary for the terminal.
pub fn render_itinerary(plan: &RoutePlan) -> String {
    let mut out = String::new();

    if plan.is_empty() {
        out.push_str("Nothing to schedule.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>3}  {:<28} {:>6} {:>7} {:>5} {:>6} {:>7}  {}",
        "#", "Stop", "Drive", "Arrive", "Wait", "Dwell", "Leave", "Notes"
    );
    let _ = writeln!(out, "{}", "-".repeat(84));

    let _ = writeln!(
        out,
        "{:>3}  {:<28} {:>6} {:>7} {:>5} {:>6} {:>7}",
        0,
        "Start",
        "",
        "",
        "",
        "",
        format_minutes(plan.start_time_minutes)
    );

    for entry in &plan.order {
        let mut notes = Vec::new();
        if entry.departure_clamped {
            notes.push("left at closing".to_string());
        }
        if let (Some(open), Some(close)) = (entry.stop.window_open, entry.stop.window_close) {
            notes.push(format!("{}-{}", open.format("%H:%M"), close.format("%H:%M")));
        } else if let Some(open) = entry.stop.window_open {
            notes.push(format!("from {}", open.format("%H:%M")));
        } else if let Some(close) = entry.stop.window_close {
            notes.push(format!("until {}", close.format("%H:%M")));
        }
        let precision = entry.stop.precision_label();
        if !precision.is_empty() {
            notes.push(precision.to_string());
        }

        let (dwell, leave) = match entry.kind {
            EntryKind::Visit => (
                entry.stop.dwell_minutes.to_string(),
                format_minutes(entry.departure_minutes_of_day),
            ),
            EntryKind::ReturnToStart => (String::new(), String::new()),
        };

        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:>6} {:>7} {:>5} {:>6} {:>7}  {}",
            entry.sequence_index + 1,
            truncate(&entry.stop.label, 28),
            entry.travel_minutes_from_previous,
            format_minutes(entry.arrival_minutes_of_day),
            entry.wait_minutes,
            dwell,
            leave,
            notes.join(", ")
        );
    }

    let _ = writeln!(out, "{}", "-".repeat(84));
    let _ = writeln!(
        out,
        "{} stops, {:.1} km, {} h {:02} min",
        plan.totals.stop_count,
        plan.totals.total_distance_km,
        plan.totals.total_duration_minutes / 60,
        plan.totals.total_duration_minutes % 60
    );

    let clamped = plan.visits().filter(|e| e.departure_clamped).count();
    if clamped > 0 {
        let _ = writeln!(out, "{} stop(s) cut short at closing time", clamped);
    }

    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.push('…');
    cut
}
