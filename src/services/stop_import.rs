//! Stop input: CSV stop tables and pasted address lists

use std::io::Read;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::time::parse_time_of_day;
use crate::types::{GeoPoint, Stop};

/// One row of the stop table. Everything but the address may be blank.
#[derive(Debug, Deserialize)]
struct CsvStopRow {
    #[serde(default)]
    name: Option<String>,
    address: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    dwell: Option<u32>,
    #[serde(default)]
    open: Option<String>,
    #[serde(default)]
    close: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CsvStopRow {
    fn into_stop(self, row: usize, default_dwell: u32) -> Result<Stop> {
        let address = collapse_whitespace(&self.address);
        if address.is_empty() {
            anyhow::bail!("Row {}: address is empty", row);
        }

        let open = match non_blank(self.open) {
            Some(raw) => Some(
                parse_time_of_day(&raw)
                    .with_context(|| format!("Row {}: invalid opening time '{}'", row, raw))?,
            ),
            None => None,
        };
        let close = match non_blank(self.close) {
            Some(raw) => Some(
                parse_time_of_day(&raw)
                    .with_context(|| format!("Row {}: invalid closing time '{}'", row, raw))?,
            ),
            None => None,
        };
        if let (Some(o), Some(c)) = (open, close) {
            if c < o {
                anyhow::bail!(
                    "Row {}: closing time {} is before opening time {}",
                    row,
                    c.format("%H:%M"),
                    o.format("%H:%M")
                );
            }
        }

        let location = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let point = GeoPoint { lat, lng };
                if !point.is_valid() {
                    anyhow::bail!("Row {}: coordinates {},{} are out of range", row, lat, lng);
                }
                Some(point)
            }
            _ => None,
        };

        let mut stop = Stop::new(address, self.dwell.unwrap_or(default_dwell)).with_window(open, close);
        if let Some(name) = non_blank(self.name) {
            stop = stop.with_label(name);
        }
        stop.location = location;
        Ok(stop)
    }
}

/// Read a stop table with headers `name,address,lat,lng,dwell,open,close`.
pub fn read_stop_csv<R: Read>(reader: R, delimiter: u8, default_dwell: u32) -> Result<Vec<Stop>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut stops = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        // Header is line 1
        let row_number = i + 2;
        let row: CsvStopRow = result.with_context(|| format!("Row {}: malformed record", row_number))?;
        stops.push(row.into_stop(row_number, default_dwell)?);
    }
    Ok(stops)
}

/// One stop per non-empty line; `#` starts a comment line.
pub fn parse_address_lines(text: &str, default_dwell: u32) -> Vec<Stop> {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| Stop::new(line, default_dwell))
        .collect()
}
