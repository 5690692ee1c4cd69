use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

use crate::error::FlattenError;
use crate::model::{Itinerary, Snapshot};
use crate::snapshot::read_snapshot;

/// Name of the aggregated table written inside the snapshot directory.
pub const OUTPUT_FILE: &str = "merged_flights.csv";

const HEADER: [&str; 13] = [
    "booking_date",
    "travel_date",
    "route_type",
    "travel_class",
    "flight_number",
    "price",
    "total_duration",
    "n_stops",
    "carbon_this",
    "delayed_any",
    "layover_total_duration",
    "days_to_departure",
    "avg_stop_duration",
];

/// One table row derived from one itinerary. Field order matches the
/// output header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub booking_date: String,
    pub travel_date: String,
    pub route_type: Option<String>,
    pub travel_class: Option<String>,
    pub flight_number: Option<String>,
    pub price: Option<f64>,
    pub total_duration: Option<i64>,
    pub n_stops: usize,
    pub carbon_this: Option<i64>,
    pub delayed_any: bool,
    pub layover_total_duration: i64,
    pub days_to_departure: i64,
    pub avg_stop_duration: f64,
}

/// Rows produced from one snapshot, with the count of itineraries that had
/// to be dropped for missing structure.
#[derive(Debug, Default)]
pub struct SnapshotRows {
    pub records: Vec<FlatRecord>,
    pub skipped_itineraries: usize,
}

#[derive(Debug, Default)]
pub struct FlattenSummary {
    pub files_seen: usize,
    pub files_flattened: usize,
    pub files_skipped: usize,
    pub records_written: usize,
    pub itineraries_skipped: usize,
    pub output_path: PathBuf,
}

/// Lists the snapshot files in a directory, sorted by filename so batch
/// output is reproducible regardless of filesystem enumeration order.
pub fn discover_snapshots(dir: &Path) -> Result<Vec<PathBuf>, FlattenError> {
    let pattern = dir.join("*.json");
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        paths.push(entry?);
    }
    paths.sort();
    Ok(paths)
}

/// Flattens one decoded snapshot into table rows: one per itinerary across
/// `best_flights` then `other_flights`, in order. Itineraries without a
/// representative first leg are skipped and counted, never fatal. Fails only
/// when the snapshot's own date stamps cannot be read as calendar dates.
pub fn flatten_snapshot(snapshot: &Snapshot) -> Result<SnapshotRows, FlattenError> {
    let days_to_departure = days_between(&snapshot.booking_date, &snapshot.travel_date)?;

    let mut rows = SnapshotRows::default();
    let itineraries = snapshot
        .data
        .best_flights
        .iter()
        .chain(snapshot.data.other_flights.iter());
    for itinerary in itineraries {
        match flatten_itinerary(snapshot, itinerary, days_to_departure) {
            Some(record) => rows.records.push(record),
            None => rows.skipped_itineraries += 1,
        }
    }
    Ok(rows)
}

fn flatten_itinerary(
    snapshot: &Snapshot,
    itinerary: &Itinerary,
    days_to_departure: i64,
) -> Option<FlatRecord> {
    // No first leg means no representative travel class or flight number.
    let first_leg = itinerary.flights.first()?;

    let n_stops = itinerary.layovers.len();
    let layover_total_duration: i64 = itinerary.layovers.iter().map(|stop| stop.duration).sum();
    let avg_stop_duration = if n_stops == 0 {
        0.0
    } else {
        layover_total_duration as f64 / n_stops as f64
    };
    let delayed_any = itinerary
        .flights
        .iter()
        .any(|leg| leg.often_delayed_by_over_30_min);

    Some(FlatRecord {
        booking_date: snapshot.booking_date.clone(),
        travel_date: snapshot.travel_date.clone(),
        route_type: itinerary.route_type.clone(),
        travel_class: first_leg.travel_class.clone(),
        flight_number: first_leg.flight_number.clone(),
        price: itinerary.price,
        total_duration: itinerary.total_duration,
        n_stops,
        carbon_this: itinerary
            .carbon_emissions
            .as_ref()
            .and_then(|ce| ce.this_flight),
        delayed_any,
        layover_total_duration,
        days_to_departure,
        avg_stop_duration,
    })
}

/// Flattens every snapshot file in `dir` and writes the aggregated table to
/// `merged_flights.csv` inside it. A file that fails to decode is skipped
/// and counted; rows are never deduplicated across files, so a re-fetched
/// itinerary contributes one row per snapshot it appears in.
pub fn flatten_directory(dir: &Path) -> Result<FlattenSummary, FlattenError> {
    let paths = discover_snapshots(dir)?;

    let mut summary = FlattenSummary {
        output_path: dir.join(OUTPUT_FILE),
        ..FlattenSummary::default()
    };
    let mut records = Vec::new();

    for path in &paths {
        summary.files_seen += 1;
        let snapshot = match read_snapshot(path) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable snapshot");
                summary.files_skipped += 1;
                continue;
            }
        };
        match flatten_snapshot(&snapshot) {
            Ok(rows) => {
                summary.files_flattened += 1;
                summary.itineraries_skipped += rows.skipped_itineraries;
                records.extend(rows.records);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping snapshot with bad date stamps");
                summary.files_skipped += 1;
            }
        }
    }

    if summary.itineraries_skipped > 0 {
        warn!(
            skipped = summary.itineraries_skipped,
            "dropped itineraries without flight legs"
        );
    }

    write_table(&summary.output_path, &records)?;
    summary.records_written = records.len();
    Ok(summary)
}

/// Writes header plus rows. The header is emitted explicitly so an empty
/// batch still yields a well-formed one-line table.
pub fn write_table(path: &Path, records: &[FlatRecord]) -> Result<(), FlattenError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Calendar-day difference from booking to travel, discarding any
/// time-of-day carried by the booking stamp. Negative when the snapshot was
/// taken after the travel date; that is kept, not rejected.
fn days_between(booking_date: &str, travel_date: &str) -> Result<i64, FlattenError> {
    let booking = parse_calendar_date(booking_date)?;
    let travel = parse_calendar_date(travel_date)?;
    Ok((travel - booking).num_days())
}

fn parse_calendar_date(value: &str) -> Result<NaiveDate, FlattenError> {
    static DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date());
        }
    }
    Err(FlattenError::Date(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_dates_accept_date_and_datetime_stamps() {
        assert_eq!(days_between("2025-05-01 10:00:00", "2025-06-25").unwrap(), 55);
        assert_eq!(days_between("2025-05-01", "2025-05-01").unwrap(), 0);
        // Booking after travel stays negative.
        assert_eq!(days_between("2025-07-01 00:30:00", "2025-06-25").unwrap(), -6);
        assert!(matches!(
            days_between("yesterday", "2025-06-25"),
            Err(FlattenError::Date(_))
        ));
    }
}
