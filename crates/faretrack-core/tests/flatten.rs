use std::fs;

use faretrack_core::flatten::{flatten_directory, flatten_snapshot, OUTPUT_FILE};
use faretrack_core::model::Snapshot;
use tempfile::TempDir;

fn decode(json: &str) -> Snapshot {
    serde_json::from_str(json).expect("snapshot decode failed")
}

fn scenario_snapshot() -> Snapshot {
    decode(
        r#"{
            "booking_date": "2025-05-01 10:00:00",
            "travel_date": "2025-06-25",
            "data": {
                "best_flights": [
                    {
                        "type": "One way",
                        "flights": [
                            {
                                "travel_class": "Business",
                                "flight_number": "VN 55",
                                "often_delayed_by_over_30_min": true
                            },
                            { "travel_class": "Business", "flight_number": "KE 85" }
                        ],
                        "price": 1200,
                        "total_duration": 900,
                        "layovers": [{ "duration": 60 }, { "duration": 90 }],
                        "carbon_emissions": { "this_flight": 1043000 }
                    }
                ],
                "other_flights": []
            }
        }"#,
    )
}

#[test]
fn scenario_snapshot_flattens_to_expected_row() {
    let rows = flatten_snapshot(&scenario_snapshot()).expect("flatten failed");
    assert_eq!(rows.records.len(), 1);
    assert_eq!(rows.skipped_itineraries, 0);

    let record = &rows.records[0];
    assert_eq!(record.booking_date, "2025-05-01 10:00:00");
    assert_eq!(record.travel_date, "2025-06-25");
    assert_eq!(record.route_type.as_deref(), Some("One way"));
    assert_eq!(record.travel_class.as_deref(), Some("Business"));
    assert_eq!(record.flight_number.as_deref(), Some("VN 55"));
    assert_eq!(record.price, Some(1200.0));
    assert_eq!(record.total_duration, Some(900));
    assert_eq!(record.n_stops, 2);
    assert_eq!(record.carbon_this, Some(1043000));
    assert!(record.delayed_any);
    assert_eq!(record.layover_total_duration, 150);
    assert_eq!(record.days_to_departure, 55);
    assert_eq!(record.avg_stop_duration, 75.0);
}

#[test]
fn one_row_per_itinerary_and_legless_itineraries_skipped() {
    let snapshot = decode(
        r#"{
            "booking_date": "2025-05-01",
            "travel_date": "2025-06-25",
            "data": {
                "best_flights": [
                    { "flights": [{ "flight_number": "VN 55" }], "price": 980 }
                ],
                "other_flights": [
                    { "flights": [], "price": 700 },
                    { "price": 650 },
                    { "flights": [{ "flight_number": "JL 751" }], "price": 1450 }
                ]
            }
        }"#,
    );

    let rows = flatten_snapshot(&snapshot).expect("flatten failed");
    assert_eq!(rows.records.len(), 2);
    assert_eq!(rows.skipped_itineraries, 2);
    // best_flights rows come first, then other_flights, in list order.
    assert_eq!(rows.records[0].flight_number.as_deref(), Some("VN 55"));
    assert_eq!(rows.records[1].flight_number.as_deref(), Some("JL 751"));
}

#[test]
fn direct_flight_has_zero_stops_and_zero_average() {
    let snapshot = decode(
        r#"{
            "booking_date": "2025-05-01",
            "travel_date": "2025-06-25",
            "data": {
                "best_flights": [
                    { "flights": [{ "flight_number": "VN 55" }], "price": 980 }
                ],
                "other_flights": []
            }
        }"#,
    );

    let rows = flatten_snapshot(&snapshot).expect("flatten failed");
    let record = &rows.records[0];
    assert_eq!(record.n_stops, 0);
    assert_eq!(record.layover_total_duration, 0);
    assert_eq!(record.avg_stop_duration, 0.0);
    // Absent delay flags mean false, not null.
    assert!(!record.delayed_any);
}

#[test]
fn empty_directory_writes_header_only_table() {
    let dir = TempDir::new().expect("tempdir failed");

    let summary = flatten_directory(dir.path()).expect("flatten failed");
    assert_eq!(summary.files_seen, 0);
    assert_eq!(summary.records_written, 0);

    let table = fs::read_to_string(dir.path().join(OUTPUT_FILE)).expect("missing output table");
    assert_eq!(
        table.trim_end(),
        "booking_date,travel_date,route_type,travel_class,flight_number,price,\
         total_duration,n_stops,carbon_this,delayed_any,layover_total_duration,\
         days_to_departure,avg_stop_duration"
    );
}

#[test]
fn undecodable_file_skips_that_file_only() {
    let dir = TempDir::new().expect("tempdir failed");
    fs::write(dir.path().join("bad.json"), "not a snapshot").expect("write failed");
    fs::write(
        dir.path().join("good.json"),
        serde_json::to_string(&scenario_snapshot()).expect("encode failed"),
    )
    .expect("write failed");

    let summary = flatten_directory(dir.path()).expect("flatten failed");
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.files_flattened, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.records_written, 1);
}

#[test]
fn rows_follow_filename_order_and_repeats_are_kept() {
    let dir = TempDir::new().expect("tempdir failed");

    // Same itinerary fetched on two days: both rows must survive, ordered by
    // filename rather than by write order.
    let later = decode(
        r#"{
            "booking_date": "2025-05-02 09:00:00",
            "travel_date": "2025-06-25",
            "data": {
                "best_flights": [{ "flights": [{ "flight_number": "VN 55" }], "price": 990 }],
                "other_flights": []
            }
        }"#,
    );
    let earlier = decode(
        r#"{
            "booking_date": "2025-05-01 10:00:00",
            "travel_date": "2025-06-25",
            "data": {
                "best_flights": [{ "flights": [{ "flight_number": "VN 55" }], "price": 980 }],
                "other_flights": []
            }
        }"#,
    );
    fs::write(
        dir.path().join("b.json"),
        serde_json::to_string(&later).expect("encode failed"),
    )
    .expect("write failed");
    fs::write(
        dir.path().join("a.json"),
        serde_json::to_string(&earlier).expect("encode failed"),
    )
    .expect("write failed");

    let summary = flatten_directory(dir.path()).expect("flatten failed");
    assert_eq!(summary.records_written, 2);

    let table = fs::read_to_string(&summary.output_path).expect("missing output table");
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2025-05-01 10:00:00"));
    assert!(lines[2].starts_with("2025-05-02 09:00:00"));
}
