use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use faretrack_core::fetch::{CabinClass, SerpApiClient, TripQuery};
use faretrack_core::flatten::flatten_directory;
use faretrack_core::snapshot::{write_snapshot, DEFAULT_SNAPSHOT_FILE};
use faretrack_scrape::{extract_flights, MarkupRecord};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flight fare snapshot collector and flattener", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one search snapshot and write it to a JSON file
    Fetch(FetchArgs),
    /// Fetch the rendered result page and extract flight cards from it
    Scrape(ScrapeArgs),
    /// Flatten a directory of snapshot files into one CSV table
    Flatten(FlattenArgs),
}

#[derive(Args, Debug)]
struct TripArgs {
    /// Departure airport code
    #[arg(long, default_value = "HAN")]
    origin: String,
    /// Arrival airport code (repeat for alternates)
    #[arg(long = "dest", default_values_t = ["JFK".to_string(), "LGA".to_string(), "EWR".to_string()])]
    dest: Vec<String>,
    /// Cabin class: economy, premium-economy, or business
    #[arg(long, value_parser = parse_cabin, default_value = "economy")]
    cabin: CabinClass,
}

#[derive(Args, Debug)]
struct FetchArgs {
    #[command(flatten)]
    trip: TripArgs,
    /// Outbound travel date, YYYY-MM-DD
    #[arg(long)]
    date: String,
    /// Snapshot file to write; the default name is overwritten on every run
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    #[command(flatten)]
    trip: TripArgs,
    /// Outbound travel date, YYYY-MM-DD
    #[arg(long)]
    date: String,
    /// Optional CSV file for the extracted records
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FlattenArgs {
    /// Directory holding the snapshot corpus
    #[arg(long)]
    dir: PathBuf,
}

fn parse_cabin(value: &str) -> Result<CabinClass, String> {
    CabinClass::try_from(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(args) => handle_fetch(args).await,
        Command::Scrape(args) => handle_scrape(args).await,
        Command::Flatten(args) => handle_flatten(args),
    }
}

fn trip_query(args: &TripArgs) -> TripQuery {
    TripQuery {
        origin: args.origin.clone(),
        destinations: args.dest.clone(),
        cabin: args.cabin,
        ..TripQuery::default()
    }
}

async fn handle_fetch(args: FetchArgs) -> Result<()> {
    let client = connect()?;
    let trip = trip_query(&args.trip);

    let snapshot = client.fetch_snapshot(&trip, &args.date).await?;
    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE));
    write_snapshot(&snapshot, &path)?;

    println!(
        "Exported {} itineraries ({} best, {} other) for {} to {}",
        snapshot.itinerary_count(),
        snapshot.data.best_flights.len(),
        snapshot.data.other_flights.len(),
        snapshot.travel_date,
        path.display()
    );
    Ok(())
}

async fn handle_scrape(args: ScrapeArgs) -> Result<()> {
    let client = connect()?;
    let trip = trip_query(&args.trip);

    let html = client.fetch_markup(&trip, &args.date).await?;
    let records = extract_flights(&html, &args.date)?;

    if records.is_empty() {
        println!("No flights found for travel_date={}", args.date);
        return Ok(());
    }

    println!(
        "Found {} flights for travel_date={} (booking_date={}):",
        records.len(),
        args.date,
        records[0].booking_date
    );
    for record in &records {
        println!(
            "{} {} -> {} : ${}",
            record.airline, record.departure_time, record.arrival_time, record.price_usd
        );
    }

    if let Some(path) = args.out {
        write_markup_records(&path, &records)?;
        info!(path = %path.display(), rows = records.len(), "markup records written");
    }
    Ok(())
}

fn handle_flatten(args: FlattenArgs) -> Result<()> {
    let summary = flatten_directory(&args.dir)?;

    println!(
        "Flattened {} of {} snapshot files into {} rows at {}",
        summary.files_flattened,
        summary.files_seen,
        summary.records_written,
        summary.output_path.display()
    );
    if summary.files_skipped > 0 || summary.itineraries_skipped > 0 {
        println!(
            "Skipped {} files and {} itineraries (see warnings above)",
            summary.files_skipped, summary.itineraries_skipped
        );
    }
    Ok(())
}

fn connect() -> Result<SerpApiClient> {
    dotenvy::dotenv().ok();
    SerpApiClient::from_env().context("SERPAPI_API_KEY must be set (in the environment or .env)")
}

fn write_markup_records(path: &PathBuf, records: &[MarkupRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
