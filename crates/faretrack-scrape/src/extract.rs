use chrono::Local;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::errors::ExtractError;
use crate::model::MarkupRecord;

const CARD_SELECTOR: &str = r#"div[role="listitem"]"#;
const AIRLINE_SELECTOR: &str = "div[data-test-id='airline-name'] span";
const DEPARTURE_SELECTOR: &str = "div[data-test-id='departure-time']";
const ARRIVAL_SELECTOR: &str = "div[data-test-id='arrival-time']";
const PRICE_SELECTOR: &str = "div[data-test-id='price']";

/// Extracts one record per well-formed flight card, stamping each with
/// today's date as the booking date.
///
/// The travel date is caller-asserted context: the cards carry no date of
/// their own, so it is stamped onto every record without per-card
/// verification.
pub fn extract_flights(html: &str, travel_date: &str) -> Result<Vec<MarkupRecord>, ExtractError> {
    let booking_date = Local::now().format("%Y-%m-%d").to_string();
    extract_flights_with_booking_date(html, travel_date, &booking_date)
}

/// Extraction with an explicit booking date. Cards missing any of the four
/// required sub-fields are skipped (counted and logged, never fatal); a
/// price that survives stripping but does not parse as a number is an error.
pub fn extract_flights_with_booking_date(
    html: &str,
    travel_date: &str,
    booking_date: &str,
) -> Result<Vec<MarkupRecord>, ExtractError> {
    let document = Html::parse_document(html);
    let cards = parse_selector(CARD_SELECTOR)?;
    let airline = parse_selector(AIRLINE_SELECTOR)?;
    let departure = parse_selector(DEPARTURE_SELECTOR)?;
    let arrival = parse_selector(ARRIVAL_SELECTOR)?;
    let price = parse_selector(PRICE_SELECTOR)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for card in document.select(&cards) {
        let fields = (
            card.select(&airline).next(),
            card.select(&departure).next(),
            card.select(&arrival).next(),
            card.select(&price).next(),
        );
        let (Some(airline_el), Some(departure_el), Some(arrival_el), Some(price_el)) = fields
        else {
            skipped += 1;
            continue;
        };

        records.push(MarkupRecord {
            booking_date: booking_date.to_string(),
            travel_date: travel_date.to_string(),
            airline: text_of(airline_el),
            departure_time: text_of(departure_el),
            arrival_time: text_of(arrival_el),
            price_usd: parse_price(&text_of(price_el))?,
        });
    }

    if skipped > 0 {
        warn!(skipped, "skipped incomplete flight cards");
    }
    Ok(records)
}

fn parse_selector(selector: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::Selector {
        selector,
        message: err.to_string(),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Strips everything but digits and the decimal point before parsing, so
/// currency symbols and thousands separators ("$1,234.56") fall away.
pub(crate) fn parse_price(text: &str) -> Result<f64, ExtractError> {
    let stripped: String = text
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    stripped.parse::<f64>().map_err(|_| ExtractError::Price {
        text: text.to_string(),
        stripped,
    })
}
