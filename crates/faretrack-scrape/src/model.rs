use serde::Serialize;

/// One flight card lifted from a rendered result page. The travel date is
/// the caller's query context; the booking date is the extraction date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkupRecord {
    pub booking_date: String,
    pub travel_date: String,
    pub airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price_usd: f64,
}
