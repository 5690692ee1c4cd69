use std::env;
use std::fmt;
use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::model::{Itinerary, Snapshot};

const SEARCH_URL: &str = "https://serpapi.com/search";

/// Provider trip-type code for a one-way search.
const ONE_WAY: &str = "2";

pub const API_KEY_VAR: &str = "SERPAPI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
}

impl CabinClass {
    pub fn provider_code(&self) -> &'static str {
        match self {
            CabinClass::Economy => "1",
            CabinClass::PremiumEconomy => "2",
            CabinClass::Business => "3",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium-economy",
            CabinClass::Business => "business",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CabinClass {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "economy" | "eco" | "1" => Ok(CabinClass::Economy),
            "premium-economy" | "premium_economy" | "premium" | "2" => {
                Ok(CabinClass::PremiumEconomy)
            }
            "business" | "biz" | "3" => Ok(CabinClass::Business),
            other => Err(format!("unknown cabin class '{other}'")),
        }
    }
}

/// Fixed trip parameters for a one-way search. The outbound date is the only
/// per-call input; everything else stays constant across a collection run.
#[derive(Debug, Clone)]
pub struct TripQuery {
    pub origin: String,
    pub destinations: Vec<String>,
    pub cabin: CabinClass,
    pub locale: String,
    pub country: String,
    pub currency: String,
}

impl Default for TripQuery {
    fn default() -> Self {
        Self {
            origin: "HAN".to_string(),
            destinations: vec!["JFK".to_string(), "LGA".to_string(), "EWR".to_string()],
            cabin: CabinClass::Economy,
            locale: "en".to_string(),
            country: "us".to_string(),
            currency: "USD".to_string(),
        }
    }
}

impl TripQuery {
    fn arrival_param(&self) -> String {
        self.destinations.join(",")
    }
}

pub struct SerpApiClient {
    http: Client,
    api_key: String,
}

impl SerpApiClient {
    /// Reads the provider credential from the environment. A missing or empty
    /// key is fatal before any network activity.
    pub fn from_env() -> Result<Self, FetchError> {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(FetchError::MissingApiKey)?;
        Self::new(api_key)
    }

    pub fn new(api_key: String) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, api_key })
    }

    /// Runs one structured search and keeps only the two itinerary lists,
    /// stamped with the fetch time and the queried outbound date. No retry:
    /// a failed call is a failed run.
    pub async fn fetch_snapshot(
        &self,
        trip: &TripQuery,
        outbound_date: &str,
    ) -> Result<Snapshot, FetchError> {
        let params = self.base_params(trip, outbound_date);
        let body = self.get_text(&params).await?;
        let response: SearchResponse = serde_json::from_str(&body)
            .map_err(|err| FetchError::Upstream(format!("undecodable search response: {err}")))?;

        let booking_date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let snapshot = snapshot_from_response(response, outbound_date, booking_date)?;
        debug!(
            travel_date = %outbound_date,
            best = snapshot.data.best_flights.len(),
            other = snapshot.data.other_flights.len(),
            "flight search fetched"
        );
        Ok(snapshot)
    }

    /// Runs the same search asking for the rendered result page and returns
    /// its raw markup.
    pub async fn fetch_markup(
        &self,
        trip: &TripQuery,
        outbound_date: &str,
    ) -> Result<String, FetchError> {
        let mut params = self.base_params(trip, outbound_date);
        params.push(("show_hidden", "true".to_string()));
        params.push(("deep_search", "true".to_string()));
        params.push(("no_cache", "true".to_string()));
        params.push(("output", "html".to_string()));

        let body = self.get_text(&params).await?;
        let response: MarkupResponse = serde_json::from_str(&body)
            .map_err(|err| FetchError::Upstream(format!("undecodable search response: {err}")))?;
        markup_from_response(response)
    }

    async fn get_text(&self, params: &[(&'static str, String)]) -> Result<String, FetchError> {
        let response = self
            .http
            .get(SEARCH_URL)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    fn base_params(&self, trip: &TripQuery, outbound_date: &str) -> Vec<(&'static str, String)> {
        vec![
            ("engine", "google_flights".to_string()),
            ("departure_id", trip.origin.clone()),
            ("arrival_id", trip.arrival_param()),
            ("outbound_date", outbound_date.to_string()),
            ("type", ONE_WAY.to_string()),
            ("travel_class", trip.cabin.provider_code().to_string()),
            ("hl", trip.locale.clone()),
            ("gl", trip.country.clone()),
            ("currency", trip.currency.clone()),
            ("api_key", self.api_key.clone()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    error: Option<String>,
    best_flights: Option<Vec<Itinerary>>,
    other_flights: Option<Vec<Itinerary>>,
}

#[derive(Debug, Deserialize)]
struct MarkupResponse {
    error: Option<String>,
    html: Option<String>,
}

fn snapshot_from_response(
    response: SearchResponse,
    travel_date: &str,
    booking_date: String,
) -> Result<Snapshot, FetchError> {
    if let Some(error) = response.error {
        return Err(FetchError::Upstream(error));
    }

    // A valid result carries at least one of the two lists, possibly empty.
    // Neither present means the payload is not a flight search result.
    let (best, other) = match (response.best_flights, response.other_flights) {
        (None, None) => {
            return Err(FetchError::Upstream(
                "response has neither best_flights nor other_flights".to_string(),
            ))
        }
        (best, other) => (best.unwrap_or_default(), other.unwrap_or_default()),
    };

    Ok(Snapshot::new(booking_date, travel_date, best, other))
}

fn markup_from_response(response: MarkupResponse) -> Result<String, FetchError> {
    if let Some(error) = response.error {
        return Err(FetchError::Upstream(error));
    }
    response
        .html
        .ok_or_else(|| FetchError::Upstream("no html field in search response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> SearchResponse {
        serde_json::from_str(json).expect("decode failed")
    }

    #[test]
    fn keeps_only_the_itinerary_lists() {
        let response = decode(
            r#"{
                "search_metadata": { "status": "Success" },
                "best_flights": [
                    { "flights": [{ "flight_number": "VN 55" }], "price": 980 }
                ],
                "other_flights": []
            }"#,
        );

        let snapshot =
            snapshot_from_response(response, "2025-06-25", "2025-05-01 10:00:00".to_string())
                .expect("snapshot conversion failed");
        assert_eq!(snapshot.travel_date, "2025-06-25");
        assert_eq!(snapshot.booking_date, "2025-05-01 10:00:00");
        assert_eq!(snapshot.data.best_flights.len(), 1);
        assert!(snapshot.data.other_flights.is_empty());
    }

    #[test]
    fn provider_error_field_is_upstream() {
        let response = decode(r#"{ "error": "Google Flights hasn't returned any results" }"#);
        let err = snapshot_from_response(response, "2025-06-25", String::new())
            .expect_err("expected upstream error");
        assert!(matches!(err, FetchError::Upstream(_)));
    }

    #[test]
    fn payload_without_itinerary_lists_is_upstream() {
        let response = decode(r#"{ "search_metadata": { "status": "Success" } }"#);
        let err = snapshot_from_response(response, "2025-06-25", String::new())
            .expect_err("expected upstream error");
        assert!(matches!(err, FetchError::Upstream(_)));
    }

    #[test]
    fn markup_response_without_html_is_upstream() {
        let response: MarkupResponse =
            serde_json::from_str(r#"{ "search_metadata": {} }"#).expect("decode failed");
        let err = markup_from_response(response).expect_err("expected upstream error");
        assert!(matches!(err, FetchError::Upstream(_)));

        let response: MarkupResponse =
            serde_json::from_str(r#"{ "html": "<html></html>" }"#).expect("decode failed");
        assert_eq!(markup_from_response(response).unwrap(), "<html></html>");
    }

    #[test]
    fn cabin_class_codes() {
        assert_eq!(CabinClass::Economy.provider_code(), "1");
        assert_eq!(CabinClass::Business.provider_code(), "3");
        assert_eq!(CabinClass::try_from("Premium-Economy"), Ok(CabinClass::PremiumEconomy));
        assert!(CabinClass::try_from("first").is_err());
    }

    #[test]
    fn trip_query_joins_destinations() {
        let trip = TripQuery::default();
        assert_eq!(trip.arrival_param(), "JFK,LGA,EWR");
    }
}
