use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One fetch-and-write result: two itinerary lists plus the timestamps
/// identifying when the search ran and which outbound date it queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub booking_date: String,
    pub travel_date: String,
    pub data: SnapshotData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub best_flights: Vec<Itinerary>,
    #[serde(default)]
    pub other_flights: Vec<Itinerary>,
}

impl Snapshot {
    pub fn new(
        booking_date: impl Into<String>,
        travel_date: impl Into<String>,
        best_flights: Vec<Itinerary>,
        other_flights: Vec<Itinerary>,
    ) -> Self {
        Self {
            booking_date: booking_date.into(),
            travel_date: travel_date.into(),
            data: SnapshotData {
                best_flights,
                other_flights,
            },
        }
    }

    pub fn itinerary_count(&self) -> usize {
        self.data.best_flights.len() + self.data.other_flights.len()
    }
}

/// One bookable flight option as the provider shapes it. Fields the
/// flattener does not read are carried in `extra` so a written snapshot
/// reproduces the provider payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub route_type: Option<String>,
    #[serde(default)]
    pub flights: Vec<Leg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layovers: Vec<Layover>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_emissions: Option<CarbonEmissions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub often_delayed_by_over_30_min: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layover {
    #[serde(default)]
    pub duration: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarbonEmissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub this_flight: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
