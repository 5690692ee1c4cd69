pub mod error;
pub mod fetch;
pub mod flatten;
pub mod model;
pub mod snapshot;

pub use error::{FetchError, FlattenError, SnapshotError};
pub use fetch::{CabinClass, SerpApiClient, TripQuery};
pub use flatten::{FlatRecord, FlattenSummary, SnapshotRows};
pub use model::{CarbonEmissions, Itinerary, Layover, Leg, Snapshot, SnapshotData};
