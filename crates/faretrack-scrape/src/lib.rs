pub mod errors;
pub mod extract;
pub mod model;

pub use errors::ExtractError;
pub use extract::{extract_flights, extract_flights_with_booking_date};
pub use model::MarkupRecord;
