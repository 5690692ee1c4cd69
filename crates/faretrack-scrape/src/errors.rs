use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },

    #[error("unparseable price text '{text}' (stripped to '{stripped}')")]
    Price { text: String, stripped: String },
}
