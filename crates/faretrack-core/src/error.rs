use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("SERPAPI_API_KEY is not set")]
    MissingApiKey,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid search response: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot JSON invalid for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("invalid snapshot glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read snapshot directory entry: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("unparseable calendar date '{0}'")]
    Date(String),

    #[error("failed to write output table: {0}")]
    Table(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
