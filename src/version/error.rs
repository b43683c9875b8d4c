use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{repository} returned {status}")]
    Status {
        repository: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid repository URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No stable version found in {repository}")]
    NoStableVersion { repository: String },

    #[error("No active repositories configured")]
    NoRepositories,

    #[error("All {tried} repositories failed, last error: {last}")]
    Exhausted {
        tried: usize,
        #[source]
        last: Box<LookupError>,
    },
}
