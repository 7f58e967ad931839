use thiserror::Error;

/// Library error type for viewer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A viewer was constructed without an attach point.
    #[error("viewer requires a mount point")]
    MissingMount,

    /// Transport-level failure talking to the items endpoint.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The items endpoint answered with a non-success status.
    #[error("{method} {url} returned {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// The configured items endpoint is not a usable base URL.
    #[error("invalid items endpoint: {0}")]
    InvalidEndpoint(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A file offered to the add flow is not a recognizable image.
    #[error("unsupported asset: {0}")]
    UnsupportedAsset(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
