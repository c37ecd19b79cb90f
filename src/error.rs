//! Error types shared by the library

/// Errors produced while fetching, normalising or rendering content
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure talking to the content store
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The content store answered with a non-success status
    #[error("content store returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may contain error details)
        body: String,
    },

    /// The store response could not be decoded
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// A publication date did not parse as a timestamp
    #[error("invalid date {value:?} on document {document}")]
    InvalidDate { document: String, value: String },

    /// A document lacks a field the site needs
    #[error("document {document} is missing {field}")]
    MissingField {
        document: String,
        field: &'static str,
    },

    /// A next-page cursor was not a usable URL
    #[error("invalid page cursor {0:?}")]
    InvalidCursor(String),

    /// No document with this uid exists
    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    /// The API root did not advertise a master ref
    #[error("content store did not advertise a master ref")]
    MissingMasterRef,

    /// A page fetch is already running for this pagination state
    #[error("a page fetch is already in flight")]
    AdvanceInFlight,

    /// A page response arrived for a request that no longer owns the slot
    #[error("page request {0} is not the one in flight")]
    StaleRequest(u64),

    /// Template rendering failed
    #[error("template error")]
    Template(#[from] tera::Error),

    /// I/O error
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
