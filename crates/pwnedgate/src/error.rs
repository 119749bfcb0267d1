//! Error types for breach decisions.

/// Result type alias for breach decisions.
pub type Result<T> = std::result::Result<T, Error>;

/// Breach decision error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing or construction error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Breach service answered with something other than 200 or 404.
    #[error("HTTP error code : {0}")]
    UnexpectedStatus(u16),

    /// Required shared state entry is absent or not a string.
    #[error("Missing shared state entry: {0}")]
    MissingState(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns true for failures that never reached a classifiable response.
    ///
    /// These are the errors the transport failure policy applies to. A request
    /// that could not be built (for example an invalid header value) was never
    /// sent and is not one of them.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder(),
            Self::Url(_) | Self::InvalidConfig(_) => true,
            _ => false,
        }
    }
}

/// Identity store failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No identity exists for the username in the realm.
    #[error("No identity {username} in realm {realm}")]
    NotFound {
        /// Username that was looked up.
        username: String,
        /// Realm that was searched.
        realm: String,
    },

    /// Identity repository failure.
    #[error("Identity repository error: {0}")]
    Repository(String),

    /// Session or token failure while reading the store.
    #[error("Session error: {0}")]
    Session(String),
}
