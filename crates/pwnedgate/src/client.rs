//! Have I Been Pwned breached-account lookup.

use crate::config::NodeConfig;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

/// Header carrying the Have I Been Pwned API key.
pub const API_KEY_HEADER: &str = "hibp-api-key";

/// Classified breach service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreachReport {
    /// The account appears in no known breach (404).
    NotFound,
    /// The account appears in one or more breaches (200). Holds the raw body.
    Found(String),
}

impl BreachReport {
    /// Whether any breach was reported.
    #[must_use]
    pub const fn is_breached(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Payload stored in shared state: the raw body, or empty when not found.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::NotFound => "",
            Self::Found(body) => body,
        }
    }

    /// Names of the reported breaches.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON array of breach records.
    pub fn breach_names(&self) -> Result<Vec<String>> {
        match self {
            Self::NotFound => Ok(Vec::new()),
            Self::Found(body) => {
                let breaches: Vec<BreachSummary> = serde_json::from_str(body)?;
                Ok(breaches.into_iter().map(|b| b.name).collect())
            }
        }
    }
}

/// The part of a breach record this crate reads. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct BreachSummary {
    #[serde(rename = "Name")]
    name: String,
}

/// Builds the breached-account URL for an email address.
///
/// The address is pushed as a single percent-encoded path segment, so an
/// empty address yields a trailing empty segment.
///
/// # Errors
///
/// Returns an error if the configured base URL is invalid or cannot carry a
/// path.
pub fn lookup_url(config: &NodeConfig, email: &str) -> Result<Url> {
    let mut url = Url::parse(config.base_url())?;
    url.path_segments_mut()
        .map_err(|()| {
            Error::InvalidConfig(format!("{} cannot be a base URL", config.base_url()))
        })?
        .pop_if_empty()
        .extend([config.api_version().segment(), "breachedaccount", email]);
    Ok(url)
}

/// Breach service client.
#[derive(Debug, Clone)]
pub struct BreachClient {
    config: NodeConfig,
    http_client: reqwest::Client,
}

impl BreachClient {
    /// Creates a client over an existing HTTP client.
    #[must_use]
    pub const fn new(config: NodeConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Builds an HTTP client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn http_client(config: &NodeConfig) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(Into::into)
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Looks up an email address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatus`] for any status other than 200 or
    /// 404, and a transport error if the request or body read fails.
    pub async fn breached_account(&self, email: &str) -> Result<BreachReport> {
        let version = self.config.api_version();
        let url = lookup_url(&self.config, email)?;
        debug!(%url, "Querying breach service");

        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, version.accept())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, self.config.user_agent());
        if version.sends_api_key() {
            request = request.header(API_KEY_HEADER, self.config.api_key());
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("Response 404, no breaches found");
                Ok(BreachReport::NotFound)
            }
            StatusCode::OK => {
                let body = response.text().await?;
                debug!(bytes = body.len(), "Breaches found");
                Ok(BreachReport::Found(body))
            }
            status => {
                error!(status = status.as_u16(), "Breach service request failed");
                Err(Error::UnexpectedStatus(status.as_u16()))
            }
        }
    }
}
