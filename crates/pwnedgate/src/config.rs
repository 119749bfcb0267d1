//! Node configuration.
//!
//! The four host-facing settings (`apiKey`, `userAgent`, `mailAttr`,
//! `breaches`) keep the names and display order of the host's configuration
//! store. Nothing is validated: an empty API key is sent as-is.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Have I Been Pwned API root.
pub const DEFAULT_BASE_URL: &str = "https://haveibeenpwned.com/api";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Have I Been Pwned API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy v2 API: no API key, JSON accept header.
    V2,
    /// Current v3 API: requires `hibp-api-key`.
    #[default]
    V3,
}

impl ApiVersion {
    /// Path segment for this version.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    /// Value of the `Accept` header.
    #[must_use]
    pub const fn accept(self) -> &'static str {
        match self {
            Self::V2 => "application/json",
            Self::V3 => "*/*",
        }
    }

    /// Whether requests carry the `hibp-api-key` header.
    #[must_use]
    pub const fn sends_api_key(self) -> bool {
        matches!(self, Self::V3)
    }
}

/// What to decide when the breach service cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportFailurePolicy {
    /// Log the failure and report the account as breached, writing no payload.
    #[default]
    AssumeBreached,
    /// Propagate the failure to the host.
    Fail,
}

/// A host-facing configuration attribute and its display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigAttribute {
    /// Attribute name in the host's configuration store.
    pub name: &'static str,
    /// Display order.
    pub order: u32,
}

/// Breach check node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    api_key: String,
    user_agent: String,
    #[serde(rename = "mailAttr")]
    mail_attribute: String,
    #[serde(rename = "breaches")]
    breaches_key: String,
    api_version: ApiVersion,
    base_url: String,
    timeout_secs: u64,
    on_transport_error: TransportFailurePolicy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_key: "apiKey".to_string(),
            user_agent: "ForgeRock".to_string(),
            mail_attribute: "mail".to_string(),
            breaches_key: "breaches".to_string(),
            api_version: ApiVersion::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            on_transport_error: TransportFailurePolicy::default(),
        }
    }
}

impl NodeConfig {
    /// Host-facing attributes in display order.
    pub const ATTRIBUTES: [ConfigAttribute; 4] = [
        ConfigAttribute { name: "apiKey", order: 100 },
        ConfigAttribute { name: "userAgent", order: 200 },
        ConfigAttribute { name: "mailAttr", order: 300 },
        ConfigAttribute { name: "breaches", order: 400 },
    ];

    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// API key sent as `hibp-api-key`.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Identity attribute holding the email address.
    #[must_use]
    pub fn mail_attribute(&self) -> &str {
        &self.mail_attribute
    }

    /// Shared state key the breach payload is written to.
    #[must_use]
    pub fn breaches_key(&self) -> &str {
        &self.breaches_key
    }

    /// API version.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// API root, without the version segment.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Transport failure policy.
    #[must_use]
    pub const fn on_transport_error(&self) -> TransportFailurePolicy {
        self.on_transport_error
    }

    /// Value of a host-facing attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "apiKey" => Some(&self.api_key),
            "userAgent" => Some(&self.user_agent),
            "mailAttr" => Some(&self.mail_attribute),
            "breaches" => Some(&self.breaches_key),
            _ => None,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the mail attribute name.
    #[must_use]
    pub fn with_mail_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.mail_attribute = attribute.into();
        self
    }

    /// Sets the shared state key for the breach payload.
    #[must_use]
    pub fn with_breaches_key(mut self, key: impl Into<String>) -> Self {
        self.breaches_key = key.into();
        self
    }

    /// Sets the API version.
    #[must_use]
    pub const fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the transport failure policy.
    #[must_use]
    pub const fn with_on_transport_error(mut self, policy: TransportFailurePolicy) -> Self {
        self.on_transport_error = policy;
        self
    }
}
