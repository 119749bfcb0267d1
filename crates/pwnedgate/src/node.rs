//! The breach check decision node.
//!
//! Resolves the user's email address, asks Have I Been Pwned whether it has
//! been breached, and returns an outcome together with an updated copy of the
//! shared state.
//!
//! | Breach service                 | Outcome | `breaches` entry |
//! |--------------------------------|---------|------------------|
//! | 404                            | `false` | `""`             |
//! | 200                            | `true`  | raw body         |
//! | other status                   | error   | none             |
//! | unreachable (default policy)   | `true`  | untouched        |

use crate::client::BreachClient;
use crate::config::{NodeConfig, TransportFailurePolicy};
use crate::error::Result;
use crate::identity::{Identity, IdentityResolver};
use crate::state::{REALM, SharedState, USERNAME};
use std::fmt;
use tracing::{Instrument, Span, debug, error, warn};

/// Node name carried on every log record.
pub const NODE_NAME: &str = "HaveIBeenPwnedNode";

/// Decision outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The email address appears in at least one breach.
    True,
    /// No breach is recorded for the email address.
    False,
}

impl Outcome {
    /// Every outcome this node can select, in display order.
    pub const ALL: [Self; 2] = [Self::True, Self::False];

    /// Outcome id presented to the host.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl From<bool> for Outcome {
    fn from(breached: bool) -> Self {
        if breached { Self::True } else { Self::False }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Decision node checking the user's email address against breach records.
#[derive(Debug)]
pub struct BreachCheckNode<R> {
    client: BreachClient,
    resolver: R,
    span: Span,
}

impl<R: IdentityResolver> BreachCheckNode<R> {
    /// Creates a node from its configuration, identity resolver and HTTP client.
    ///
    /// See [`BreachClient::http_client`] for a client honouring the configured
    /// timeout.
    #[must_use]
    pub fn new(config: NodeConfig, resolver: R, http_client: reqwest::Client) -> Self {
        Self {
            client: BreachClient::new(config, http_client),
            resolver,
            span: tracing::info_span!("breach_check", node = NODE_NAME),
        }
    }

    /// Replaces the span diagnostics are recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &NodeConfig {
        self.client.config()
    }

    /// Runs the decision.
    ///
    /// The given state is never modified; the returned state is a copy with
    /// at most the configured breaches key added or replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingState`](crate::Error::MissingState) if the
    /// state lacks a username or realm, and
    /// [`Error::UnexpectedStatus`](crate::Error::UnexpectedStatus) if the
    /// breach service answers with anything but 200 or 404. Transport
    /// failures are only returned under [`TransportFailurePolicy::Fail`].
    pub async fn process(&self, state: &SharedState) -> Result<(Outcome, SharedState)> {
        self.decide(state).instrument(self.span.clone()).await
    }

    async fn decide(&self, state: &SharedState) -> Result<(Outcome, SharedState)> {
        let username = state.require_str(USERNAME)?;
        let realm = state.require_str(REALM)?;
        let mail = self.mail_address(username, realm);

        let mut new_state = state.clone();
        let config = self.client.config();

        match self.client.breached_account(&mail).await {
            Ok(report) => {
                new_state.put(config.breaches_key(), report.payload());
                Ok((Outcome::from(report.is_breached()), new_state))
            }
            Err(e) if e.is_transport() => match config.on_transport_error() {
                TransportFailurePolicy::AssumeBreached => {
                    error!(error = %e, "Breach lookup failed, assuming breached");
                    Ok((Outcome::True, new_state))
                }
                TransportFailurePolicy::Fail => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// First value of the mail attribute, or empty when none can be read.
    fn mail_address(&self, username: &str, realm: &str) -> String {
        let attribute = self.client.config().mail_attribute();
        debug!(attribute, "Looking for mail attribute");

        let values = self
            .resolver
            .resolve(username, realm)
            .and_then(|identity| identity.attribute(attribute));

        match values {
            Ok(values) => values.into_iter().next().map_or_else(
                || {
                    warn!(attribute, "Unable to find mail attribute");
                    String::new()
                },
                |mail| {
                    debug!(attribute, %mail, "Found mail attribute");
                    mail
                },
            ),
            Err(e) => {
                warn!(attribute, error = %e, "Error getting mail attribute");
                String::new()
            }
        }
    }
}
