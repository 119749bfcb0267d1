//! `pwnedgate` - run a single breach decision from the command line.
//!
//! Seeds an in-memory identity from the arguments, runs the breach check node
//! against Have I Been Pwned, and prints the outcome and resulting shared state.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pwnedgate::{
    BreachCheckNode, BreachClient, BreachReport, Directory, NodeConfig, Outcome, REALM,
    SharedState, StaticIdentity, USERNAME,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Check a user's email address against Have I Been Pwned.
#[derive(Debug, Parser)]
#[command(name = "pwnedgate", version)]
struct Cli {
    /// Node configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long, env = "PWNEDGATE_CONFIG")]
    config: Option<PathBuf>,

    /// API key, overriding the configuration file.
    #[arg(long, env = "HIBP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Username to check.
    #[arg(short, long)]
    username: String,

    /// Realm the user belongs to.
    #[arg(short, long, default_value = "/")]
    realm: String,

    /// Mail attribute value for the user. Repeat for several values.
    #[arg(short, long)]
    mail: Vec<String>,

    /// Additional shared state, as a JSON object.
    #[arg(long)]
    state: Option<String>,
}

fn load_config(path: Option<&Path>) -> Result<NodeConfig> {
    let Some(path) = path else {
        return Ok(NodeConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    NodeConfig::from_json(&json)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Breach names recorded under the breaches key, if a payload was written.
fn recorded_breaches(state: &SharedState, breaches_key: &str) -> Option<Vec<String>> {
    let payload = state.get_str(breaches_key).filter(|p| !p.is_empty())?;
    match BreachReport::Found(payload.to_string()).breach_names() {
        Ok(names) => Some(names),
        Err(e) => {
            warn!(error = %e, "Breach payload is not a list of breaches");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the decision
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pwnedgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(api_key) = &cli.api_key {
        config = config.with_api_key(api_key.as_str());
    }

    let identity = cli
        .mail
        .iter()
        .fold(StaticIdentity::new(), |identity, mail| {
            identity.with_attribute(config.mail_attribute(), mail.as_str())
        });
    let directory = Directory::new().with_identity(&cli.username, &cli.realm, identity);

    let state = match &cli.state {
        Some(json) => SharedState::from_json(json).context("--state must be a JSON object")?,
        None => SharedState::new(),
    }
    .with(USERNAME, cli.username.as_str())
    .with(REALM, cli.realm.as_str());

    let http_client = BreachClient::http_client(&config)?;
    let node = BreachCheckNode::new(config, directory, http_client);

    info!(username = %cli.username, realm = %cli.realm, "Running breach check");
    let (outcome, new_state) = node.process(&state).await?;

    if outcome == Outcome::True {
        match recorded_breaches(&new_state, node.config().breaches_key()) {
            Some(names) => info!(breaches = ?names, "Account appears in known breaches"),
            None => warn!("Breached outcome without a breach payload"),
        }
    }

    println!("{outcome}");
    println!("{}", serde_json::to_string_pretty(&new_state)?);
    Ok(())
}
