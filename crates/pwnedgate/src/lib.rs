//! # pwnedgate
//!
//! Authentication decision step that checks whether a user's email address
//! appears in the Have I Been Pwned breach database.
//!
//! ## Features
//!
//! - **Decision node**: `true` when breaches are recorded, `false` otherwise
//! - **Shared state**: the breach payload is written to a copy of the state
//! - **Identity collaborator**: plug in any user store via [`IdentityResolver`]
//! - **API versions**: v3 (API key) and legacy v2
//!
//! ## Quick Start
//!
//! ```ignore
//! use pwnedgate::{BreachCheckNode, BreachClient, Directory, NodeConfig, SharedState, StaticIdentity};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::new().with_api_key("your_api_key");
//!     let directory = Directory::new().with_identity(
//!         "alice",
//!         "/",
//!         StaticIdentity::new().with_attribute("mail", "alice@example.com"),
//!     );
//!
//!     let http_client = BreachClient::http_client(&config)?;
//!     let node = BreachCheckNode::new(config, directory, http_client);
//!
//!     let (outcome, state) = node.process(&SharedState::for_user("alice", "/")).await?;
//!     println!("{outcome}: {:?}", state.get("breaches"));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
mod error;
pub mod identity;
pub mod node;
pub mod state;

pub use client::{BreachClient, BreachReport};
pub use config::{ApiVersion, NodeConfig, TransportFailurePolicy};
pub use error::{Error, LookupError, Result};
pub use identity::{Directory, Identity, IdentityResolver, StaticIdentity};
pub use node::{BreachCheckNode, NODE_NAME, Outcome};
pub use state::{REALM, SharedState, USERNAME};
