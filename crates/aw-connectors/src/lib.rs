//! # aw-connectors
//!
//! Outbound connectors for the Aware platform.
//!
//! Provides a retrying HTTP client, a `BatchLedger` implementation that
//! talks to a contract gateway, and the text-generation client behind the
//! AI proxy endpoint.

pub mod http;
pub mod ledger_gateway;
pub mod testing;
pub mod text_generation;
pub mod traits;

pub use http::HttpClient;
pub use ledger_gateway::GatewayLedger;
pub use testing::{MockReply, MockTextGenerator};
pub use text_generation::{OllamaClient, OllamaConfig, TextGenerator};
pub use traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorHealth, ConnectorResult};
