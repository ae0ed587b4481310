//! # aw-api
//!
//! HTTP API for the Aware material-tracking platform.
//!
//! Exposes session-based authentication, the batch review lifecycle backed
//! by a [`BatchLedger`](aw_core::BatchLedger), spreadsheet-backed submissions,
//! wallet balances and the AI text-generation proxy.

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use error::ApiError;
pub use server::{ApiDoc, ApiServer, ApiServerConfig};
pub use state::AppState;
