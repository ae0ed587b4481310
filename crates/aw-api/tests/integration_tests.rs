//! Integration tests for the Aware API.
//!
//! Each test builds the full router (session layer included) over an
//! in-memory ledger seeded with the demo accounts and a temporary
//! spreadsheet, then drives it with `tower::ServiceExt::oneshot`.

mod integration;
