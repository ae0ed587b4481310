//! Integration test modules.

pub mod auth_tests;
pub mod batch_tests;
pub mod common;
pub mod health_tests;
pub mod submission_tests;
