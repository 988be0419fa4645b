//! HTTP API for the Bazaar checkout engine.
//!
//! Library target so the router can be exercised by integration tests.

pub mod actor;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
