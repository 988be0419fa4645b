//! `PostgreSQL` persistence for the Bazaar checkout engine.
//!
//! Hosts the event store plus the read-only catalog and vendor directory
//! adapters and the side-effect ledger.

pub mod pg_catalog;
pub mod pg_event_repository;
pub mod pg_side_effect_ledger;
pub mod schema;
