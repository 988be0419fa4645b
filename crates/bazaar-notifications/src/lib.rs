//! Bazaar — side-effect dispatch.
//!
//! Maps committed order events to notifications and emails, claims a dedupe
//! key for each in the ledger and sends it. Nothing here can fail or undo
//! the transition that caused it.

pub mod dispatcher;
pub mod intents;
pub mod ledger;
pub mod sinks;
pub mod templates;
