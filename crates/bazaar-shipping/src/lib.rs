//! Bazaar — Shipping Quotes bounded context.
//!
//! Responsible for grouping cart lines by vendor, pricing each vendor's
//! shipment under that vendor's shipping policy, and composing the
//! per-seller quote used both for checkout previews and for the
//! authoritative charge at order placement.

pub mod application;
pub mod domain;
