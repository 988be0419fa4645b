//! Bazaar — Ordering & Fulfillment bounded context.
//!
//! Materializes a cart into an order with one shipment per vendor, drives
//! each shipment through its delivery lifecycle and guards cancellation.

pub mod application;
pub mod domain;
