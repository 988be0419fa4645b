//! Bazaar — Cart bounded context.
//!
//! A cart is an event-sourced list of product lines keyed by a cart id. The
//! checkout clears it in the same atomic write that places the order.

pub mod application;
pub mod domain;
