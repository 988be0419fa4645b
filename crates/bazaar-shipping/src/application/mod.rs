//! Application layer for the Shipping Quotes context.

pub mod ports;
pub mod quote_handlers;
pub mod resolution;
