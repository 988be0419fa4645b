//! Application layer for the Ordering & Fulfillment context.

pub mod command_handlers;
pub mod ports;
pub mod query_handlers;
