//! Domain layer for the Ordering & Fulfillment context.

pub mod address;
pub mod aggregates;
pub mod cancellation;
pub mod commands;
pub mod events;
pub mod status;
