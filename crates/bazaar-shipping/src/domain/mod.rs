//! Domain layer for the Shipping Quotes context.

pub mod commands;
pub mod grouping;
pub mod policy;
pub mod pricing;
pub mod quote;
