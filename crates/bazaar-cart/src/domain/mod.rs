//! Domain layer for the Cart context.

pub mod aggregates;
pub mod commands;
pub mod events;
