//! Shared test mocks and utilities for the Bazaar checkout engine.

mod catalog;
mod clock;
mod payments;
mod repository;
mod rng;
mod sinks;

pub use catalog::{InMemoryCatalog, InMemoryVendorDirectory};
pub use clock::FixedClock;
pub use payments::{RecordingPaymentInitiator, UnavailablePaymentInitiator};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    ReadFailsAfterCommitEventRepository, RecordingEventRepository,
};
pub use rng::{MockRng, SequenceRng};
pub use sinks::{RecordingEmailSink, RecordingNotificationSink};
