//! Commands for the Shipping Quotes context.

use bazaar_core::command::Command;
use uuid::Uuid;

use super::policy::Destination;
use crate::application::resolution::RequestedLine;

/// Request for a non-binding shipping quote.
#[derive(Debug, Clone)]
pub struct QuoteShipping {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Products and quantities to price.
    pub items: Vec<RequestedLine>,
    /// Where the goods are going.
    pub destination: Destination,
    /// Whether the buyer wants to collect in person where possible.
    pub is_pickup: bool,
}

impl Command for QuoteShipping {
    fn command_type(&self) -> &'static str {
        "shipping.quote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
