//! Commands for the Cart context.

use bazaar_core::command::Command;
use uuid::Uuid;

/// Command to add a product to a cart.
#[derive(Debug, Clone)]
pub struct AddCartLine {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
    /// Quantity to add; must be at least one.
    pub qty: u32,
}

impl Command for AddCartLine {
    fn command_type(&self) -> &'static str {
        "cart.add_line"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a product line from a cart.
#[derive(Debug, Clone)]
pub struct RemoveCartLine {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
}

impl Command for RemoveCartLine {
    fn command_type(&self) -> &'static str {
        "cart.remove_line"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
