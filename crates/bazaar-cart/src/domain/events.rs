//! Domain events for the Cart context.

use bazaar_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type identifier for [`CartLineAdded`].
pub const CART_LINE_ADDED_EVENT_TYPE: &str = "cart.line_added";
/// Event type identifier for [`CartLineRemoved`].
pub const CART_LINE_REMOVED_EVENT_TYPE: &str = "cart.line_removed";
/// Event type identifier for [`CartCleared`].
pub const CART_CLEARED_EVENT_TYPE: &str = "cart.cleared";

/// Emitted when a product is added to a cart. Adding a product that is
/// already present increases its quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineAdded {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
    /// Quantity added.
    pub qty: u32,
}

/// Emitted when a product line is removed from a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineRemoved {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
}

/// Emitted when checkout empties the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCleared {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// The order the cart was converted into.
    pub order_id: Uuid,
}

/// Event payload variants for the Cart context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CartEventKind {
    /// A line was added or its quantity increased.
    CartLineAdded(CartLineAdded),
    /// A line was removed.
    CartLineRemoved(CartLineRemoved),
    /// Every line was removed by checkout.
    CartCleared(CartCleared),
}

/// Domain event envelope for the Cart context.
#[derive(Debug, Clone)]
pub struct CartEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: CartEventKind,
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            CartEventKind::CartLineAdded(_) => CART_LINE_ADDED_EVENT_TYPE,
            CartEventKind::CartLineRemoved(_) => CART_LINE_REMOVED_EVENT_TYPE,
            CartEventKind::CartCleared(_) => CART_CLEARED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).unwrap_or(serde_json::Value::Null)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
