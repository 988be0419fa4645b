//! Aggregate roots for the Cart context.

use bazaar_core::aggregate::AggregateRoot;
use bazaar_core::clock::Clock;
use bazaar_core::error::DomainError;
use bazaar_core::event::EventMetadata;
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    CART_CLEARED_EVENT_TYPE, CART_LINE_ADDED_EVENT_TYPE, CART_LINE_REMOVED_EVENT_TYPE, CartCleared,
    CartEvent, CartEventKind, CartLineAdded, CartLineRemoved,
};

/// A product and quantity held in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// The product identifier.
    pub product_id: Uuid,
    /// Quantity, always at least one.
    pub qty: u32,
}

/// The aggregate root for a cart.
///
/// A cart with no events is simply empty; there is no creation step.
#[derive(Debug)]
pub struct Cart {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Lines in insertion order, one per product.
    lines: Vec<CartLine>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<CartEvent>,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            lines: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the lines currently in the cart.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns `true` when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        event_type: &str,
        kind: CartEventKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let event = CartEvent {
            metadata: EventMetadata::for_command(
                event_type,
                self.id,
                self.next_sequence_number(),
                correlation_id,
                clock.now(),
            ),
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Adds `qty` of a product, producing a `CartLineAdded` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `qty` is zero.
    pub fn add_line(
        &mut self,
        product_id: Uuid,
        qty: u32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if qty == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }
        self.record(
            CART_LINE_ADDED_EVENT_TYPE,
            CartEventKind::CartLineAdded(CartLineAdded {
                cart_id: self.id,
                product_id,
                qty,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes a product line, producing a `CartLineRemoved` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the product is not in the cart.
    pub fn remove_line(
        &mut self,
        product_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.lines.iter().any(|line| line.product_id == product_id) {
            return Err(DomainError::Validation(format!(
                "product {product_id} not found in cart {}",
                self.id
            )));
        }
        self.record(
            CART_LINE_REMOVED_EVENT_TYPE,
            CartEventKind::CartLineRemoved(CartLineRemoved {
                cart_id: self.id,
                product_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Empties the cart on behalf of checkout, producing a `CartCleared`
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CartEmpty` if there is nothing to clear.
    pub fn clear(
        &mut self,
        order_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::CartEmpty(self.id));
        }
        self.record(
            CART_CLEARED_EVENT_TYPE,
            CartEventKind::CartCleared(CartCleared {
                cart_id: self.id,
                order_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for Cart {
    type Event = CartEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            CartEventKind::CartLineAdded(payload) => {
                if let Some(line) = self
                    .lines
                    .iter_mut()
                    .find(|line| line.product_id == payload.product_id)
                {
                    line.qty = line.qty.saturating_add(payload.qty);
                } else {
                    self.lines.push(CartLine {
                        product_id: payload.product_id,
                        qty: payload.qty,
                    });
                }
            }
            CartEventKind::CartLineRemoved(payload) => {
                self.lines.retain(|line| line.product_id != payload.product_id);
            }
            CartEventKind::CartCleared(_) => self.lines.clear(),
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::event::DomainEvent;
    use bazaar_test_support::FixedClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_add_line_produces_line_added_event() {
        // Arrange
        let cart_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let mut cart = Cart::new(cart_id);

        // Act
        cart.add_line(product_id, 2, correlation_id, &clock()).unwrap();

        // Assert
        let events = cart.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), CART_LINE_ADDED_EVENT_TYPE);
        let meta = events[0].metadata();
        assert_eq!(meta.aggregate_id, cart_id);
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        match &events[0].kind {
            CartEventKind::CartLineAdded(payload) => {
                assert_eq!(payload.product_id, product_id);
                assert_eq!(payload.qty, 2);
            }
            other => panic!("expected CartLineAdded, got {other:?}"),
        }
    }

    #[test]
    fn test_adding_existing_product_merges_quantity() {
        // Arrange
        let product_id = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(product_id, 2, Uuid::new_v4(), &clock()).unwrap();
        cart.add_line(product_id, 3, Uuid::new_v4(), &clock()).unwrap();

        // Act
        cart.commit_uncommitted_events();

        // Assert
        assert_eq!(cart.lines(), &[CartLine { product_id, qty: 5 }]);
        assert_eq!(cart.version(), 2);
    }

    #[test]
    fn test_add_line_rejects_zero_quantity() {
        let mut cart = Cart::new(Uuid::new_v4());

        let result = cart.add_line(Uuid::new_v4(), 0, Uuid::new_v4(), &clock());

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(cart.uncommitted_events().is_empty());
    }

    #[test]
    fn test_remove_line_rejects_unknown_product() {
        let mut cart = Cart::new(Uuid::new_v4());

        let result = cart.remove_line(Uuid::new_v4(), Uuid::new_v4(), &clock());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_clear_empties_cart_and_records_order() {
        // Arrange
        let order_id = Uuid::new_v4();
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_line(Uuid::new_v4(), 1, Uuid::new_v4(), &clock()).unwrap();
        cart.commit_uncommitted_events();

        // Act
        cart.clear(order_id, Uuid::new_v4(), &clock()).unwrap();

        // Assert
        assert_eq!(cart.uncommitted_events()[0].metadata().sequence_number, 2);
        cart.commit_uncommitted_events();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_rejects_empty_cart() {
        let cart_id = Uuid::new_v4();
        let mut cart = Cart::new(cart_id);

        let result = cart.clear(Uuid::new_v4(), Uuid::new_v4(), &clock());

        assert!(matches!(result, Err(DomainError::CartEmpty(id)) if id == cart_id));
    }
}
