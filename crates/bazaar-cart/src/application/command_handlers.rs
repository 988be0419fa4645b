//! Command handlers for the Cart context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use bazaar_core::aggregate::AggregateRoot;
use bazaar_core::clock::Clock;
use bazaar_core::error::DomainError;
use bazaar_core::repository::{EventRepository, StoredEvent, StreamAppend};
use uuid::Uuid;

use crate::domain::aggregates::Cart;
use crate::domain::commands::{AddCartLine, RemoveCartLine};
use crate::domain::events::{CartEvent, CartEventKind};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct CartCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `Cart` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(cart_id: Uuid, existing_events: &[StoredEvent]) -> Result<Cart, DomainError> {
    let mut cart = Cart::new(cart_id);
    for stored in existing_events {
        let kind: CartEventKind = stored.decode_payload()?;
        cart.apply(&CartEvent {
            metadata: stored.metadata(),
            kind,
        });
    }
    Ok(cart)
}

/// Loads a cart by id. A cart with no history is returned empty.
///
/// # Errors
///
/// Returns `DomainError` if event loading or deserialization fails.
pub async fn load_cart(cart_id: Uuid, repo: &dyn EventRepository) -> Result<Cart, DomainError> {
    let existing_events = repo.load_events(cart_id).await?;
    reconstitute(cart_id, &existing_events)
}

async fn persist(
    cart: &Cart,
    repo: &dyn EventRepository,
) -> Result<CartCommandResult, DomainError> {
    let append = StreamAppend::pending(cart);
    repo.append_events(append.aggregate_id, append.expected_version, &append.events)
        .await?;
    Ok(CartCommandResult {
        aggregate_id: append.aggregate_id,
        stored_events: append.events,
    })
}

/// Handles the `AddCartLine` command: loads the cart, adds the line, and
/// persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError` if validation, event loading or appending fails.
pub async fn handle_add_cart_line(
    command: &AddCartLine,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CartCommandResult, DomainError> {
    let mut cart = load_cart(command.cart_id, repo).await?;
    cart.add_line(command.product_id, command.qty, command.correlation_id, clock)?;
    persist(&cart, repo).await
}

/// Handles the `RemoveCartLine` command: loads the cart, removes the line,
/// and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError` if the product is not in the cart, or if event
/// loading or appending fails.
pub async fn handle_remove_cart_line(
    command: &RemoveCartLine,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CartCommandResult, DomainError> {
    let mut cart = load_cart(command.cart_id, repo).await?;
    cart.remove_line(command.product_id, command.correlation_id, clock)?;
    persist(&cart, repo).await
}

#[cfg(test)]
mod tests {
    use bazaar_core::error::DomainError;
    use bazaar_test_support::{
        FailingEventRepository, FixedClock, InMemoryEventRepository, RecordingEventRepository,
    };
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::events::CART_LINE_ADDED_EVENT_TYPE;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap())
    }

    #[tokio::test]
    async fn test_handle_add_cart_line_appends_at_version_zero_for_new_cart() {
        // Arrange
        let cart_id = Uuid::new_v4();
        let repo = RecordingEventRepository::new(Ok(vec![]));
        let command = AddCartLine {
            correlation_id: Uuid::new_v4(),
            cart_id,
            product_id: Uuid::new_v4(),
            qty: 2,
        };

        // Act
        let result = handle_add_cart_line(&command, &clock(), &repo).await.unwrap();

        // Assert
        assert_eq!(result.aggregate_id, cart_id);
        let appended = repo.appended_events();
        assert_eq!(appended.len(), 1);
        let (aggregate_id, expected_version, events) = &appended[0];
        assert_eq!(*aggregate_id, cart_id);
        assert_eq!(*expected_version, 0);
        assert_eq!(events[0].event_type, CART_LINE_ADDED_EVENT_TYPE);
    }

    #[tokio::test]
    async fn test_handle_remove_cart_line_after_add() {
        // Arrange
        let cart_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let repo = InMemoryEventRepository::new();
        handle_add_cart_line(
            &AddCartLine {
                correlation_id: Uuid::new_v4(),
                cart_id,
                product_id,
                qty: 1,
            },
            &clock(),
            &repo,
        )
        .await
        .unwrap();

        // Act
        handle_remove_cart_line(
            &RemoveCartLine {
                correlation_id: Uuid::new_v4(),
                cart_id,
                product_id,
            },
            &clock(),
            &repo,
        )
        .await
        .unwrap();

        // Assert
        let cart = load_cart(cart_id, &repo).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.version(), 2);
    }

    #[tokio::test]
    async fn test_handle_remove_cart_line_rejects_missing_product() {
        let repo = InMemoryEventRepository::new();
        let command = RemoveCartLine {
            correlation_id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
        };

        let result = handle_remove_cart_line(&command, &clock(), &repo).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_add_cart_line_propagates_repository_error() {
        let command = AddCartLine {
            correlation_id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            qty: 1,
        };

        let result = handle_add_cart_line(&command, &clock(), &FailingEventRepository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
