//! Query handlers for the Cart context.

use bazaar_core::aggregate::AggregateRoot;
use bazaar_core::error::DomainError;
use bazaar_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use super::command_handlers::load_cart;
use crate::domain::aggregates::CartLine;

/// Read-only view of a cart.
#[derive(Debug, Serialize)]
pub struct CartView {
    /// The cart identifier.
    pub cart_id: Uuid,
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a cart by id. Unknown carts are reported as empty.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_cart_by_id(
    cart_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<CartView, DomainError> {
    let cart = load_cart(cart_id, repo).await?;
    Ok(CartView {
        cart_id,
        lines: cart.lines().to_vec(),
        version: cart.version(),
    })
}
