//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every variant maps to a stable, machine-readable code (see
/// [`DomainError::code`]) that the HTTP layer surfaces to callers.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The shipping address is missing required fields.
    #[error("invalid address: {0}")]
    AddressInvalid(String),

    /// The phone number does not match the expected pattern.
    #[error("invalid phone number: {0}")]
    PhoneInvalid(String),

    /// The email address does not match the expected pattern.
    #[error("invalid email address: {0}")]
    EmailInvalid(String),

    /// A legal-entity buyer is missing company details.
    #[error("invalid company details: {0}")]
    CompanyInvalid(String),

    /// Checkout was attempted against an empty cart.
    #[error("cart {0} is empty")]
    CartEmpty(Uuid),

    /// A cart line could not be resolved to a live product (strict resolution only).
    #[error("product {0} could not be resolved to a live product")]
    LineUnresolvable(Uuid),

    /// The order cannot be cancelled in its current state.
    #[error("order {0} cannot be cancelled")]
    NotCancellable(Uuid),

    /// A shipment status change is not allowed from the current status.
    #[error("shipment {shipment_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The shipment being changed.
        shipment_id: Uuid,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// The acting party is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The order was committed but the payment collaborator rejected the
    /// initiation call.
    #[error("payment initiation failed for order {order_id}: {reason}")]
    PaymentInitFailed {
        /// The committed order.
        order_id: Uuid,
        /// Collaborator-supplied failure reason.
        reason: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns the stable error code surfaced to callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AggregateNotFound(_) => "aggregate_not_found",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Validation(_) => "validation_error",
            Self::AddressInvalid(_) => "address_invalid",
            Self::PhoneInvalid(_) => "phone_invalid",
            Self::EmailInvalid(_) => "email_invalid",
            Self::CompanyInvalid(_) => "company_invalid",
            Self::CartEmpty(_) => "cart_empty",
            Self::LineUnresolvable(_) => "line_unresolvable",
            Self::NotCancellable(_) => "not_cancellable",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Forbidden(_) => "forbidden",
            Self::PaymentInitFailed { .. } => "payment_init_failed",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }

    /// Returns the order id when the error concerns an already committed order.
    #[must_use]
    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            Self::PaymentInitFailed { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }

    /// Returns `true` for optimistic-concurrency conflicts.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
