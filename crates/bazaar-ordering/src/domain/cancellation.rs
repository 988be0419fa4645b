//! Cancellation rules for whole orders and for single shipments.

use std::fmt;

use bazaar_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{OrderStatus, ShipmentStatus};

/// Checks whether an order may be cancelled: it must not be cancelled or
/// fulfilled, and every shipment must still be `PENDING` or already
/// `RETURNED`.
///
/// # Errors
///
/// Returns `DomainError::NotCancellable` otherwise.
pub fn ensure_cancellable(
    order_id: Uuid,
    order_status: OrderStatus,
    shipments: &[ShipmentStatus],
) -> Result<(), DomainError> {
    if order_status.is_closed() {
        return Err(DomainError::NotCancellable(order_id));
    }
    let untouched = shipments
        .iter()
        .all(|status| matches!(status, ShipmentStatus::Pending | ShipmentStatus::Returned));
    if !untouched {
        return Err(DomainError::NotCancellable(order_id));
    }
    Ok(())
}

/// Why a vendor cancelled their shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorCancelReason {
    /// The buyer could not be reached.
    NoAnswer,
    /// The buyer asked for the cancellation.
    ClientRequest,
    /// The goods are out of stock.
    StockIssue,
    /// The delivery address is unusable.
    AddressIssue,
    /// Payment could not be collected.
    PaymentIssue,
    /// Anything else; a note is required.
    Other,
}

impl VendorCancelReason {
    /// Returns the wire name of the reason.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoAnswer => "no_answer",
            Self::ClientRequest => "client_request",
            Self::StockIssue => "stock_issue",
            Self::AddressIssue => "address_issue",
            Self::PaymentIssue => "payment_issue",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for VendorCancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vendor's reason for cancelling a shipment, with its optional note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCancellation {
    /// Reason from the fixed taxonomy.
    pub reason: VendorCancelReason,
    /// Free-text note; required for `other`.
    pub note: Option<String>,
}

impl VendorCancellation {
    /// Builds a cancellation, trimming the note.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the reason is `other` and the note
    /// is missing or blank.
    pub fn new(reason: VendorCancelReason, note: Option<String>) -> Result<Self, DomainError> {
        let note = note
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        if reason == VendorCancelReason::Other && note.is_none() {
            return Err(DomainError::Validation(
                "a note is required when the cancellation reason is other".to_owned(),
            ));
        }
        Ok(Self { reason, note })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShipmentStatus::{Delivered, Pending, Preparing, Returned};

    #[test]
    fn test_order_with_pending_and_returned_shipments_is_cancellable() {
        let result = ensure_cancellable(Uuid::new_v4(), OrderStatus::Paid, &[Pending, Returned]);

        assert!(result.is_ok());
    }

    #[test]
    fn test_one_preparing_shipment_blocks_cancellation() {
        let order_id = Uuid::new_v4();

        let result = ensure_cancellable(order_id, OrderStatus::Pending, &[Pending, Preparing]);

        assert!(matches!(result, Err(DomainError::NotCancellable(id)) if id == order_id));
    }

    #[test]
    fn test_closed_orders_are_not_cancellable() {
        for status in [OrderStatus::Cancelled, OrderStatus::Fulfilled] {
            let result = ensure_cancellable(Uuid::new_v4(), status, &[Returned]);
            assert!(matches!(result, Err(DomainError::NotCancellable(_))));
        }
    }

    #[test]
    fn test_delivered_shipment_blocks_cancellation() {
        let result = ensure_cancellable(Uuid::new_v4(), OrderStatus::Paid, &[Delivered, Pending]);

        assert!(result.is_err());
    }

    #[test]
    fn test_other_reason_requires_note() {
        assert!(VendorCancellation::new(VendorCancelReason::Other, Some("  ".into())).is_err());

        let cancellation =
            VendorCancellation::new(VendorCancelReason::Other, Some(" damaged in storage ".into()))
                .unwrap();
        assert_eq!(cancellation.note.as_deref(), Some("damaged in storage"));
    }

    #[test]
    fn test_taxonomy_reasons_do_not_need_a_note() {
        let cancellation = VendorCancellation::new(VendorCancelReason::StockIssue, None).unwrap();

        assert_eq!(cancellation.reason.as_str(), "stock_issue");
        assert!(cancellation.note.is_none());
    }
}
