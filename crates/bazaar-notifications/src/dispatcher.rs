//! Side-effect dispatcher.
//!
//! Runs after an order transition has been committed. Every intent is
//! claimed in the ledger before it is sent. Keys name the order or shipment
//! a delivery is about, so replaying committed events, or committing a
//! second identical event on a retried request, never delivers twice.
//! Failures are logged and swallowed.

use std::collections::BTreeMap;
use std::sync::Arc;

use bazaar_core::repository::StoredEvent;
use bazaar_ordering::application::query_handlers::OrderView;
use bazaar_ordering::domain::events::ORDER_PLACED_EVENT_TYPE;
use bazaar_shipping::application::ports::VendorDirectory;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::intents::{SideEffectIntent, intents_for};
use crate::ledger::SideEffectLedger;
use crate::sinks::{EmailSink, NotificationSink};

/// Counts of what one dispatch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Deliveries handed to a sink successfully.
    pub sent: usize,
    /// Deliveries skipped because their key was already claimed.
    pub skipped: usize,
    /// Deliveries lost to a ledger, sink or decoding failure.
    pub failed: usize,
}

/// Fans committed order events out to notification and email sinks.
#[derive(Clone)]
pub struct SideEffectDispatcher {
    ledger: Arc<dyn SideEffectLedger>,
    notifications: Arc<dyn NotificationSink>,
    emails: Arc<dyn EmailSink>,
    vendors: Arc<dyn VendorDirectory>,
}

impl SideEffectDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn SideEffectLedger>,
        notifications: Arc<dyn NotificationSink>,
        emails: Arc<dyn EmailSink>,
        vendors: Arc<dyn VendorDirectory>,
    ) -> Self {
        Self {
            ledger,
            notifications,
            emails,
            vendors,
        }
    }

    /// Delivers the side effects of `events`, committed against `order`.
    ///
    /// Never fails: every problem is logged and counted in the report.
    pub async fn dispatch(&self, order: &OrderView, events: &[StoredEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();
        let return_addresses = if events
            .iter()
            .any(|e| e.event_type == ORDER_PLACED_EVENT_TYPE)
        {
            self.return_addresses(order).await
        } else {
            BTreeMap::new()
        };

        for event in events {
            let intents = match intents_for(event, order, &return_addresses) {
                Ok(intents) => intents,
                Err(e) => {
                    warn!(
                        order_id = %order.order_id,
                        event_id = %event.event_id,
                        error = %e,
                        "could not map committed event to side effects"
                    );
                    report.failed += 1;
                    continue;
                }
            };
            for intent in intents {
                self.deliver(intent, &mut report).await;
            }
        }
        report
    }

    async fn deliver(&self, intent: SideEffectIntent, report: &mut DispatchReport) {
        let key = intent.key();
        match self.ledger.claim(&key).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(%key, "side effect already delivered, skipping");
                report.skipped += 1;
                return;
            }
            Err(e) => {
                warn!(%key, error = %e, "side-effect ledger unavailable, dropping delivery");
                report.failed += 1;
                return;
            }
        }

        let outcome = match &intent {
            SideEffectIntent::Notify {
                recipient,
                recipient_id,
                notification,
                ..
            } => {
                self.notifications
                    .notify(*recipient, *recipient_id, notification)
                    .await
            }
            SideEffectIntent::Email { to, template, data, .. } => {
                self.emails.send_email(to, *template, data).await
            }
        };
        match outcome {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(%key, error = %e, "side effect delivery failed");
                report.failed += 1;
            }
        }
    }

    async fn return_addresses(&self, order: &OrderView) -> BTreeMap<Uuid, String> {
        let mut addresses = BTreeMap::new();
        for shipment in &order.shipments {
            if addresses.contains_key(&shipment.vendor_id) {
                continue;
            }
            match self.vendors.return_address(shipment.vendor_id).await {
                Ok(Some(address)) => {
                    addresses.insert(shipment.vendor_id, address);
                }
                Ok(None) => {}
                Err(e) => warn!(
                    vendor_id = %shipment.vendor_id,
                    error = %e,
                    "return address lookup failed"
                ),
            }
        }
        addresses
    }
}
