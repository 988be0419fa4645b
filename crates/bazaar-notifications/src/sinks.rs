//! Notification and email sinks.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Who an in-app notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    /// A buyer.
    Buyer,
    /// A vendor.
    Vendor,
}

impl fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => f.write_str("buyer"),
            Self::Vendor => f.write_str("vendor"),
        }
    }
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Machine-readable kind, e.g. `order.new`.
    pub kind: String,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Where the notification leads.
    pub link: Option<String>,
}

/// Transactional email templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    /// Order placed, with per-vendor return addresses.
    OrderConfirmation,
    /// Shipment in transit or delivered.
    ShipmentStatus,
    /// Carrier pickup booked.
    PickupScheduled,
    /// Invoice available.
    InvoiceIssued,
    /// A vendor cancelled their shipment.
    ShipmentCancelled,
    /// The order was cancelled.
    OrderCancelled,
}

impl EmailTemplate {
    /// Returns the template name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderConfirmation => "order_confirmation",
            Self::ShipmentStatus => "shipment_status",
            Self::PickupScheduled => "pickup_scheduled",
            Self::InvoiceIssued => "invoice_issued",
            Self::ShipmentCancelled => "shipment_cancelled",
            Self::OrderCancelled => "order_cancelled",
        }
    }
}

impl fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery failure reported by a sink.
#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct SinkError(pub String);

/// Fire-and-forget in-app notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    async fn notify(
        &self,
        recipient: RecipientKind,
        recipient_id: Uuid,
        notification: &Notification,
    ) -> Result<(), SinkError>;
}

/// Fire-and-forget transactional email.
#[async_trait]
pub trait EmailSink: Send + Sync {
    /// Sends one templated email.
    async fn send_email(
        &self,
        to: &str,
        template: EmailTemplate,
        data: &serde_json::Value,
    ) -> Result<(), SinkError>;
}

/// Notification sink that only logs. Stands in until a delivery channel is
/// wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn notify(
        &self,
        recipient: RecipientKind,
        recipient_id: Uuid,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        info!(
            %recipient,
            %recipient_id,
            kind = %notification.kind,
            title = %notification.title,
            "notification delivered"
        );
        Ok(())
    }
}

/// Email sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEmailSink;

#[async_trait]
impl EmailSink for LoggingEmailSink {
    async fn send_email(
        &self,
        to: &str,
        template: EmailTemplate,
        _data: &serde_json::Value,
    ) -> Result<(), SinkError> {
        info!(to, %template, "email sent");
        Ok(())
    }
}
