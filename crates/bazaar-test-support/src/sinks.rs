//! Notification and email sink mocks.

use std::sync::Mutex;

use async_trait::async_trait;
use bazaar_notifications::sinks::{
    EmailSink, EmailTemplate, Notification, NotificationSink, RecipientKind, SinkError,
};
use uuid::Uuid;

/// Records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<(RecipientKind, Uuid, Notification)>>,
}

impl RecordingNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns what has been delivered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<(RecipientKind, Uuid, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(
        &self,
        recipient: RecipientKind,
        recipient_id: Uuid,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient, recipient_id, notification.clone()));
        Ok(())
    }
}

/// Records every email it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingEmailSink {
    sent: Mutex<Vec<(String, EmailTemplate, serde_json::Value)>>,
}

impl RecordingEmailSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns what has been sent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<(String, EmailTemplate, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSink for RecordingEmailSink {
    async fn send_email(
        &self,
        to: &str,
        template: EmailTemplate,
        data: &serde_json::Value,
    ) -> Result<(), SinkError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_owned(), template, data.clone()));
        Ok(())
    }
}
