//! Dedupe ledger for side effects.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use bazaar_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one logical delivery: who receives it, for which transition,
/// about which subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideEffectKey {
    /// Recipient, e.g. `vendor:<id>` or `email:<address>`.
    pub recipient: String,
    /// Transition kind, e.g. `order.new`.
    pub transition: String,
    /// The order, shipment or shipment milestone the delivery is about.
    pub subject_id: Uuid,
}

impl fmt::Display for SideEffectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.recipient, self.transition, self.subject_id)
    }
}

/// Records which side effects have been claimed.
#[async_trait]
pub trait SideEffectLedger: Send + Sync {
    /// Claims `key`. Returns `true` for the first claim and `false` if the
    /// key was already claimed.
    async fn claim(&self, key: &SideEffectKey) -> Result<bool, DomainError>;
}

/// Process-local ledger.
#[derive(Debug, Default)]
pub struct InMemorySideEffectLedger {
    claimed: Mutex<HashSet<SideEffectKey>>,
}

impl InMemorySideEffectLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SideEffectLedger for InMemorySideEffectLedger {
    async fn claim(&self, key: &SideEffectKey) -> Result<bool, DomainError> {
        let mut claimed = self
            .claimed
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("ledger mutex poisoned: {e}")))?;
        Ok(claimed.insert(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_succeeds_once_per_key() {
        // Arrange
        let ledger = InMemorySideEffectLedger::new();
        let key = SideEffectKey {
            recipient: "buyer:1".into(),
            transition: "order.placed".into(),
            subject_id: Uuid::new_v4(),
        };

        // Act
        let first = ledger.claim(&key).await.unwrap();
        let second = ledger.claim(&key).await.unwrap();

        // Assert
        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn test_keys_differing_in_recipient_are_independent() {
        let ledger = InMemorySideEffectLedger::new();
        let subject_id = Uuid::new_v4();
        let key = |recipient: &str| SideEffectKey {
            recipient: recipient.into(),
            transition: "order.new".into(),
            subject_id,
        };

        assert!(ledger.claim(&key("vendor:a")).await.unwrap());
        assert!(ledger.claim(&key("vendor:b")).await.unwrap());
    }
}
