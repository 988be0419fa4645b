//! `PostgreSQL` side-effect ledger.

use async_trait::async_trait;
use bazaar_core::error::DomainError;
use bazaar_notifications::ledger::{SideEffectKey, SideEffectLedger};
use sqlx::PgPool;

/// Ledger backed by the `side_effect_records` table. A claim is an insert
/// that does nothing on a key collision.
#[derive(Debug, Clone)]
pub struct PgSideEffectLedger {
    pool: PgPool,
}

impl PgSideEffectLedger {
    /// Creates a new `PgSideEffectLedger`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SideEffectLedger for PgSideEffectLedger {
    async fn claim(&self, key: &SideEffectKey) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "INSERT INTO side_effect_records (recipient, transition_kind, subject_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&key.recipient)
        .bind(&key.transition)
        .bind(key.subject_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(format!("failed to claim side effect: {e}")))?;
        Ok(result.rows_affected() == 1)
    }
}
