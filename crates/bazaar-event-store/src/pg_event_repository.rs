//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use bazaar_core::error::DomainError;
use bazaar_core::repository::{EventRepository, StoredEvent, StreamAppend};

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infrastructure(context: &str, e: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{context}: {e}"))
}

fn stored_event_from_row(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        sequence_number: row.try_get("sequence_number")?,
        correlation_id: row.try_get("correlation_id")?,
        causation_id: row.try_get("causation_id")?,
        occurred_at: row.try_get("occurred_at")?,
    })
}

async fn current_version(
    tx: &mut Transaction<'_, Postgres>,
    aggregate_id: Uuid,
) -> Result<i64, DomainError> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
    )
    .bind(aggregate_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| infrastructure("failed to read stream version", &e))
}

/// Checks the stream version and inserts the events inside `tx`. A unique
/// violation on `(aggregate_id, sequence_number)` means a concurrent writer
/// got there first.
async fn append_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    append: &StreamAppend,
) -> Result<(), DomainError> {
    let actual = current_version(tx, append.aggregate_id).await?;
    if actual != append.expected_version {
        return Err(DomainError::ConcurrencyConflict {
            aggregate_id: append.aggregate_id,
            expected: append.expected_version,
            actual,
        });
    }

    for event in &append.events {
        sqlx::query(
            "INSERT INTO domain_events \
             (event_id, aggregate_id, event_type, payload, sequence_number, \
              correlation_id, causation_id, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.event_id)
        .bind(append.aggregate_id)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.sequence_number)
        .bind(event.correlation_id)
        .bind(event.causation_id)
        .bind(event.occurred_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            let unique_violation = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if unique_violation {
                DomainError::ConcurrencyConflict {
                    aggregate_id: append.aggregate_id,
                    expected: append.expected_version,
                    actual: append.expected_version + 1,
                }
            } else {
                infrastructure("failed to insert event", &e)
            }
        })?;
    }
    Ok(())
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            "SELECT event_id, aggregate_id, event_type, payload, sequence_number, \
                    correlation_id, causation_id, occurred_at \
             FROM domain_events \
             WHERE aggregate_id = $1 \
             ORDER BY sequence_number",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load events", &e))?;

        rows.iter()
            .map(stored_event_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| infrastructure("failed to decode event row", &e))
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.append_streams(&[StreamAppend {
            aggregate_id,
            expected_version,
            events: events.to_vec(),
        }])
        .await
    }

    async fn append_streams(&self, appends: &[StreamAppend]) -> Result<(), DomainError> {
        if appends.iter().all(StreamAppend::is_empty) {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infrastructure("failed to begin transaction", &e))?;
        for append in appends.iter().filter(|a| !a.is_empty()) {
            append_in_tx(&mut tx, append).await?;
        }
        tx.commit()
            .await
            .map_err(|e| infrastructure("failed to commit events", &e))?;

        debug!(
            streams = appends.len(),
            events = appends.iter().map(|a| a.events.len()).sum::<usize>(),
            "events appended"
        );
        Ok(())
    }
}
