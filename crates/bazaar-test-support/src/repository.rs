//! Test repositories — mock `EventRepository` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bazaar_core::error::DomainError;
use bazaar_core::repository::{EventRepository, StoredEvent, StreamAppend};
use uuid::Uuid;

/// An event repository that records all append calls. Returns the configured
/// events from `load_events` on every call and always accepts appends.
/// Streams written through `append_streams` are recorded one entry each.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    ///
    /// # Panics
    ///
    /// Panics if `load_result` is an `Err`; use `FailingEventRepository` for
    /// error scenarios.
    #[must_use]
    pub fn new(load_result: Result<Vec<StoredEvent>, DomainError>) -> Self {
        Self {
            load_result: Mutex::new(load_result.expect(
                "RecordingEventRepository::new does not accept Err; use FailingEventRepository",
            )),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all events that were appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }

    async fn append_streams(&self, appends: &[StreamAppend]) -> Result<(), DomainError> {
        let mut appended = self.appended.lock().unwrap();
        for append in appends {
            appended.push((
                append.aggregate_id,
                append.expected_version,
                append.events.clone(),
            ));
        }
        Ok(())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn append_streams(&self, _appends: &[StreamAppend]) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_streams(&self, _appends: &[StreamAppend]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An in-memory event store with the same optimistic-concurrency semantics
/// as the Postgres adapter: a stream's current version must equal the
/// writer's expected version, and multi-stream appends are all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event in one stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stream(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        self.streams
            .lock()
            .unwrap()
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the ids of every non-empty stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stream_ids(&self) -> Vec<Uuid> {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn check_version(
        streams: &HashMap<Uuid, Vec<StoredEvent>>,
        aggregate_id: Uuid,
        expected_version: i64,
    ) -> Result<(), DomainError> {
        let actual = streams.get(&aggregate_id).map_or(0, |events| events.len() as i64);
        if actual == expected_version {
            Ok(())
        } else {
            Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            })
        }
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream(aggregate_id))
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.lock().unwrap();
        Self::check_version(&streams, aggregate_id, expected_version)?;
        streams
            .entry(aggregate_id)
            .or_default()
            .extend_from_slice(events);
        Ok(())
    }

    async fn append_streams(&self, appends: &[StreamAppend]) -> Result<(), DomainError> {
        let mut streams = self.streams.lock().unwrap();
        for append in appends {
            Self::check_version(&streams, append.aggregate_id, append.expected_version)?;
        }
        for append in appends {
            streams
                .entry(append.aggregate_id)
                .or_default()
                .extend_from_slice(&append.events);
        }
        Ok(())
    }
}

/// An in-memory store whose reads start failing once a multi-stream append
/// has committed, as when the database goes away right after checkout.
#[derive(Debug, Default)]
pub struct ReadFailsAfterCommitEventRepository {
    inner: InMemoryEventRepository,
    committed: AtomicBool,
}

impl ReadFailsAfterCommitEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event in one stream, bypassing the failure.
    pub fn stream(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        self.inner.stream(aggregate_id)
    }
}

#[async_trait]
impl EventRepository for ReadFailsAfterCommitEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        if self.committed.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        self.inner.load_events(aggregate_id).await
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.inner
            .append_events(aggregate_id, expected_version, events)
            .await
    }

    async fn append_streams(&self, appends: &[StreamAppend]) -> Result<(), DomainError> {
        self.inner.append_streams(appends).await?;
        self.committed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
