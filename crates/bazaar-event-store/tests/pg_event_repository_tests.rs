//! Integration tests for `PgEventRepository`.

use bazaar_core::error::DomainError;
use bazaar_core::repository::{EventRepository, StoredEvent, StreamAppend};
use bazaar_event_store::pg_event_repository::PgEventRepository;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

fn cart_event(cart_id: Uuid, sequence_number: i64) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        aggregate_id: cart_id,
        event_type: "cart.line_added".to_string(),
        payload: serde_json::json!({"product_id": Uuid::new_v4(), "qty": 1}),
        sequence_number,
        correlation_id: Uuid::new_v4(),
        causation_id: Uuid::new_v4(),
        occurred_at: Utc::now(),
    }
}

fn expect_conflict(result: Result<(), DomainError>, stream: Uuid, expected: i64, actual: i64) {
    match result {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id,
            expected: e,
            actual: a,
        }) => {
            assert_eq!(aggregate_id, stream);
            assert_eq!(e, expected);
            assert_eq!(a, actual);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_stream_loads_as_empty(pool: PgPool) {
    let repo = PgEventRepository::new(pool);

    let events = repo.load_events(Uuid::new_v4()).await.unwrap();

    assert!(events.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_appended_event_loads_back_with_metadata(pool: PgPool) {
    // Arrange
    let repo = PgEventRepository::new(pool);
    let cart_id = Uuid::new_v4();
    let event = cart_event(cart_id, 1);

    // Act
    repo.append_events(cart_id, 0, std::slice::from_ref(&event))
        .await
        .unwrap();
    let loaded = repo.load_events(cart_id).await.unwrap();

    // Assert
    assert_eq!(loaded.len(), 1);
    let e = &loaded[0];
    assert_eq!(e.event_id, event.event_id);
    assert_eq!(e.event_type, "cart.line_added");
    assert_eq!(e.payload, event.payload);
    assert_eq!(e.correlation_id, event.correlation_id);
    assert_eq!(e.causation_id, event.causation_id);
    assert_eq!(
        e.occurred_at.timestamp_micros(),
        event.occurred_at.timestamp_micros()
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_events_load_in_sequence_order(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let cart_id = Uuid::new_v4();

    repo.append_events(cart_id, 0, &[cart_event(cart_id, 1), cart_event(cart_id, 2)])
        .await
        .unwrap();
    repo.append_events(cart_id, 2, &[cart_event(cart_id, 3)])
        .await
        .unwrap();

    let sequence: Vec<i64> = repo
        .load_events(cart_id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.sequence_number)
        .collect();
    assert_eq!(sequence, vec![1, 2, 3]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_stale_expected_version_is_a_conflict(pool: PgPool) {
    // Arrange
    let repo = PgEventRepository::new(pool);
    let order_id = Uuid::new_v4();
    repo.append_events(order_id, 0, &[cart_event(order_id, 1), cart_event(order_id, 2)])
        .await
        .unwrap();

    // Act
    let result = repo
        .append_events(order_id, 1, &[cart_event(order_id, 2)])
        .await;

    // Assert
    expect_conflict(result, order_id, 1, 2);
    assert_eq!(repo.load_events(order_id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_empty_append_writes_nothing(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let cart_id = Uuid::new_v4();

    repo.append_events(cart_id, 0, &[]).await.unwrap();

    assert!(repo.load_events(cart_id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_append_streams_writes_every_stream(pool: PgPool) {
    // Arrange
    let repo = PgEventRepository::new(pool);
    let order_id = Uuid::new_v4();
    let cart_id = Uuid::new_v4();
    repo.append_events(cart_id, 0, &[cart_event(cart_id, 1)])
        .await
        .unwrap();

    // Act
    repo.append_streams(&[
        StreamAppend {
            aggregate_id: order_id,
            expected_version: 0,
            events: vec![cart_event(order_id, 1)],
        },
        StreamAppend {
            aggregate_id: cart_id,
            expected_version: 1,
            events: vec![cart_event(cart_id, 2)],
        },
    ])
    .await
    .unwrap();

    // Assert
    assert_eq!(repo.load_events(order_id).await.unwrap().len(), 1);
    assert_eq!(repo.load_events(cart_id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_append_streams_is_all_or_nothing(pool: PgPool) {
    // Arrange: the cart moved on since the writer loaded it.
    let repo = PgEventRepository::new(pool);
    let order_id = Uuid::new_v4();
    let cart_id = Uuid::new_v4();
    repo.append_events(cart_id, 0, &[cart_event(cart_id, 1), cart_event(cart_id, 2)])
        .await
        .unwrap();

    // Act
    let result = repo
        .append_streams(&[
            StreamAppend {
                aggregate_id: order_id,
                expected_version: 0,
                events: vec![cart_event(order_id, 1)],
            },
            StreamAppend {
                aggregate_id: cart_id,
                expected_version: 1,
                events: vec![cart_event(cart_id, 2)],
            },
        ])
        .await;

    // Assert
    expect_conflict(result, cart_id, 1, 2);
    assert!(repo.load_events(order_id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_writers_on_one_stream_yield_one_winner(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let cart_id = Uuid::new_v4();
    let first = [cart_event(cart_id, 1)];
    let second = [cart_event(cart_id, 1)];

    let (a, b) = tokio::join!(
        repo.append_events(cart_id, 0, &first),
        repo.append_events(cart_id, 0, &second),
    );

    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    let loser = if a.is_err() { a } else { b };
    assert!(loser.unwrap_err().is_conflict());
    assert_eq!(repo.load_events(cart_id).await.unwrap().len(), 1);
}
