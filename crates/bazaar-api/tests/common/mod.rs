//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bazaar_core::clock::Clock;
use bazaar_core::rng::DeterministicRng;
use bazaar_event_store::pg_catalog::{PgProductCatalog, PgVendorDirectory};
use bazaar_event_store::pg_event_repository::PgEventRepository;
use bazaar_event_store::pg_side_effect_ledger::PgSideEffectLedger;
use bazaar_notifications::dispatcher::SideEffectDispatcher;
use bazaar_ordering::application::ports::HostedPagePaymentInitiator;
use bazaar_test_support::{FixedClock, RecordingEmailSink, RecordingNotificationSink, SequenceRng};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use bazaar_api::routes;
use bazaar_api::state::{AppState, Collaborators, MarketplaceSettings};

/// Base URL of the hosted payment page in tests.
pub const PAYMENT_BASE_URL: &str = "https://pay.example.test";

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 4, 10, 12, 0, 0).unwrap(),
    ))
}

/// The full app plus the sinks its dispatcher delivers to.
pub struct TestApp {
    pub router: Router,
    pub notifications: Arc<RecordingNotificationSink>,
    pub emails: Arc<RecordingEmailSink>,
}

/// Build the full app router over Postgres adapters, deterministic
/// Clock/RNG and recording sinks. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with_rng(pool, SequenceRng::new(vec![]))
}

/// Build the full app with a custom `SequenceRng` for tests that schedule
/// pickups and assert on the AWB.
pub fn build_test_app_with_rng(pool: PgPool, rng: SequenceRng) -> TestApp {
    let clock = fixed_clock();
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let notifications = Arc::new(RecordingNotificationSink::new());
    let emails = Arc::new(RecordingEmailSink::new());
    let vendors = Arc::new(PgVendorDirectory::new(pool.clone()));
    let dispatcher = SideEffectDispatcher::new(
        Arc::new(PgSideEffectLedger::new(pool.clone())),
        notifications.clone(),
        emails.clone(),
        vendors.clone(),
    );
    let collaborators = Collaborators {
        catalog: Arc::new(PgProductCatalog::new(pool.clone())),
        vendors,
        payments: Arc::new(HostedPagePaymentInitiator::new(PAYMENT_BASE_URL)),
        dispatcher,
    };
    let event_repository = Arc::new(PgEventRepository::new(pool));
    let app_state = AppState::new(
        clock,
        rng,
        event_repository,
        collaborators,
        MarketplaceSettings::default(),
    );

    TestApp {
        router: routes::app(app_state),
        notifications,
        emails,
    }
}

/// Insert a vendor with the given shipping policy and return its id.
pub async fn seed_vendor(pool: &PgPool, policy: Value, return_address: Option<&str>) -> Uuid {
    let vendor_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO vendors (vendor_id, display_name, shipping_policy, return_address) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(vendor_id)
    .bind("Atelier Nord")
    .bind(policy)
    .bind(return_address)
    .execute(pool)
    .await
    .unwrap();
    vendor_id
}

/// Insert an active product and return its id.
pub async fn seed_product(pool: &PgPool, vendor_id: Uuid, title: &str, price: &str) -> Uuid {
    let product_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (product_id, vendor_id, title, unit_price) VALUES ($1, $2, $3, $4)",
    )
    .bind(product_id)
    .bind(vendor_id)
    .bind(title)
    .bind(price.parse::<Decimal>().unwrap())
    .execute(pool)
    .await
    .unwrap();
    product_id
}

/// Stop selling a product.
pub async fn deactivate_product(pool: &PgPool, product_id: Uuid) {
    sqlx::query("UPDATE products SET active = FALSE WHERE product_id = $1")
        .bind(product_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Add `qty` of each product to a fresh cart and return the cart id.
pub async fn fill_cart(app: &TestApp, lines: &[(Uuid, u32)]) -> Uuid {
    let cart_id = Uuid::new_v4();
    for (product_id, qty) in lines {
        let (status, _) = post_json(
            app.router.clone(),
            &format!("/api/v1/carts/{cart_id}/lines"),
            None,
            &json!({ "product_id": product_id, "qty": qty }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    cart_id
}

/// A valid Romanian delivery address.
pub fn address() -> Value {
    json!({
        "name": "Ana Pop",
        "phone": "0712345678",
        "email": "ana@example.com",
        "county": "Cluj",
        "city": "Cluj-Napoca",
        "street": "Str. Memorandumului 1"
    })
}

/// Actor headers: `(role, id)`.
pub type ActorHeaders<'a> = Option<(&'a str, Uuid)>;

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    actor: ActorHeaders<'_>,
    body: Body,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some((role, id)) = actor {
        builder = builder
            .header("x-actor-role", role)
            .header("x-actor-id", id.to_string());
    }

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    actor: ActorHeaders<'_>,
    body: &Value,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        uri,
        actor,
        Body::from(serde_json::to_vec(body).unwrap()),
    )
    .await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str, actor: ActorHeaders<'_>) -> (StatusCode, Value) {
    send(app, "GET", uri, actor, Body::empty()).await
}

/// Number of claimed side effects in the ledger.
pub async fn side_effect_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM side_effect_records")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Poll until the background dispatch has claimed at least `count` side
/// effects, giving up after about two seconds.
pub async fn wait_for_side_effects(pool: &PgPool, count: i64) -> i64 {
    let mut seen = 0;
    for _ in 0..100 {
        seen = side_effect_count(pool).await;
        if seen >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    seen
}

/// Poll `check` until it holds, giving up after about two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Parse a decimal money string.
pub fn money(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}
