//! Route modules and router assembly.

pub mod carts;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod shipments;

use axum::Router;
use bazaar_core::repository::StoredEvent;
use bazaar_ordering::application::query_handlers::order_view;
use bazaar_ordering::domain::aggregates::Order;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the storefront origins once they are fixed.
    Router::new()
        .merge(health::router())
        .nest("/api/v1/checkout", checkout::router())
        .nest("/api/v1/carts", carts::router())
        .nest(
            "/api/v1/orders",
            orders::router().merge(shipments::router()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Hands committed events to the side-effect dispatcher on a background
/// task. The response never waits for delivery.
pub(crate) fn dispatch_side_effects(state: &AppState, order: &Order, events: Vec<StoredEvent>) {
    if events.is_empty() {
        return;
    }
    let view = order_view(order, state.settings.vat_rate_percent);
    let dispatcher = state.collaborators.dispatcher.clone();
    tokio::spawn(async move {
        let report = dispatcher.dispatch(&view, &events).await;
        debug!(
            order_id = %view.order_id,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "side effects dispatched"
        );
    });
}

#[cfg(test)]
pub(crate) mod test_state {
    //! In-memory application state for router unit tests.

    use std::sync::{Arc, Mutex};

    use bazaar_core::clock::Clock;
    use bazaar_core::repository::EventRepository;
    use bazaar_core::rng::DeterministicRng;
    use bazaar_notifications::dispatcher::SideEffectDispatcher;
    use bazaar_notifications::ledger::InMemorySideEffectLedger;
    use bazaar_ordering::application::ports::PaymentInitiator;
    use bazaar_test_support::{
        FixedClock, InMemoryCatalog, InMemoryEventRepository, InMemoryVendorDirectory,
        RecordingEmailSink, RecordingNotificationSink, RecordingPaymentInitiator, SequenceRng,
    };
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bazaar_cart::application::command_handlers::handle_add_cart_line;
    use bazaar_cart::domain::commands::AddCartLine;
    use bazaar_ordering::application::command_handlers::handle_place_order;
    use bazaar_ordering::domain::address::{CustomerType, PaymentMethod, ShippingAddress};
    use bazaar_ordering::domain::commands::PlaceOrder;
    use bazaar_shipping::domain::policy::VendorShippingPolicy;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::state::{AppState, Collaborators, MarketplaceSettings};

    /// Handles to the in-memory collaborators behind a test state.
    pub(crate) struct TestWorld {
        pub(crate) state: AppState,
        pub(crate) repo: Arc<InMemoryEventRepository>,
        pub(crate) catalog: Arc<InMemoryCatalog>,
        pub(crate) vendors: Arc<InMemoryVendorDirectory>,
        pub(crate) payments: Arc<RecordingPaymentInitiator>,
        pub(crate) notifications: Arc<RecordingNotificationSink>,
    }

    pub(crate) fn world() -> TestWorld {
        world_with_payments(None)
    }

    pub(crate) fn world_with_payments(
        payments_override: Option<Arc<dyn PaymentInitiator>>,
    ) -> TestWorld {
        let repo = Arc::new(InMemoryEventRepository::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let vendors = Arc::new(InMemoryVendorDirectory::new());
        let payments = Arc::new(RecordingPaymentInitiator::new());
        let notifications = Arc::new(RecordingNotificationSink::new());
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap(),
        ));
        let rng: Arc<Mutex<dyn DeterministicRng + Send>> =
            Arc::new(Mutex::new(SequenceRng::new(vec![1_500_000_000])));
        let dispatcher = SideEffectDispatcher::new(
            Arc::new(InMemorySideEffectLedger::new()),
            notifications.clone(),
            Arc::new(RecordingEmailSink::new()),
            vendors.clone(),
        );
        let collaborators = Collaborators {
            catalog: catalog.clone(),
            vendors: vendors.clone(),
            payments: payments_override.unwrap_or_else(|| payments.clone()),
            dispatcher,
        };
        let event_repository: Arc<dyn EventRepository> = repo.clone();
        let state = AppState::new(
            clock,
            rng,
            event_repository,
            collaborators,
            MarketplaceSettings::default(),
        );
        TestWorld {
            state,
            repo,
            catalog,
            vendors,
            payments,
            notifications,
        }
    }

    /// An order placed by [`seed_order`].
    pub(crate) struct SeededOrder {
        pub(crate) order_id: Uuid,
        pub(crate) vendor_id: Uuid,
        pub(crate) shipment_id: Uuid,
    }

    /// Places a one-vendor order for `buyer_id`.
    pub(crate) async fn seed_order(
        world: &TestWorld,
        buyer_id: Option<Uuid>,
        payment_method: PaymentMethod,
    ) -> SeededOrder {
        let vendor_id = Uuid::new_v4();
        world.vendors.set_policy(
            vendor_id,
            VendorShippingPolicy {
                base_cost: Some(Decimal::from(15)),
                ..VendorShippingPolicy::default()
            },
        );
        let mug = world.catalog.add_product(vendor_id, "Mug", "50");
        let cart_id = Uuid::new_v4();
        handle_add_cart_line(
            &AddCartLine {
                correlation_id: Uuid::new_v4(),
                cart_id,
                product_id: mug.product_id,
                qty: 1,
            },
            world.state.clock.as_ref(),
            &*world.state.event_repository,
        )
        .await
        .unwrap();
        let result = handle_place_order(
            &PlaceOrder {
                correlation_id: Uuid::new_v4(),
                buyer_id,
                cart_id,
                address: ShippingAddress {
                    name: "Ana Pop".to_owned(),
                    phone: "0712345678".to_owned(),
                    email: "ana@example.com".to_owned(),
                    county: "Cluj".to_owned(),
                    city: "Cluj-Napoca".to_owned(),
                    street: "Str. Memorandumului 1".to_owned(),
                    ..ShippingAddress::default()
                },
                payment_method,
                customer_type: CustomerType::PF,
                is_pickup: false,
            },
            world.state.clock.as_ref(),
            &*world.state.event_repository,
            &*world.state.collaborators.catalog,
            &*world.state.collaborators.vendors,
            &world.state.settings.quote,
        )
        .await
        .unwrap();
        SeededOrder {
            order_id: result.order_id,
            vendor_id,
            shipment_id: result.order.shipments()[0].id,
        }
    }

    /// Sends one request through `app` as `actor` (role, id) and returns the
    /// status with the decoded JSON body.
    pub(crate) async fn send(
        app: Router,
        method: &str,
        uri: &str,
        actor: Option<(&str, Uuid)>,
        body: Option<Value>,
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
        let body = body.map_or_else(Body::empty, |b| Body::from(serde_json::to_vec(&b).unwrap()));
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Yields until the spawned dispatch has delivered `count` notifications.
    pub(crate) async fn wait_for_notifications(world: &TestWorld, count: usize) {
        for _ in 0..100 {
            if world.notifications.sent().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
    }
}
