//! Integration tests for the side-effect ledger and catalog adapters.

use bazaar_event_store::pg_catalog::{PgProductCatalog, PgVendorDirectory};
use bazaar_event_store::pg_side_effect_ledger::PgSideEffectLedger;
use bazaar_notifications::ledger::{SideEffectKey, SideEffectLedger};
use bazaar_shipping::application::ports::{ProductCatalog, VendorDirectory};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_vendor(
    pool: &PgPool,
    policy: Option<serde_json::Value>,
    address: Option<&str>,
) -> Uuid {
    let vendor_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO vendors (vendor_id, display_name, shipping_policy, return_address) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(vendor_id)
    .bind("Atelier Nord")
    .bind(policy)
    .bind(address)
    .execute(pool)
    .await
    .unwrap();
    vendor_id
}

async fn seed_product(pool: &PgPool, vendor_id: Uuid, price: &str, active: bool) -> Uuid {
    let product_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (product_id, vendor_id, title, unit_price, active) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(product_id)
    .bind(vendor_id)
    .bind("Wool scarf")
    .bind(price.parse::<Decimal>().unwrap())
    .bind(active)
    .execute(pool)
    .await
    .unwrap();
    product_id
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ledger_claims_each_key_once(pool: PgPool) {
    // Arrange
    let ledger = PgSideEffectLedger::new(pool);
    let key = SideEffectKey {
        recipient: "vendor:42".into(),
        transition: "order.new".into(),
        subject_id: Uuid::new_v4(),
    };

    // Act
    let first = ledger.claim(&key).await.unwrap();
    let second = ledger.claim(&key).await.unwrap();
    let other_subject = ledger
        .claim(&SideEffectKey {
            subject_id: Uuid::new_v4(),
            ..key.clone()
        })
        .await
        .unwrap();

    // Assert
    assert!(first);
    assert!(!second);
    assert!(other_subject);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_catalog_resolves_only_active_products(pool: PgPool) {
    // Arrange
    let vendor_id = seed_vendor(&pool, None, None).await;
    let live = seed_product(&pool, vendor_id, "49.90", true).await;
    let withdrawn = seed_product(&pool, vendor_id, "10.00", false).await;
    let catalog = PgProductCatalog::new(pool);

    // Act
    let resolved = catalog.resolve(live).await.unwrap().unwrap();
    let missing = catalog.resolve(withdrawn).await.unwrap();

    // Assert
    assert_eq!(resolved.vendor_id, vendor_id);
    assert_eq!(resolved.title, "Wool scarf");
    assert_eq!(resolved.unit_price, "49.90".parse::<Decimal>().unwrap());
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_vendor_directory_reads_policy_and_return_address(pool: PgPool) {
    // Arrange
    let policy = serde_json::json!({
        "base_cost": "15",
        "free_over": "200",
        "zones": [{"county": "Cluj", "base_cost": "9"}]
    });
    let with_policy = seed_vendor(&pool, Some(policy), Some("Str. Fabricii 3, Cluj")).await;
    let without_policy = seed_vendor(&pool, None, None).await;
    let directory = PgVendorDirectory::new(pool);

    // Act
    let policy = directory.shipping_policy(with_policy).await.unwrap().unwrap();
    let address = directory.return_address(with_policy).await.unwrap();

    // Assert
    assert_eq!(policy.base_cost, Some(Decimal::from(15)));
    assert_eq!(policy.free_over, Some(Decimal::from(200)));
    assert_eq!(policy.zones.len(), 1);
    assert_eq!(policy.zones[0].county.as_deref(), Some("Cluj"));
    assert_eq!(address.as_deref(), Some("Str. Fabricii 3, Cluj"));
    assert!(directory.shipping_policy(without_policy).await.unwrap().is_none());
    assert!(directory.return_address(Uuid::new_v4()).await.unwrap().is_none());
}
