//! End-to-end settlement flow: rate sync → price resolution → cart
//! totals → payment event → order → replay.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use bazaar_core::cart::aggregate;
use bazaar_core::money::Money;
use bazaar_core::rates::resolve;
use bazaar_db::{Database, DbConfig};
use bazaar_settle::processor::Outcome;
use bazaar_settle::provider::RateProvider;
use bazaar_settle::synchronizer::RateSynchronizer;
use bazaar_settle::{PaymentEventProcessor, PaymentGateway, SettleResult};

const SECRET: &str = "whsec_integration";

struct TableProvider(BTreeMap<String, i64>);

#[async_trait]
impl RateProvider for TableProvider {
    async fn fetch_rates(&self) -> SettleResult<BTreeMap<String, i64>> {
        Ok(self.0.clone())
    }
}

fn provider(entries: &[(&str, i64)]) -> Arc<TableProvider> {
    Arc::new(TableProvider(
        entries.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
    ))
}

/// The full storefront scenario:
/// USD rate=100; product A base price 500 → resolved {USD: 500};
/// a cart with two units → totals {USD: 1000};
/// payment event amount=1000 USD "evt_1" → exactly one order;
/// replay of "evt_1" → still exactly one order.
#[tokio::test]
async fn full_settlement_scenario() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    // Tracked currencies, rates via one synchronizer run
    db.currencies().track("USD", "$").await.unwrap();
    let sync = RateSynchronizer::new(
        db.clone(),
        provider(&[("USD", 100)]),
        Duration::from_secs(3000),
    );
    assert_eq!(sync.sync_once().await.unwrap(), 1);

    // Catalog + user + cart with two units of product A
    let product = db.products().create("Product A", 500, 500).await.unwrap();
    let user = db.users().create("buyer@example.com", "Buyer").await.unwrap();
    db.users().add_cart_item(&user.id, &product.id).await.unwrap();
    db.users().add_cart_item(&user.id, &product.id).await.unwrap();

    // Read path: resolve each item against one snapshot, then aggregate
    let (codes, snapshot) = db.currencies().snapshot().await.unwrap();
    let items = db.users().cart_items(&user.id).await.unwrap();

    let mut item_prices = Vec::new();
    for item in &items {
        let p = db.products().get_by_id(&item.product_id).await.unwrap().unwrap();
        let resolution = resolve(p.price(), &codes, &snapshot);
        assert_eq!(resolution.prices["USD"], Money::from_minor(500));
        item_prices.push(resolution.prices);
    }

    let totals = aggregate(&item_prices);
    assert_eq!(totals.totals["USD"], Money::from_minor(1000));
    assert!(totals.incomplete.is_empty());

    // Settlement path: the gateway confirms a 1000 USD charge
    let gateway = PaymentGateway::new(SECRET);
    let processor = PaymentEventProcessor::new(db.clone(), gateway.clone());

    let raw = br#"{"id":"evt_1","type":"charge.succeeded","amount":1000,"currency":"USD","payer_email":"buyer@example.com"}"#;
    let signature = gateway.sign(raw);

    let outcome = processor.process(raw, &signature).await.unwrap();
    let order_id = match outcome {
        Outcome::Finalized { order_id } => order_id,
        other => panic!("expected Finalized, got {:?}", other),
    };

    let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.amount, 1000);
    assert_eq!(order.currency, "USD");
    assert_eq!(order.source_event_id, "evt_1");
    assert!(db.users().cart_items(&user.id).await.unwrap().is_empty());

    // Replay of evt_1: absorbed, still exactly one order
    let replay = processor.process(raw, &signature).await.unwrap();
    assert_eq!(replay, Outcome::AlreadyProcessed { order_id });
    assert_eq!(db.orders().count_by_source_event("evt_1").await.unwrap(), 1);

    // Order history shows the single settlement
    let history = db.orders().list_by_owner(&user.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

/// A tracked currency with no rate yet flows through as unresolved on the
/// read path and never blocks settlement.
#[tokio::test]
async fn uninitialized_currency_is_unresolved_not_fatal() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.currencies().track("USD", "$").await.unwrap();
    db.currencies().track("GBP", "£").await.unwrap();

    let sync = RateSynchronizer::new(
        db.clone(),
        provider(&[("USD", 100)]), // GBP never arrives
        Duration::from_secs(3000),
    );
    sync.sync_once().await.unwrap();

    let (codes, snapshot) = db.currencies().snapshot().await.unwrap();
    let resolution = resolve(Money::from_minor(500), &codes, &snapshot);

    assert_eq!(resolution.prices["USD"], Money::from_minor(500));
    assert!(resolution.prices.get("GBP").is_none());
    assert!(resolution.unresolved.contains("GBP"));
}

/// Cart totals across mixed resolution states follow the exclude-and-flag
/// policy end to end.
#[tokio::test]
async fn mixed_rate_coverage_flags_incomplete_totals() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.currencies().track("USD", "$").await.unwrap();
    db.currencies().track("EUR", "€").await.unwrap();

    // First item priced while only USD had a rate
    let sync = RateSynchronizer::new(
        db.clone(),
        provider(&[("USD", 100)]),
        Duration::from_secs(3000),
    );
    sync.sync_once().await.unwrap();
    let (codes, snapshot) = db.currencies().snapshot().await.unwrap();
    let first = resolve(Money::from_minor(500), &codes, &snapshot).prices;

    // Second item priced after EUR arrived
    let sync = RateSynchronizer::new(
        db.clone(),
        provider(&[("USD", 100), ("EUR", 92)]),
        Duration::from_secs(3000),
    );
    sync.sync_once().await.unwrap();
    let (codes, snapshot) = db.currencies().snapshot().await.unwrap();
    let second = resolve(Money::from_minor(300), &codes, &snapshot).prices;

    let totals = aggregate(&[first, second]);
    assert_eq!(totals.totals["USD"], Money::from_minor(800));
    assert!(totals.incomplete.contains("EUR"));
    assert!(totals.totals.get("EUR").is_none());
}
