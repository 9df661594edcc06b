//! Create, read, update, patch and delete against the in-memory driver.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{Product, products};
use mdu::prelude::*;
use mdu::{ErrorKind, bson};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_product_lifecycle() {
    let (_, products) = products();
    let ctx = OpContext::with_timeout(Duration::from_secs(5));

    let mut product = Product::new("A", 100);
    let id = products.create(&ctx, &mut product).await.unwrap();
    assert!(!id.is_empty());

    let found = products.find_by_id(&ctx, &id).await.unwrap();
    assert_eq!(found.name, "A");
    assert_eq!(found.price, 100);
    assert!(found.base.dates.created_at.timestamp_millis() > 0);
    assert!(found.base.dates.updated_at.timestamp_millis() > 0);

    // Stored datetimes have millisecond precision.
    tokio::time::sleep(Duration::from_millis(5)).await;

    let mut found = found;
    found.name = "B".into();
    products.update(&ctx, &mut found).await.unwrap();

    let updated = products.find_by_id(&ctx, &id).await.unwrap();
    assert_eq!(updated.name, "B");
    assert!(updated.base.dates.updated_at > updated.base.dates.created_at);

    products.delete(&ctx, &mut found).await.unwrap();
    let err = products.find_by_id(&ctx, &id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_assigns_unique_ids() {
    let (_, products) = products();
    let ctx = OpContext::background();

    let mut ids = HashSet::new();
    for n in 0..25 {
        let mut product = Product::new("Widget", n);
        let id = products.create(&ctx, &mut product).await.unwrap();
        assert!(!id.is_empty());
        assert!(ids.insert(id));
    }
}

#[tokio::test]
async fn test_create_preserves_supplied_id() {
    let (driver, products) = products();
    let ctx = OpContext::background();

    let mut product = Product::new("Widget", 3);
    product.set_id("widget-0001".into());
    let id = products.create(&ctx, &mut product).await.unwrap();

    assert_eq!(id, "widget-0001");
    assert_eq!(product.id(), "widget-0001");
    assert_eq!(driver.documents()[0].get_str("_id").unwrap(), "widget-0001");
}

#[tokio::test]
async fn test_round_trip_matches_last_persisted() {
    let (driver, products) = products();
    let ctx = OpContext::background();

    let mut product = Product::new("Kettle", 35);
    let id = products.create(&ctx, &mut product).await.unwrap();

    let found = products.find_by_id(&ctx, &id).await.unwrap();
    let stored = driver.documents().remove(0);
    assert_eq!(bson::to_document(&found).unwrap(), stored);
}

#[tokio::test]
async fn test_patch_changes_only_named_field() {
    let (driver, products) = products();
    let ctx = OpContext::background();

    let mut product = Product::new("Kettle", 35);
    let id = products.create(&ctx, &mut product).await.unwrap();
    let before = driver.documents().remove(0);

    products
        .patch(&ctx, &mut product, doc! { "name": "X" })
        .await
        .unwrap();

    let mut after = driver.documents().remove(0);
    assert_eq!(after.get_str("name").unwrap(), "X");

    after.insert("name", before.get_str("name").unwrap());
    assert_eq!(after, before);
    assert_eq!(products.find_by_id(&ctx, &id).await.unwrap().price, 35);
}

#[tokio::test]
async fn test_update_leaves_unknown_fields() {
    let (driver, products) = products();
    let ctx = OpContext::background();

    let mut product = Product::new("Kettle", 35);
    let id = products.create(&ctx, &mut product).await.unwrap();
    products
        .patch(&ctx, &mut product, doc! { "legacy_sku": "K-35" })
        .await
        .unwrap();

    product.price = 30;
    products.update(&ctx, &mut product).await.unwrap();

    let stored = driver.documents().remove(0);
    assert_eq!(stored.get_i64("price").unwrap(), 30);
    assert_eq!(stored.get_str("legacy_sku").unwrap(), "K-35");
    assert_eq!(stored.get_str("_id").unwrap(), id);
}

#[tokio::test]
async fn test_find_all_empty_is_ok() {
    let (_, products) = products();
    let found = products
        .find_all(&OpContext::background(), doc! { "name": "nobody" })
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_first_without_match_is_not_found() {
    let (_, products) = products();
    let err = products
        .first(&OpContext::background(), doc! { "price": { "$gt": 0_i64 } })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_duplicate_id_is_persistence_error() {
    let (_, products) = products();
    let ctx = OpContext::background();

    let mut first = Product::new("One", 1);
    first.set_id("dup".into());
    products.create(&ctx, &mut first).await.unwrap();

    let mut second = Product::new("Two", 2);
    second.set_id("dup".into());
    let err = products.create(&ctx, &mut second).await.unwrap_err();
    assert!(err.is_persistence());
}

#[tokio::test]
async fn test_cancelled_context_issues_no_call() {
    let (driver, products) = products();
    let ctx = OpContext::background();
    ctx.cancel();

    let mut product = Product::new("Lamp", 20);
    assert!(products.create(&ctx, &mut product).await.unwrap_err().is_cancelled());
    assert!(products.find_by_id(&ctx, "x").await.unwrap_err().is_cancelled());
    assert!(products.find_all(&ctx, doc! {}).await.unwrap_err().is_cancelled());
    assert_eq!(driver.calls(), 0);
}

#[tokio::test]
async fn test_expired_context_times_out() {
    let (driver, products) = products();
    let ctx = OpContext::with_timeout(Duration::from_millis(1));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = products.find_all(&ctx, doc! {}).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(driver.calls(), 0);
}

/// A model whose ids must start with `ok-`.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct Ticket {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(skip)]
    hooked: bool,
}

#[async_trait::async_trait]
impl Creating for Ticket {
    async fn creating(&mut self, _ctx: &OpContext) -> HookResult {
        self.hooked = true;
        Ok(())
    }
}

impl Model for Ticket {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn prepare_id(&self, candidate: &str) -> MduResult<String> {
        if candidate.starts_with("ok-") {
            Ok(candidate.to_string())
        } else {
            Err(MduError::config(format!("bad id {candidate:?}")))
        }
    }

    fn as_creating(&mut self) -> Option<&mut dyn Creating> {
        Some(self)
    }
}

#[tokio::test]
async fn test_rejected_id_is_validation_error() {
    let driver = MemoryDriver::new("tickets");
    let tickets: Collection<Ticket, MemoryDriver> = Collection::new(driver.clone());
    let ctx = OpContext::background();

    let mut ticket = Ticket {
        id: "bad".into(),
        ..Default::default()
    };
    let err = tickets.create(&ctx, &mut ticket).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(driver.calls(), 0);
    assert!(!ticket.hooked);
    assert_eq!(ticket.id, "bad");

    let mut ticket = Ticket {
        id: "ok-7".into(),
        ..Default::default()
    };
    assert_eq!(tickets.create(&ctx, &mut ticket).await.unwrap(), "ok-7");
    assert!(ticket.hooked);
}
