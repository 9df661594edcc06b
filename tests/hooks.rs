//! Hook ordering and failure semantics.

mod common;

use common::{Audited, Product, products};
use mdu::prelude::*;
use mdu::{HookPoint, MemoryDriver};
use pretty_assertions::assert_eq;

fn audited() -> (MemoryDriver, Collection<Audited, MemoryDriver>) {
    let driver = MemoryDriver::new("audits");
    (driver.clone(), Collection::new(driver))
}

#[tokio::test]
async fn test_create_hook_order() {
    let (_, audits) = audited();
    let mut model = Audited::new("first");

    audits.create(&OpContext::background(), &mut model).await.unwrap();
    assert_eq!(model.calls(), ["creating", "saving", "created", "saved"]);
}

#[tokio::test]
async fn test_update_and_patch_hook_order() {
    let (_, audits) = audited();
    let ctx = OpContext::background();
    let mut model = Audited::new("first");
    audits.create(&ctx, &mut model).await.unwrap();

    model.clear();
    model.label = "second".into();
    audits.update(&ctx, &mut model).await.unwrap();
    assert_eq!(model.calls(), ["updating", "saving", "updated", "saved"]);

    model.clear();
    audits
        .patch(&ctx, &mut model, doc! { "label": "third" })
        .await
        .unwrap();
    assert_eq!(model.calls(), ["updating", "saving", "updated", "saved"]);
}

#[tokio::test]
async fn test_delete_hook_order() {
    let (_, audits) = audited();
    let ctx = OpContext::background();
    let mut model = Audited::new("first");
    audits.create(&ctx, &mut model).await.unwrap();

    model.clear();
    audits.delete(&ctx, &mut model).await.unwrap();
    assert_eq!(model.calls(), ["deleting", "deleted"]);

    model.clear();
    audits.delete(&ctx, &mut model).await.unwrap();
    assert_eq!(model.calls(), ["deleting", "deleted-none"]);
}

#[tokio::test]
async fn test_before_hook_failure_skips_driver() {
    for hook in ["creating", "saving"] {
        let (driver, audits) = audited();
        let mut model = Audited::failing_at("rejected", hook);

        let err = audits
            .create(&OpContext::background(), &mut model)
            .await
            .unwrap_err();

        assert_eq!(err.hook_point().map(|p| p.as_str()), Some(hook));
        assert!(!err.is_after_commit());
        assert_eq!(driver.calls(), 0);
        assert!(driver.is_empty());
        assert_eq!(model.calls().last(), Some(&hook));
    }
}

#[tokio::test]
async fn test_updating_failure_leaves_document() {
    let (driver, audits) = audited();
    let ctx = OpContext::background();
    let mut model = Audited::new("original");
    audits.create(&ctx, &mut model).await.unwrap();
    let calls = driver.calls();

    model.fail_at = Some("updating");
    model.label = "changed".into();
    let err = audits.update(&ctx, &mut model).await.unwrap_err();

    assert_eq!(err.hook_point(), Some(HookPoint::Updating));
    assert_eq!(driver.calls(), calls);
    assert_eq!(driver.documents()[0].get_str("label").unwrap(), "original");
}

#[tokio::test]
async fn test_after_hook_failure_reports_committed_write() {
    let (driver, audits) = audited();
    let ctx = OpContext::background();
    let mut model = Audited::failing_at("widget", "created");

    let err = audits.create(&ctx, &mut model).await.unwrap_err();

    assert_eq!(err.hook_point(), Some(HookPoint::Created));
    assert!(err.is_after_commit());
    assert_eq!(driver.len(), 1);
    // `saved` never runs once `created` has failed.
    assert_eq!(model.calls(), ["creating", "saving", "created"]);
    assert!(!model.id.is_empty());
}

#[tokio::test]
async fn test_deleting_failure_keeps_document() {
    let (driver, audits) = audited();
    let ctx = OpContext::background();
    let mut model = Audited::new("keep");
    audits.create(&ctx, &mut model).await.unwrap();

    model.fail_at = Some("deleting");
    let err = audits.delete(&ctx, &mut model).await.unwrap_err();

    assert_eq!(err.kind(), mdu::ErrorKind::Hook);
    assert_eq!(driver.len(), 1);
}

#[tokio::test]
async fn test_default_model_stamps_timestamps() {
    let (_, products) = products();
    let ctx = OpContext::background();

    let mut product = Product::new("Lamp", 40);
    assert_eq!(product.base.dates.created_at.timestamp(), 0);

    products.create(&ctx, &mut product).await.unwrap();
    let created = product.base.dates.created_at;
    assert!(created.timestamp() > 0);
    assert!(product.base.dates.updated_at >= created);

    products.update(&ctx, &mut product).await.unwrap();
    assert_eq!(product.base.dates.created_at, created);
}

#[tokio::test]
async fn test_updated_hook_receives_counts() {
    let (_, audits) = audited();
    let ctx = OpContext::background();
    let mut model = Audited::new("first");
    audits.create(&ctx, &mut model).await.unwrap();

    model.label = "second".into();
    audits.update(&ctx, &mut model).await.unwrap();
    assert_eq!(
        model.last_update,
        Some(UpdateOutcome { matched_count: 1, modified_count: 1 })
    );

    // Same content again: matched but not modified.
    audits.update(&ctx, &mut model).await.unwrap();
    assert_eq!(
        model.last_update,
        Some(UpdateOutcome { matched_count: 1, modified_count: 0 })
    );
}

#[tokio::test]
async fn test_update_of_missing_id_is_not_an_error() {
    let (driver, audits) = audited();
    let ctx = OpContext::background();
    let mut ghost = Audited::new("ghost");
    ghost.id = "missing".into();

    audits.update(&ctx, &mut ghost).await.unwrap();

    assert_eq!(ghost.last_update, Some(UpdateOutcome::default()));
    assert_eq!(ghost.calls(), ["updating", "saving", "updated", "saved"]);
    assert!(driver.is_empty());
}

#[tokio::test]
async fn test_after_hook_failure_on_zero_match() {
    let (driver, audits) = audited();
    let mut ghost = Audited::failing_at("ghost", "updated");
    ghost.id = "missing".into();

    let err = audits
        .update(&OpContext::background(), &mut ghost)
        .await
        .unwrap_err();

    // The driver call completed even though nothing was written.
    assert!(err.is_after_commit());
    assert_eq!(ghost.last_update.map(|o| o.matched_count), Some(0));
    assert!(driver.is_empty());
}
