//! The operation pipeline: each mutating operation wraps one driver call with
//! the lifecycle hooks, and every driver call runs under the caller's context.

use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::context::OpContext;
use crate::driver::{DocumentStream, Driver};
use crate::error::{MduError, MduResult};
use crate::field;
use crate::hooks;
use crate::model::Model;

fn id_filter(id: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(field::ID, id);
    filter
}

fn warn_after_commit<D: Driver + ?Sized>(driver: &D, id: &str, err: &MduError) {
    if err.is_after_commit() {
        warn!(
            collection = %driver.namespace(),
            id = %id,
            error = %err,
            "after-hook failed; the write was already applied"
        );
    }
}

pub(crate) async fn create<M, D>(ctx: &OpContext, driver: &D, model: &mut M) -> MduResult<String>
where
    M: Model,
    D: Driver + ?Sized,
{
    ctx.err()?;

    let id = model.prepare_id(model.id()).map_err(|err| match err {
        MduError::Validation(_) => err,
        other => MduError::validation(other.to_string()),
    })?;
    model.set_id(id);

    hooks::before_create(ctx, model).await?;

    let document = bson::to_document(model)?;
    debug!(collection = %driver.namespace(), id = %model.id(), "Inserting document");
    let inserted = ctx.run(driver.insert_one(document)).await?;

    if let Bson::String(inserted) = inserted {
        if inserted != model.id() {
            model.set_id(inserted);
        }
    }

    let id = model.id().to_string();
    hooks::after_create(ctx, model)
        .await
        .inspect_err(|err| warn_after_commit(driver, &id, err))?;
    Ok(id)
}

pub(crate) async fn first<T, D>(ctx: &OpContext, driver: &D, filter: Document) -> MduResult<T>
where
    T: DeserializeOwned,
    D: Driver + ?Sized,
{
    debug!(collection = %driver.namespace(), filter = %filter, "Finding first document");
    let found = ctx.run(driver.find_one(filter.clone())).await?;
    match found {
        Some(document) => Ok(bson::from_document(document)?),
        None => Err(MduError::not_found(format!(
            "no document in {} matches {}",
            driver.namespace(),
            filter
        ))),
    }
}

pub(crate) async fn find_by_id<T, D>(ctx: &OpContext, driver: &D, id: &str) -> MduResult<T>
where
    T: DeserializeOwned,
    D: Driver + ?Sized,
{
    first(ctx, driver, id_filter(id)).await
}

pub(crate) async fn update<M, D>(ctx: &OpContext, driver: &D, model: &mut M) -> MduResult<()>
where
    M: Model,
    D: Driver + ?Sized,
{
    ctx.err()?;
    hooks::before_update(ctx, model).await?;

    let mut fields = bson::to_document(model)?;
    fields.remove(field::ID);
    apply_set(ctx, driver, model, fields).await
}

pub(crate) async fn patch<M, D>(
    ctx: &OpContext,
    driver: &D,
    model: &mut M,
    fields: Document,
) -> MduResult<()>
where
    M: Model,
    D: Driver + ?Sized,
{
    ctx.err()?;
    hooks::before_update(ctx, model).await?;
    apply_set(ctx, driver, model, fields).await
}

async fn apply_set<M, D>(
    ctx: &OpContext,
    driver: &D,
    model: &mut M,
    fields: Document,
) -> MduResult<()>
where
    M: Model,
    D: Driver + ?Sized,
{
    let id = model.id().to_string();
    debug!(collection = %driver.namespace(), id = %id, fields = fields.len(), "Updating document");
    let outcome = ctx
        .run(driver.update_one(id_filter(&id), doc! { "$set": fields }))
        .await?;

    hooks::after_update(ctx, model, &outcome)
        .await
        .inspect_err(|err| warn_after_commit(driver, &id, err))
}

pub(crate) async fn delete<M, D>(ctx: &OpContext, driver: &D, model: &mut M) -> MduResult<()>
where
    M: Model,
    D: Driver + ?Sized,
{
    ctx.err()?;
    hooks::before_delete(ctx, model).await?;

    let id = model.id().to_string();
    debug!(collection = %driver.namespace(), id = %id, "Deleting document");
    let outcome = ctx.run(driver.delete_one(id_filter(&id))).await?;

    hooks::after_delete(ctx, model, &outcome)
        .await
        .inspect_err(|err| warn_after_commit(driver, &id, err))
}

pub(crate) async fn find_all<T, D>(ctx: &OpContext, driver: &D, filter: Document) -> MduResult<Vec<T>>
where
    T: DeserializeOwned,
    D: Driver + ?Sized,
{
    debug!(collection = %driver.namespace(), filter = %filter, "Finding documents");
    ctx.run(async {
        let stream = driver.find(filter).await?;
        decode_all(stream).await
    })
    .await
}

pub(crate) async fn aggregate_cursor<D>(
    ctx: &OpContext,
    driver: &D,
    pipeline: Vec<Document>,
) -> MduResult<DocumentStream>
where
    D: Driver + ?Sized,
{
    debug!(collection = %driver.namespace(), stages = pipeline.len(), "Running aggregation");
    ctx.run(driver.aggregate(pipeline)).await
}

pub(crate) async fn aggregate<T, D>(
    ctx: &OpContext,
    driver: &D,
    pipeline: Vec<Document>,
) -> MduResult<Vec<T>>
where
    T: DeserializeOwned,
    D: Driver + ?Sized,
{
    ctx.run(async {
        let stream = driver.aggregate(pipeline).await?;
        decode_all(stream).await
    })
    .await
}

pub(crate) async fn aggregate_first<T, D>(
    ctx: &OpContext,
    driver: &D,
    pipeline: Vec<Document>,
) -> MduResult<Option<T>>
where
    T: DeserializeOwned,
    D: Driver + ?Sized,
{
    ctx.run(async {
        let mut stream = driver.aggregate(pipeline).await?;
        let first: Option<Document> = stream.try_next().await?;
        first
            .map(bson::from_document::<T>)
            .transpose()
            .map_err(MduError::from)
    })
    .await
}

async fn decode_all<T: DeserializeOwned>(stream: DocumentStream) -> MduResult<Vec<T>> {
    stream
        .and_then(|document| async move { bson::from_document::<T>(document).map_err(MduError::from) })
        .try_collect()
        .await
}
