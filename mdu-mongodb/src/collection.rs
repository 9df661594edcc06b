//! A model type bound to a named collection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bson::Document;
use mdu_aggregate::{PipelineItem, render};
use serde::de::DeserializeOwned;

use crate::context::OpContext;
use crate::driver::{DocumentStream, Driver, MongoDriver};
use crate::error::MduResult;
use crate::model::Model;
use crate::operation;

/// Persistence operations for models of type `M`.
///
/// Every call takes the caller's [`OpContext`]; nothing here holds state
/// between calls, and clones share the same driver.
///
/// ```rust,ignore
/// let products = client.collection_for::<Product>();
/// let ctx = OpContext::with_timeout(Duration::from_secs(5));
///
/// let mut product = Product::new("Lamp", 40);
/// let id = products.create(&ctx, &mut product).await?;
/// let stored = products.find_by_id(&ctx, &id).await?;
/// ```
pub struct Collection<M, D: ?Sized = MongoDriver> {
    driver: Arc<D>,
    _model: PhantomData<fn() -> M>,
}

impl<M, D: ?Sized> Clone for Collection<M, D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            _model: PhantomData,
        }
    }
}

impl<M, D: Driver + ?Sized> fmt::Debug for Collection<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.driver.namespace())
            .field("model", &std::any::type_name::<M>())
            .finish()
    }
}

impl<M: Model> Collection<M, MongoDriver> {
    /// Bind `M` to a MongoDB collection.
    pub fn from_mongo(collection: mongodb::Collection<Document>) -> Self {
        Self::new(MongoDriver::new(collection))
    }
}

impl<M: Model, D: Driver> Collection<M, D> {
    /// Bind `M` to a driver.
    pub fn new(driver: D) -> Self {
        Self::with_shared(Arc::new(driver))
    }
}

impl<M: Model, D: Driver + ?Sized> Collection<M, D> {
    /// Bind `M` to a shared driver.
    pub fn with_shared(driver: Arc<D>) -> Self {
        Self {
            driver,
            _model: PhantomData,
        }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        self.driver.namespace()
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Insert a new model.
    ///
    /// The identifier policy runs first and its result is written onto the
    /// model; then `creating`, `saving`, the insert, `created` and `saved`.
    /// Returns the stored identifier.
    pub async fn create(&self, ctx: &OpContext, model: &mut M) -> MduResult<String> {
        operation::create(ctx, &*self.driver, model).await
    }

    /// Find a model by identifier. Fails with `NotFound` when nothing matches.
    pub async fn find_by_id(&self, ctx: &OpContext, id: &str) -> MduResult<M> {
        operation::find_by_id(ctx, &*self.driver, id).await
    }

    /// First model matching `filter`. Fails with `NotFound` when nothing matches.
    pub async fn first(&self, ctx: &OpContext, filter: Document) -> MduResult<M> {
        operation::first(ctx, &*self.driver, filter).await
    }

    /// Persist the model's fields with `$set`.
    ///
    /// Fields that no longer appear in the serialized model are left in the
    /// stored document. The match/modify counts are only visible to the
    /// `updated` hook; a model that matched nothing is not an error here.
    pub async fn update(&self, ctx: &OpContext, model: &mut M) -> MduResult<()> {
        operation::update(ctx, &*self.driver, model).await
    }

    /// Persist only `fields`, running the same hooks as [`update`](Self::update).
    pub async fn patch(&self, ctx: &OpContext, model: &mut M, fields: Document) -> MduResult<()> {
        operation::patch(ctx, &*self.driver, model, fields).await
    }

    /// Delete the model by its identifier.
    ///
    /// Deleting a missing document is a no-op; the `deleted` hook sees the
    /// count if it needs to care.
    pub async fn delete(&self, ctx: &OpContext, model: &mut M) -> MduResult<()> {
        operation::delete(ctx, &*self.driver, model).await
    }

    /// All models matching `filter`. Empty when nothing matches.
    pub async fn find_all(&self, ctx: &OpContext, filter: Document) -> MduResult<Vec<M>> {
        operation::find_all(ctx, &*self.driver, filter).await
    }

    /// Run a pipeline of stages and raw documents, returning a document stream.
    pub async fn aggregate_cursor<I, S>(&self, ctx: &OpContext, stages: I) -> MduResult<DocumentStream>
    where
        I: IntoIterator<Item = S>,
        S: Into<PipelineItem>,
    {
        operation::aggregate_cursor(ctx, &*self.driver, render(stages)).await
    }

    /// Run a pipeline and decode every result.
    pub async fn aggregate<T, I, S>(&self, ctx: &OpContext, stages: I) -> MduResult<Vec<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<PipelineItem>,
    {
        operation::aggregate(ctx, &*self.driver, render(stages)).await
    }

    /// Run a pipeline and decode the first result, if any.
    pub async fn aggregate_first<T, I, S>(&self, ctx: &OpContext, stages: I) -> MduResult<Option<T>>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<PipelineItem>,
    {
        operation::aggregate_first(ctx, &*self.driver, render(stages)).await
    }
}
