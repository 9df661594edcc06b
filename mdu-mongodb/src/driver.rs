//! The document-database seam.
//!
//! [`Driver`] is the narrow surface the operations need from a collection:
//! one call per operation, documents in, documents or counts out. The
//! operation context is applied around each call by the caller, so a driver
//! only has to be cancellation-safe (drop-safe), not context-aware.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use mongodb::Collection;
use tracing::trace;

use crate::error::{MduError, MduResult};

/// A stream of documents returned by `find` and `aggregate`.
pub type DocumentStream = BoxStream<'static, MduResult<Document>>;

/// Counts reported by an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents matched by the filter.
    pub matched_count: u64,
    /// Documents actually changed.
    pub modified_count: u64,
}

/// Counts reported by a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Documents removed.
    pub deleted_count: u64,
}

/// Single-collection document operations.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Name of the collection this driver operates on.
    fn namespace(&self) -> &str;

    /// Insert one document, returning its `_id`.
    async fn insert_one(&self, document: Document) -> MduResult<Bson>;

    /// First document matching `filter`.
    async fn find_one(&self, filter: Document) -> MduResult<Option<Document>>;

    /// Apply `update` to the first document matching `filter`.
    async fn update_one(&self, filter: Document, update: Document) -> MduResult<UpdateOutcome>;

    /// Delete the first document matching `filter`.
    async fn delete_one(&self, filter: Document) -> MduResult<DeleteOutcome>;

    /// All documents matching `filter`.
    async fn find(&self, filter: Document) -> MduResult<DocumentStream>;

    /// Run an aggregation pipeline.
    async fn aggregate(&self, pipeline: Vec<Document>) -> MduResult<DocumentStream>;
}

/// [`Driver`] backed by a MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoDriver {
    collection: Collection<Document>,
}

impl MongoDriver {
    /// Wrap a driver collection.
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Get the underlying collection.
    pub fn inner(&self) -> &Collection<Document> {
        &self.collection
    }
}

impl From<Collection<Document>> for MongoDriver {
    fn from(collection: Collection<Document>) -> Self {
        Self::new(collection)
    }
}

#[async_trait]
impl Driver for MongoDriver {
    fn namespace(&self) -> &str {
        self.collection.name()
    }

    async fn insert_one(&self, document: Document) -> MduResult<Bson> {
        trace!(collection = %self.namespace(), "insert_one");
        let result = self.collection.insert_one(document, None).await?;
        Ok(result.inserted_id)
    }

    async fn find_one(&self, filter: Document) -> MduResult<Option<Document>> {
        trace!(collection = %self.namespace(), filter = %filter, "find_one");
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn update_one(&self, filter: Document, update: Document) -> MduResult<UpdateOutcome> {
        trace!(collection = %self.namespace(), filter = %filter, "update_one");
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: Document) -> MduResult<DeleteOutcome> {
        trace!(collection = %self.namespace(), filter = %filter, "delete_one");
        let result = self.collection.delete_one(filter, None).await?;
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn find(&self, filter: Document) -> MduResult<DocumentStream> {
        trace!(collection = %self.namespace(), filter = %filter, "find");
        let cursor = self.collection.find(filter, None).await?;
        Ok(cursor.map_err(MduError::from).boxed())
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> MduResult<DocumentStream> {
        trace!(collection = %self.namespace(), stages = pipeline.len(), "aggregate");
        let cursor = self.collection.aggregate(pipeline, None).await?;
        Ok(cursor.map_err(MduError::from).boxed())
    }
}
