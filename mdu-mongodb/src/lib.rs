//! # mdu-mongodb
//!
//! Model persistence over MongoDB: identifier preparation, ordered lifecycle
//! hooks and context-bounded driver calls.
//!
//! A model is any serde type implementing [`Model`]. Every operation goes
//! through a [`Collection`], which prepares the identifier, runs the
//! before-hooks, issues exactly one driver call under the caller's
//! [`OpContext`] and then runs the after-hooks.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use mdu_mongodb::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Product {
//!     #[serde(flatten)]
//!     base: DefaultModel,
//!     name: String,
//!     price: i64,
//! }
//!
//! impl_model!(Product, base);
//!
//! #[tokio::main]
//! async fn main() -> MduResult<()> {
//!     let client = MduClient::builder()
//!         .uri("mongodb://localhost:27017")
//!         .database("shop")
//!         .build()
//!         .await?;
//!
//!     let products = client.collection_for::<Product>();
//!     let ctx = OpContext::with_timeout(Duration::from_secs(5));
//!
//!     let mut lamp = Product { name: "Lamp".into(), price: 40, ..Default::default() };
//!     let id = products.create(&ctx, &mut lamp).await?;
//!
//!     products.patch(&ctx, &mut lamp, doc! { "price": 35 }).await?;
//!     let stored = products.find_by_id(&ctx, &id).await?;
//!     assert_eq!(stored.price, 35);
//!     Ok(())
//! }
//! ```
//!
//! ## Hooks
//!
//! Implement any of [`hooks::Creating`], [`hooks::Saving`], [`hooks::Updated`]
//! and friends, and return `Some(self)` from the matching `as_*` probe on
//! [`Model`]. See the [`hooks`] module for the ordering rules.

pub mod client;
pub mod collection;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod field;
pub mod hooks;
pub mod memory;
pub mod model;
mod operation;

pub use bson::oid::ObjectId;
pub use bson::{self, Bson, Document, doc};
pub use client::{MduClient, MduClientBuilder};
pub use collection::Collection;
pub use config::{MduConfig, MduConfigBuilder, ReadPreference};
pub use context::OpContext;
pub use driver::{DeleteOutcome, DocumentStream, Driver, MongoDriver, UpdateOutcome};
pub use error::{ErrorKind, HookError, MduError, MduResult};
pub use field::{DateFields, IdField, TenantField};
pub use hooks::{HookPoint, HookResult};
pub use memory::MemoryDriver;
pub use model::{DefaultModel, DefaultTenantModel, Model, collection_name};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{MduClient, MduClientBuilder};
    pub use crate::collection::Collection;
    pub use crate::config::MduConfig;
    pub use crate::context::OpContext;
    pub use crate::driver::{DeleteOutcome, Driver, MongoDriver, UpdateOutcome};
    pub use crate::error::{MduError, MduResult};
    pub use crate::hooks::{
        Created, Creating, Deleted, Deleting, HookResult, Saved, Saving, Updated, Updating,
    };
    pub use crate::impl_model;
    pub use crate::memory::MemoryDriver;
    pub use crate::model::{DefaultModel, DefaultTenantModel, Model};
    pub use bson::{Bson, Document, doc};
    pub use mdu_aggregate::{Pipeline, accumulators, stages};
}
