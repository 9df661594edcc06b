//! # mdu
//!
//! Model-centric persistence for MongoDB.
//!
//! - [`Collection`] runs create, read, update, patch and delete for a model
//!   type, with identifier preparation and ordered lifecycle hooks around a
//!   single driver call.
//! - Every operation takes an [`OpContext`] that bounds it with a deadline
//!   and a cancellation token.
//! - [`aggregate`] builds pipeline stages whose unset parameters are left out
//!   of the rendered documents.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mdu::prelude::*;
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
//!     mdu::logging::init();
//!
//!     let config = MduConfig::from_env()?;
//!     let client = MduClient::new(config).await?;
//!     let products = client.collection_for::<Product>();
//!
//!     let ctx = client.ctx();
//!     let mut lamp = Product { name: "Lamp".into(), price: 40, ..Default::default() };
//!     products.create(&ctx, &mut lamp).await?;
//!
//!     let cheap: Vec<Product> = products
//!         .aggregate(&ctx, [stages::match_stage(doc! { "price": { "$lt": 50 } })])
//!         .await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod logging;

/// Pipeline stage builders.
pub mod aggregate {
    pub use mdu_aggregate::*;
}

pub use mdu_mongodb::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use mdu_mongodb::prelude::*;
}
