//! # mdu-aggregate
//!
//! Typed builders for MongoDB aggregation stages.
//!
//! Each constructor in [`stages`] returns a [`Stage`]: an operator name and a
//! body in which unset options are omitted rather than written as null. A
//! [`Pipeline`] (or the free [`render`] function) flattens stages and raw
//! documents into the ordered document list the driver expects.
//!
//! ## Example
//!
//! ```rust
//! use bson::doc;
//! use mdu_aggregate::{Pipeline, accumulators, stages};
//!
//! let pipeline = Pipeline::new()
//!     .stage(stages::match_stage(doc! { "status": "active" }))
//!     .stage(stages::group("$category", doc! { "total": accumulators::sum("$price") }))
//!     .render();
//!
//! assert_eq!(pipeline[1], doc! { "$group": { "_id": "$category", "total": { "$sum": "$price" } } });
//! ```

pub mod accumulators;
pub mod field;
pub mod operator;
pub mod stage;
pub mod stages;

pub use stage::{Pipeline, PipelineItem, Stage, render};
pub use stages::{MergeAction, MergeNotMatchedAction};
