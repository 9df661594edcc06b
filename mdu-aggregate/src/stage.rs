//! Stage values and the pipeline renderer.
//!
//! A [`Stage`] is an operator name paired with its body. The renderer turns a
//! mixed sequence of stages and raw documents into the ordered list of
//! documents the driver expects:
//!
//! ```rust
//! use bson::doc;
//! use mdu_aggregate::{Pipeline, stages};
//!
//! let pipeline = Pipeline::new()
//!     .stage(stages::unwind("$tags", None::<String>, None::<bool>))
//!     .raw(doc! { "$limit": 10 })
//!     .render();
//!
//! assert_eq!(pipeline.len(), 2);
//! assert!(pipeline[0].contains_key("$unwind"));
//! ```

use bson::{Bson, Document};

/// A single aggregation stage: `{ operator: body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    operator: &'static str,
    body: Bson,
}

impl Stage {
    /// Create a stage with a document body.
    pub fn new(operator: &'static str, body: Document) -> Self {
        Self {
            operator,
            body: Bson::Document(body),
        }
    }

    /// Create a stage whose body is a scalar, e.g. `{ "$limit": 10 }`.
    pub fn scalar(operator: &'static str, value: impl Into<Bson>) -> Self {
        Self {
            operator,
            body: value.into(),
        }
    }

    /// The operator name, including the leading `$`.
    pub fn operator(&self) -> &'static str {
        self.operator
    }

    /// The stage body.
    pub fn body(&self) -> &Bson {
        &self.body
    }

    /// Render to a single-keyed document.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(self.operator, self.body.clone());
        doc
    }
}

impl From<Stage> for Document {
    fn from(stage: Stage) -> Self {
        let mut doc = Document::new();
        doc.insert(stage.operator, stage.body);
        doc
    }
}

/// One entry of a pipeline: either a typed stage or a raw document passed
/// through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineItem {
    /// A stage built by one of the constructors in [`crate::stages`].
    Stage(Stage),
    /// A hand-written stage document.
    Raw(Document),
}

impl PipelineItem {
    /// Render this item into a pipeline document.
    pub fn into_document(self) -> Document {
        match self {
            PipelineItem::Stage(stage) => stage.into(),
            PipelineItem::Raw(doc) => doc,
        }
    }
}

impl From<Stage> for PipelineItem {
    fn from(stage: Stage) -> Self {
        PipelineItem::Stage(stage)
    }
}

impl From<Document> for PipelineItem {
    fn from(doc: Document) -> Self {
        PipelineItem::Raw(doc)
    }
}

/// Render stages and raw documents into a pipeline, preserving order.
///
/// Nothing is reordered, merged or deduplicated.
pub fn render<I, S>(items: I) -> Vec<Document>
where
    I: IntoIterator<Item = S>,
    S: Into<PipelineItem>,
{
    items
        .into_iter()
        .map(|item| item.into().into_document())
        .collect()
}

/// An ordered aggregation pipeline under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    items: Vec<PipelineItem>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a typed stage.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.items.push(PipelineItem::Stage(stage));
        self
    }

    /// Append a raw stage document.
    pub fn raw(mut self, doc: Document) -> Self {
        self.items.push(PipelineItem::Raw(doc));
        self
    }

    /// Append any pipeline item.
    pub fn push(&mut self, item: impl Into<PipelineItem>) {
        self.items.push(item.into());
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items in insertion order.
    pub fn items(&self) -> &[PipelineItem] {
        &self.items
    }

    /// Render to the document list sent to the server.
    pub fn render(self) -> Vec<Document> {
        render(self.items)
    }
}

impl IntoIterator for Pipeline {
    type Item = PipelineItem;
    type IntoIter = std::vec::IntoIter<PipelineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<S: Into<PipelineItem>> FromIterator<S> for Pipeline {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}
