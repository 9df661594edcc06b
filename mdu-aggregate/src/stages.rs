//! Typed constructors for aggregation stages.
//!
//! Every parameter accepts anything convertible into [`Bson`]. A parameter
//! that converts to `Bson::Null` (typically `None`) is left out of the stage
//! body entirely instead of being written as an explicit null. The server
//! treats "absent" and "null" differently for several of these options, such
//! as `$bucket` boundaries and the default bucket.
//!
//! ```rust
//! use bson::{Bson, doc};
//! use mdu_aggregate::stages;
//!
//! let stage = stages::bucket("$price", None::<Bson>, None::<Bson>, None::<bson::Document>);
//! assert_eq!(stage.to_document(), doc! { "$bucket": { "groupBy": "$price" } });
//! ```

use bson::{Bson, Document};

use crate::field as f;
use crate::operator as o;
use crate::stage::Stage;

/// Insert `value` under `key` unless it is null.
fn append_not_null(doc: &mut Document, key: &str, value: impl Into<Bson>) {
    let value = value.into();
    if value != Bson::Null {
        doc.insert(key, value);
    }
}

/// `$bucket`: categorize documents into buckets by explicit boundaries.
pub fn bucket(
    group_by: impl Into<Bson>,
    boundaries: impl Into<Bson>,
    default: impl Into<Bson>,
    output: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::GROUP_BY, group_by);
    append_not_null(&mut body, f::BOUNDARIES, boundaries);
    append_not_null(&mut body, f::DEFAULT, default);
    append_not_null(&mut body, f::OUTPUT, output);
    Stage::new(o::BUCKET, body)
}

/// `$bucketAuto`: categorize documents into a fixed number of buckets.
pub fn bucket_auto(
    group_by: impl Into<Bson>,
    buckets: impl Into<Bson>,
    output: impl Into<Bson>,
    granularity: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::GROUP_BY, group_by);
    append_not_null(&mut body, f::BUCKETS, buckets);
    append_not_null(&mut body, f::OUTPUT, output);
    append_not_null(&mut body, f::GRANULARITY, granularity);
    Stage::new(o::BUCKET_AUTO, body)
}

/// `$collStats`: collection statistics.
pub fn coll_stats(
    latency_stats: impl Into<Bson>,
    storage_stats: impl Into<Bson>,
    count: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::LATENCY_STATS, latency_stats);
    append_not_null(&mut body, f::STORAGE_STATS, storage_stats);
    append_not_null(&mut body, f::COUNT, count);
    Stage::new(o::COLL_STATS, body)
}

/// `$currentOp`: in-progress operations. Must be the first stage and run
/// against the admin database.
pub fn current_op(
    all_users: impl Into<Bson>,
    idle_connections: impl Into<Bson>,
    idle_cursors: impl Into<Bson>,
    idle_sessions: impl Into<Bson>,
    local_ops: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::ALL_USERS, all_users);
    append_not_null(&mut body, f::IDLE_CONNECTIONS, idle_connections);
    append_not_null(&mut body, f::IDLE_CURSORS, idle_cursors);
    append_not_null(&mut body, f::IDLE_SESSIONS, idle_sessions);
    append_not_null(&mut body, f::LOCAL_OPS, local_ops);
    Stage::new(o::CURRENT_OP, body)
}

/// `$group`: group by `id`, with each entry of `fields` merged into the body.
///
/// Null-valued entries of `fields` are dropped like any other unset option.
pub fn group(id: impl Into<Bson>, fields: Document) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::ID, id);
    for (key, value) in fields {
        append_not_null(&mut body, &key, value);
    }
    Stage::new(o::GROUP, body)
}

/// `$lookup` on a local/foreign field equality.
pub fn lookup(
    from: impl Into<Bson>,
    local_field: impl Into<Bson>,
    foreign_field: impl Into<Bson>,
    as_field: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::FROM, from);
    append_not_null(&mut body, f::LOCAL_FIELD, local_field);
    append_not_null(&mut body, f::FOREIGN_FIELD, foreign_field);
    append_not_null(&mut body, f::AS, as_field);
    Stage::new(o::LOOKUP, body)
}

/// `$lookup` with `let` bindings and a sub-pipeline.
pub fn uncorrelated_lookup(
    from: impl Into<Bson>,
    let_bindings: impl Into<Bson>,
    pipeline: impl Into<Bson>,
    as_field: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::FROM, from);
    append_not_null(&mut body, f::LET, let_bindings);
    append_not_null(&mut body, f::PIPELINE, pipeline);
    append_not_null(&mut body, f::AS, as_field);
    Stage::new(o::LOOKUP, body)
}

/// `$merge`: write the pipeline output into a collection.
pub fn merge(
    into: impl Into<Bson>,
    on: impl Into<Bson>,
    let_bindings: impl Into<Bson>,
    when_matched: impl Into<Bson>,
    when_not_matched: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::INTO, into);
    append_not_null(&mut body, f::ON, on);
    append_not_null(&mut body, f::LET, let_bindings);
    append_not_null(&mut body, f::WHEN_MATCHED, when_matched);
    append_not_null(&mut body, f::WHEN_NOT_MATCHED, when_not_matched);
    Stage::new(o::MERGE, body)
}

/// `$replaceRoot`: promote an embedded document to the top level.
pub fn replace_root(new_root: impl Into<Bson>) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::NEW_ROOT, new_root);
    Stage::new(o::REPLACE_ROOT, body)
}

/// `$sample`: pick `size` random documents.
pub fn sample(size: impl Into<Bson>) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::SIZE, size);
    Stage::new(o::SAMPLE, body)
}

/// `$unwind`: one output document per array element.
pub fn unwind(
    path: impl Into<Bson>,
    include_array_index: impl Into<Bson>,
    preserve_null_and_empty_arrays: impl Into<Bson>,
) -> Stage {
    let mut body = Document::new();
    append_not_null(&mut body, f::PATH, path);
    append_not_null(&mut body, f::INCLUDE_ARRAY_INDEX, include_array_index);
    append_not_null(
        &mut body,
        f::PRESERVE_NULL_AND_EMPTY_ARRAYS,
        preserve_null_and_empty_arrays,
    );
    Stage::new(o::UNWIND, body)
}

/// `$match`.
pub fn match_stage(filter: Document) -> Stage {
    Stage::new(o::MATCH, filter)
}

/// `$project`.
pub fn project(fields: Document) -> Stage {
    Stage::new(o::PROJECT, fields)
}

/// `$sort`.
pub fn sort(fields: Document) -> Stage {
    Stage::new(o::SORT, fields)
}

/// `$limit`.
pub fn limit(n: i64) -> Stage {
    Stage::scalar(o::LIMIT, n)
}

/// `$skip`.
pub fn skip(n: i64) -> Stage {
    Stage::scalar(o::SKIP, n)
}

/// `$count`.
pub fn count(field: impl Into<String>) -> Stage {
    Stage::scalar(o::COUNT, field.into())
}

/// `$addFields`.
pub fn add_fields(fields: Document) -> Stage {
    Stage::new(o::ADD_FIELDS, fields)
}

/// Action for `whenMatched` in a `$merge` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    /// Replace the existing document.
    Replace,
    /// Keep the existing document.
    KeepExisting,
    /// Merge fields into the existing document.
    Merge,
    /// Fail the operation.
    Fail,
    /// Update the existing document with a custom pipeline.
    Pipeline(Vec<Document>),
}

impl From<MergeAction> for Bson {
    fn from(action: MergeAction) -> Self {
        match action {
            MergeAction::Replace => Bson::String("replace".into()),
            MergeAction::KeepExisting => Bson::String("keepExisting".into()),
            MergeAction::Merge => Bson::String("merge".into()),
            MergeAction::Fail => Bson::String("fail".into()),
            MergeAction::Pipeline(stages) => {
                Bson::Array(stages.into_iter().map(Bson::Document).collect())
            }
        }
    }
}

/// Action for `whenNotMatched` in a `$merge` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeNotMatchedAction {
    /// Insert the new document.
    Insert,
    /// Discard the document.
    Discard,
    /// Fail the operation.
    Fail,
}

impl From<MergeNotMatchedAction> for Bson {
    fn from(action: MergeNotMatchedAction) -> Self {
        let name = match action {
            MergeNotMatchedAction::Insert => "insert",
            MergeNotMatchedAction::Discard => "discard",
            MergeNotMatchedAction::Fail => "fail",
        };
        Bson::String(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulators;
    use crate::stage::render;
    use bson::doc;
    use pretty_assertions::assert_eq;

    const UNSET: Option<Bson> = None;

    #[test]
    fn test_bucket_omits_unset_options() {
        let stage = bucket("$price", UNSET, UNSET, UNSET);
        assert_eq!(stage.operator(), "$bucket");
        assert_eq!(stage.body(), &Bson::Document(doc! { "groupBy": "$price" }));
    }

    #[test]
    fn test_bucket_full() {
        let stage = bucket(
            "$price",
            vec![0, 100, 200],
            "other",
            doc! { "count": accumulators::count() },
        );
        assert_eq!(
            stage.to_document(),
            doc! {
                "$bucket": {
                    "groupBy": "$price",
                    "boundaries": [0, 100, 200],
                    "default": "other",
                    "output": { "count": { "$sum": 1 } },
                }
            }
        );
    }

    #[test]
    fn test_bucket_auto() {
        let stage = bucket_auto("$price", 4, UNSET, "R5");
        assert_eq!(
            stage.to_document(),
            doc! { "$bucketAuto": { "groupBy": "$price", "buckets": 4, "granularity": "R5" } }
        );
    }

    #[test]
    fn test_coll_stats() {
        let stage = coll_stats(doc! { "histograms": true }, UNSET, doc! {});
        assert_eq!(
            stage.to_document(),
            doc! { "$collStats": { "latencyStats": { "histograms": true }, "count": {} } }
        );
    }

    #[test]
    fn test_current_op_partial() {
        let stage = current_op(true, UNSET, UNSET, UNSET, Some(false));
        assert_eq!(
            stage.to_document(),
            doc! { "$currentOp": { "allUsers": true, "localOps": false } }
        );
    }

    #[test]
    fn test_group_drops_null_fields() {
        let stage = group(
            "$category",
            doc! { "total": accumulators::sum("$price"), "ignored": Bson::Null },
        );
        assert_eq!(
            stage.to_document(),
            doc! { "$group": { "_id": "$category", "total": { "$sum": "$price" } } }
        );
    }

    #[test]
    fn test_group_null_id_is_omitted() {
        let stage = group(UNSET, doc! { "n": accumulators::count() });
        assert_eq!(stage.body(), &Bson::Document(doc! { "n": { "$sum": 1 } }));
    }

    #[test]
    fn test_lookup_variants_share_operator() {
        let correlated = lookup("orders", "_id", "customer_id", "orders");
        let uncorrelated = uncorrelated_lookup(
            "orders",
            doc! { "cid": "$_id" },
            vec![doc! { "$match": { "$expr": { "$eq": ["$customer_id", "$$cid"] } } }],
            "orders",
        );
        assert_eq!(correlated.operator(), "$lookup");
        assert_eq!(uncorrelated.operator(), "$lookup");

        let body = uncorrelated.body().as_document().unwrap();
        assert!(body.contains_key("let"));
        assert!(body.contains_key("pipeline"));
        assert!(!body.contains_key("localField"));
    }

    #[test]
    fn test_merge_with_typed_actions() {
        let stage = merge(
            "stats",
            "_id",
            UNSET,
            MergeAction::Replace,
            MergeNotMatchedAction::Insert,
        );
        assert_eq!(
            stage.to_document(),
            doc! {
                "$merge": {
                    "into": "stats",
                    "on": "_id",
                    "whenMatched": "replace",
                    "whenNotMatched": "insert",
                }
            }
        );
    }

    #[test]
    fn test_merge_pipeline_action() {
        let action = MergeAction::Pipeline(vec![doc! { "$set": { "seen": true } }]);
        let stage = merge("stats", UNSET, UNSET, action, UNSET);
        let body = stage.body().as_document().unwrap();
        assert_eq!(body.get_array("whenMatched").unwrap().len(), 1);
        assert!(!body.contains_key("whenNotMatched"));
    }

    #[test]
    fn test_replace_root_and_sample() {
        assert_eq!(
            replace_root("$profile").to_document(),
            doc! { "$replaceRoot": { "newRoot": "$profile" } }
        );
        assert_eq!(sample(5).to_document(), doc! { "$sample": { "size": 5 } });
    }

    #[test]
    fn test_unwind_options() {
        assert_eq!(
            unwind("$tags", UNSET, UNSET).to_document(),
            doc! { "$unwind": { "path": "$tags" } }
        );
        assert_eq!(
            unwind("$tags", "idx", true).to_document(),
            doc! {
                "$unwind": {
                    "path": "$tags",
                    "includeArrayIndex": "idx",
                    "preserveNullAndEmptyArrays": true,
                }
            }
        );
    }

    #[test]
    fn test_unwind_then_group_renders_in_order() {
        let pipeline = render(vec![
            unwind("$tags", UNSET, UNSET),
            group("$tags", doc! { "n": accumulators::count() }),
        ]);
        assert_eq!(pipeline.len(), 2);
        assert!(pipeline[0].contains_key("$unwind"));
        assert!(pipeline[1].contains_key("$group"));
    }

    #[test]
    fn test_scalar_helpers() {
        assert_eq!(limit(3).to_document(), doc! { "$limit": 3_i64 });
        assert_eq!(skip(1).to_document(), doc! { "$skip": 1_i64 });
        assert_eq!(count("total").to_document(), doc! { "$count": "total" });
    }
}
