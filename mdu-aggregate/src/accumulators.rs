//! Accumulator expressions for `$group`, `$bucket` and `$bucketAuto` outputs.
//!
//! Each helper returns the `{ "$op": expr }` value for one output field.

use bson::{Bson, Document};

fn accumulate(operator: &str, expr: impl Into<Bson>) -> Bson {
    let mut body = Document::new();
    body.insert(operator, expr.into());
    Bson::Document(body)
}

/// `$sum` of `expr` over the group.
pub fn sum(expr: impl Into<Bson>) -> Bson {
    accumulate("$sum", expr)
}

/// `$avg` of `expr` over the group.
pub fn avg(expr: impl Into<Bson>) -> Bson {
    accumulate("$avg", expr)
}

/// Smallest `expr` in the group.
pub fn min(expr: impl Into<Bson>) -> Bson {
    accumulate("$min", expr)
}

/// Largest `expr` in the group.
pub fn max(expr: impl Into<Bson>) -> Bson {
    accumulate("$max", expr)
}

/// `expr` from the first document of the group.
pub fn first(expr: impl Into<Bson>) -> Bson {
    accumulate("$first", expr)
}

/// `expr` from the last document of the group.
pub fn last(expr: impl Into<Bson>) -> Bson {
    accumulate("$last", expr)
}

/// Every `expr` of the group, in order.
pub fn push(expr: impl Into<Bson>) -> Bson {
    accumulate("$push", expr)
}

/// Distinct `expr` values of the group.
pub fn add_to_set(expr: impl Into<Bson>) -> Bson {
    accumulate("$addToSet", expr)
}

/// Documents in the group, as `{ "$sum": 1 }`.
pub fn count() -> Bson {
    sum(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_with_every_accumulator() {
        let stage = stages::group(
            "$category",
            doc! {
                "revenue": sum("$amount"),
                "mean": avg("$price"),
                "cheapest": min("$price"),
                "dearest": max("$price"),
                "opened": first("$date"),
                "closed": last("$date"),
                "skus": push("$sku"),
                "regions": add_to_set("$region"),
                "orders": count(),
            },
        );

        assert_eq!(
            stage.to_document(),
            doc! {
                "$group": {
                    "_id": "$category",
                    "revenue": { "$sum": "$amount" },
                    "mean": { "$avg": "$price" },
                    "cheapest": { "$min": "$price" },
                    "dearest": { "$max": "$price" },
                    "opened": { "$first": "$date" },
                    "closed": { "$last": "$date" },
                    "skus": { "$push": "$sku" },
                    "regions": { "$addToSet": "$region" },
                    "orders": { "$sum": 1 },
                }
            }
        );
    }

    #[test]
    fn test_expression_documents_pass_through() {
        let total = sum(doc! { "$multiply": ["$price", "$quantity"] });
        assert_eq!(
            total,
            Bson::Document(doc! { "$sum": { "$multiply": ["$price", "$quantity"] } })
        );
    }
}
