//! Aggregation stage operator names.

pub const ADD_FIELDS: &str = "$addFields";
pub const BUCKET: &str = "$bucket";
pub const BUCKET_AUTO: &str = "$bucketAuto";
pub const COLL_STATS: &str = "$collStats";
pub const COUNT: &str = "$count";
pub const CURRENT_OP: &str = "$currentOp";
pub const GROUP: &str = "$group";
pub const LIMIT: &str = "$limit";
pub const LOOKUP: &str = "$lookup";
pub const MATCH: &str = "$match";
pub const MERGE: &str = "$merge";
pub const PROJECT: &str = "$project";
pub const REPLACE_ROOT: &str = "$replaceRoot";
pub const SAMPLE: &str = "$sample";
pub const SKIP: &str = "$skip";
pub const SORT: &str = "$sort";
pub const UNWIND: &str = "$unwind";
