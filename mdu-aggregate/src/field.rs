//! Field names used inside stage bodies.

pub const ID: &str = "_id";

// $bucket / $bucketAuto
pub const GROUP_BY: &str = "groupBy";
pub const BOUNDARIES: &str = "boundaries";
pub const DEFAULT: &str = "default";
pub const OUTPUT: &str = "output";
pub const BUCKETS: &str = "buckets";
pub const GRANULARITY: &str = "granularity";

// $collStats
pub const LATENCY_STATS: &str = "latencyStats";
pub const STORAGE_STATS: &str = "storageStats";
pub const COUNT: &str = "count";

// $currentOp
pub const ALL_USERS: &str = "allUsers";
pub const IDLE_CONNECTIONS: &str = "idleConnections";
pub const IDLE_CURSORS: &str = "idleCursors";
pub const IDLE_SESSIONS: &str = "idleSessions";
pub const LOCAL_OPS: &str = "localOps";

// $lookup
pub const FROM: &str = "from";
pub const LOCAL_FIELD: &str = "localField";
pub const FOREIGN_FIELD: &str = "foreignField";
pub const AS: &str = "as";
pub const LET: &str = "let";
pub const PIPELINE: &str = "pipeline";

// $merge
pub const INTO: &str = "into";
pub const ON: &str = "on";
pub const WHEN_MATCHED: &str = "whenMatched";
pub const WHEN_NOT_MATCHED: &str = "whenNotMatched";

// $replaceRoot
pub const NEW_ROOT: &str = "newRoot";

// $sample
pub const SIZE: &str = "size";

// $unwind
pub const PATH: &str = "path";
pub const INCLUDE_ARRAY_INDEX: &str = "includeArrayIndex";
pub const PRESERVE_NULL_AND_EMPTY_ARRAYS: &str = "preserveNullAndEmptyArrays";
