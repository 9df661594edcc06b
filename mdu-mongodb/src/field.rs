//! Reusable default fields: identifier, timestamps and tenant.
//!
//! These are meant to be embedded in an entity with `#[serde(flatten)]`, so
//! their fields land at the top level of the stored document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::OpContext;
use crate::error::MduResult;
use crate::hooks::{Creating, HookResult, Saving};

/// Primary key field name.
pub const ID: &str = "_id";
/// Creation timestamp field name.
pub const CREATED_AT: &str = "created_at";
/// Last-update timestamp field name.
pub const UPDATED_AT: &str = "updated_at";
/// Tenant field name.
pub const TENANT_ID: &str = "tenant_id";

/// Identifier policy: keep a caller-supplied id, otherwise generate a
/// random UUID string.
pub fn prepare_id(candidate: &str) -> MduResult<String> {
    if candidate.is_empty() {
        Ok(new_id())
    } else {
        Ok(candidate.to_string())
    }
}

/// A fresh globally unique identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// String identifier stored as `_id`; left out of the document when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdField {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}

impl IdField {
    /// Apply the default identifier policy.
    pub fn prepare_id(&self, candidate: &str) -> MduResult<String> {
        prepare_id(candidate)
    }

    /// The current identifier, empty when unset.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the identifier.
    pub fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// `created_at` and `updated_at`, stamped by the [`Creating`] and [`Saving`]
/// hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFields {
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
impl Creating for DateFields {
    async fn creating(&mut self, _ctx: &OpContext) -> HookResult {
        self.created_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl Saving for DateFields {
    async fn saving(&mut self, _ctx: &OpContext) -> HookResult {
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Tenant scoping for multi-tenant collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantField {
    #[serde(default)]
    pub tenant_id: String,
}
