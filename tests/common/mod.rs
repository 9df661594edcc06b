//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use mdu::prelude::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub base: DefaultModel,
    pub name: String,
    pub price: i64,
}

impl_model!(Product, base);

impl Product {
    pub fn new(name: &str, price: i64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Default::default()
        }
    }
}

pub fn products() -> (MemoryDriver, Collection<Product, MemoryDriver>) {
    let driver = MemoryDriver::new(Product::collection_name());
    (driver.clone(), Collection::new(driver))
}

/// Calls recorded across every hook, shared with the test body.
pub type Journal = Arc<Mutex<Vec<&'static str>>>;

/// A model implementing every hook.
///
/// Each hook records its name; the one named by `fail_at` then fails.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Audited {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    #[serde(skip)]
    pub journal: Journal,
    #[serde(skip)]
    pub fail_at: Option<&'static str>,
    /// Counts passed to the most recent `updated` call.
    #[serde(skip)]
    pub last_update: Option<UpdateOutcome>,
}

impl Audited {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn failing_at(label: &str, hook: &'static str) -> Self {
        Self {
            fail_at: Some(hook),
            ..Self::new(label)
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.journal.lock().clone()
    }

    pub fn clear(&self) {
        self.journal.lock().clear();
    }

    fn record(&self, hook: &'static str) -> HookResult {
        self.journal.lock().push(hook);
        if self.fail_at == Some(hook) {
            return Err(format!("{hook} rejected {}", self.label).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Creating for Audited {
    async fn creating(&mut self, _ctx: &OpContext) -> HookResult {
        self.record("creating")
    }
}

#[async_trait]
impl Created for Audited {
    async fn created(&mut self, _ctx: &OpContext) -> HookResult {
        self.record("created")
    }
}

#[async_trait]
impl Updating for Audited {
    async fn updating(&mut self, _ctx: &OpContext) -> HookResult {
        self.record("updating")
    }
}

#[async_trait]
impl Updated for Audited {
    async fn updated(&mut self, _ctx: &OpContext, outcome: &UpdateOutcome) -> HookResult {
        self.last_update = Some(*outcome);
        self.record("updated")
    }
}

#[async_trait]
impl Saving for Audited {
    async fn saving(&mut self, _ctx: &OpContext) -> HookResult {
        self.record("saving")
    }
}

#[async_trait]
impl Saved for Audited {
    async fn saved(&mut self, _ctx: &OpContext) -> HookResult {
        self.record("saved")
    }
}

#[async_trait]
impl Deleting for Audited {
    async fn deleting(&mut self, _ctx: &OpContext) -> HookResult {
        self.record("deleting")
    }
}

#[async_trait]
impl Deleted for Audited {
    async fn deleted(&mut self, _ctx: &OpContext, outcome: &DeleteOutcome) -> HookResult {
        self.record(if outcome.deleted_count == 0 {
            "deleted-none"
        } else {
            "deleted"
        })
    }
}

impl Model for Audited {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn as_creating(&mut self) -> Option<&mut dyn Creating> {
        Some(self)
    }

    fn as_created(&mut self) -> Option<&mut dyn Created> {
        Some(self)
    }

    fn as_updating(&mut self) -> Option<&mut dyn Updating> {
        Some(self)
    }

    fn as_updated(&mut self) -> Option<&mut dyn Updated> {
        Some(self)
    }

    fn as_saving(&mut self) -> Option<&mut dyn Saving> {
        Some(self)
    }

    fn as_saved(&mut self) -> Option<&mut dyn Saved> {
        Some(self)
    }

    fn as_deleting(&mut self) -> Option<&mut dyn Deleting> {
        Some(self)
    }

    fn as_deleted(&mut self) -> Option<&mut dyn Deleted> {
        Some(self)
    }
}
