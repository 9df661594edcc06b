//! Optional lifecycle hooks and their dispatcher.
//!
//! A model opts into a hook by implementing the single-method trait for it
//! and returning itself from the matching probe on [`Model`]
//! (`as_creating`, `as_saving`, ...). The dispatcher probes the model on
//! every call and runs whatever it finds, in a fixed order:
//!
//! | operation      | before                 | after               |
//! |----------------|------------------------|---------------------|
//! | create         | `creating`, `saving`   | `created`, `saved`  |
//! | update / patch | `updating`, `saving`   | `updated`, `saved`  |
//! | delete         | `deleting`             | `deleted`           |
//!
//! The first failing hook stops the sequence. A before-hook failure means the
//! database is never called; an after-hook failure is reported even though the
//! write has already been applied.

use std::fmt;

use async_trait::async_trait;

use crate::context::OpContext;
use crate::driver::{DeleteOutcome, UpdateOutcome};
use crate::error::{HookError, MduError, MduResult};
use crate::model::Model;

/// Result returned by every hook.
pub type HookResult = Result<(), HookError>;

/// Runs before a document is inserted.
#[async_trait]
pub trait Creating: Send {
    /// Called before insert.
    async fn creating(&mut self, ctx: &OpContext) -> HookResult;
}

/// Runs after a document is inserted.
#[async_trait]
pub trait Created: Send {
    /// Called after insert.
    async fn created(&mut self, ctx: &OpContext) -> HookResult;
}

/// Runs before a document is updated.
#[async_trait]
pub trait Updating: Send {
    /// Called before update and patch.
    async fn updating(&mut self, ctx: &OpContext) -> HookResult;
}

/// Runs after a document is updated, with the match/modify counts.
#[async_trait]
pub trait Updated: Send {
    /// Called after update and patch.
    async fn updated(&mut self, ctx: &OpContext, outcome: &UpdateOutcome) -> HookResult;
}

/// Runs before both inserts and updates.
#[async_trait]
pub trait Saving: Send {
    /// Called before insert, update and patch.
    async fn saving(&mut self, ctx: &OpContext) -> HookResult;
}

/// Runs after both inserts and updates.
#[async_trait]
pub trait Saved: Send {
    /// Called after insert, update and patch.
    async fn saved(&mut self, ctx: &OpContext) -> HookResult;
}

/// Runs before a document is deleted.
#[async_trait]
pub trait Deleting: Send {
    /// Called before delete.
    async fn deleting(&mut self, ctx: &OpContext) -> HookResult;
}

/// Runs after a document is deleted, with the deleted count.
#[async_trait]
pub trait Deleted: Send {
    /// Called after delete. A zero count means nothing matched.
    async fn deleted(&mut self, ctx: &OpContext, outcome: &DeleteOutcome) -> HookResult;
}

/// A point in an operation's lifecycle where a hook can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before insert.
    Creating,
    /// After insert.
    Created,
    /// Before update.
    Updating,
    /// After update.
    Updated,
    /// Before insert or update.
    Saving,
    /// After insert or update.
    Saved,
    /// Before delete.
    Deleting,
    /// After delete.
    Deleted,
}

impl HookPoint {
    /// Whether this hook runs before the database call.
    pub fn is_before(self) -> bool {
        matches!(
            self,
            HookPoint::Creating | HookPoint::Updating | HookPoint::Saving | HookPoint::Deleting
        )
    }

    /// Lowercase hook name.
    pub fn as_str(self) -> &'static str {
        match self {
            HookPoint::Creating => "creating",
            HookPoint::Created => "created",
            HookPoint::Updating => "updating",
            HookPoint::Updated => "updated",
            HookPoint::Saving => "saving",
            HookPoint::Saved => "saved",
            HookPoint::Deleting => "deleting",
            HookPoint::Deleted => "deleted",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn tag(point: HookPoint) -> impl FnOnce(HookError) -> MduError {
    move |source| MduError::hook(point, source)
}

pub(crate) async fn before_create<M: Model>(ctx: &OpContext, model: &mut M) -> MduResult<()> {
    if let Some(hook) = model.as_creating() {
        hook.creating(ctx).await.map_err(tag(HookPoint::Creating))?;
    }
    if let Some(hook) = model.as_saving() {
        hook.saving(ctx).await.map_err(tag(HookPoint::Saving))?;
    }
    Ok(())
}

pub(crate) async fn after_create<M: Model>(ctx: &OpContext, model: &mut M) -> MduResult<()> {
    if let Some(hook) = model.as_created() {
        hook.created(ctx).await.map_err(tag(HookPoint::Created))?;
    }
    if let Some(hook) = model.as_saved() {
        hook.saved(ctx).await.map_err(tag(HookPoint::Saved))?;
    }
    Ok(())
}

pub(crate) async fn before_update<M: Model>(ctx: &OpContext, model: &mut M) -> MduResult<()> {
    if let Some(hook) = model.as_updating() {
        hook.updating(ctx).await.map_err(tag(HookPoint::Updating))?;
    }
    if let Some(hook) = model.as_saving() {
        hook.saving(ctx).await.map_err(tag(HookPoint::Saving))?;
    }
    Ok(())
}

pub(crate) async fn after_update<M: Model>(
    ctx: &OpContext,
    model: &mut M,
    outcome: &UpdateOutcome,
) -> MduResult<()> {
    if let Some(hook) = model.as_updated() {
        hook.updated(ctx, outcome)
            .await
            .map_err(tag(HookPoint::Updated))?;
    }
    if let Some(hook) = model.as_saved() {
        hook.saved(ctx).await.map_err(tag(HookPoint::Saved))?;
    }
    Ok(())
}

pub(crate) async fn before_delete<M: Model>(ctx: &OpContext, model: &mut M) -> MduResult<()> {
    if let Some(hook) = model.as_deleting() {
        hook.deleting(ctx).await.map_err(tag(HookPoint::Deleting))?;
    }
    Ok(())
}

pub(crate) async fn after_delete<M: Model>(
    ctx: &OpContext,
    model: &mut M,
    outcome: &DeleteOutcome,
) -> MduResult<()> {
    if let Some(hook) = model.as_deleted() {
        hook.deleted(ctx, outcome)
            .await
            .map_err(tag(HookPoint::Deleted))?;
    }
    Ok(())
}
