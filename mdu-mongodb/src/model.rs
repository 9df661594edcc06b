//! The model contract and the default field bundles.

use async_trait::async_trait;
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::context::OpContext;
use crate::error::MduResult;
use crate::field::{self, DateFields, IdField, TenantField};
use crate::hooks::{
    Created, Creating, Deleted, Deleting, HookResult, Saved, Saving, Updated, Updating,
};

/// An entity persisted in a collection.
///
/// Only identity is required. Every hook probe defaults to `None`; override
/// the ones the model supports to return `Some(self)` (or a field that
/// implements the hook).
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// The current identifier, empty when unset.
    fn id(&self) -> &str;

    /// Replace the identifier.
    fn set_id(&mut self, id: String);

    /// Turn a candidate identifier into the one that will be stored.
    ///
    /// Runs once, right before insert. The default keeps a non-empty
    /// candidate and generates a UUID otherwise. Custom policies reject
    /// malformed input with [`MduError::Validation`](crate::MduError::Validation).
    fn prepare_id(&self, candidate: &str) -> MduResult<String> {
        field::prepare_id(candidate)
    }

    /// Collection name used by [`MduClient::collection_for`](crate::MduClient::collection_for).
    fn collection_name() -> String
    where
        Self: Sized,
    {
        collection_name::<Self>()
    }

    /// Enables the [`Creating`] hook, run before insert.
    fn as_creating(&mut self) -> Option<&mut dyn Creating> {
        None
    }

    /// Enables the [`Created`] hook, run after insert.
    fn as_created(&mut self) -> Option<&mut dyn Created> {
        None
    }

    /// Enables the [`Updating`] hook, run before update and patch.
    fn as_updating(&mut self) -> Option<&mut dyn Updating> {
        None
    }

    /// Enables the [`Updated`] hook, run after update and patch.
    fn as_updated(&mut self) -> Option<&mut dyn Updated> {
        None
    }

    /// Enables the [`Saving`] hook, run before insert, update and patch.
    fn as_saving(&mut self) -> Option<&mut dyn Saving> {
        None
    }

    /// Enables the [`Saved`] hook, run after insert, update and patch.
    fn as_saved(&mut self) -> Option<&mut dyn Saved> {
        None
    }

    /// Enables the [`Deleting`] hook, run before delete.
    fn as_deleting(&mut self) -> Option<&mut dyn Deleting> {
        None
    }

    /// Enables the [`Deleted`] hook, run after delete.
    fn as_deleted(&mut self) -> Option<&mut dyn Deleted> {
        None
    }
}

/// Default collection name for a type: camelCase of the type name plus `s`.
///
/// `PurchaseOrder`, `purchaseOrder` and `purchase_Order` all map to
/// `purchaseOrders`.
pub fn collection_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    format!("{}s", short.to_case(Case::Camel))
}

/// Identifier plus timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultModel {
    #[serde(flatten)]
    pub id_field: IdField,
    #[serde(flatten)]
    pub dates: DateFields,
}

/// Identifier, timestamps and tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultTenantModel {
    #[serde(flatten)]
    pub id_field: IdField,
    #[serde(flatten)]
    pub dates: DateFields,
    #[serde(flatten)]
    pub tenant: TenantField,
}

macro_rules! default_fields {
    ($ty:ty) => {
        impl $ty {
            /// Apply the default identifier policy.
            pub fn prepare_id(&self, candidate: &str) -> MduResult<String> {
                self.id_field.prepare_id(candidate)
            }

            /// The current identifier.
            pub fn id(&self) -> &str {
                self.id_field.id()
            }

            /// Replace the identifier.
            pub fn set_id(&mut self, id: String) {
                self.id_field.set_id(id);
            }
        }

        #[async_trait]
        impl Creating for $ty {
            async fn creating(&mut self, ctx: &OpContext) -> HookResult {
                self.dates.creating(ctx).await
            }
        }

        #[async_trait]
        impl Saving for $ty {
            async fn saving(&mut self, ctx: &OpContext) -> HookResult {
                self.dates.saving(ctx).await
            }
        }
    };
}

default_fields!(DefaultModel);
default_fields!(DefaultTenantModel);

impl DefaultTenantModel {
    /// A model scoped to `tenant_id`.
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant: TenantField {
                tenant_id: tenant_id.into(),
            },
            ..Self::default()
        }
    }

    /// The tenant this record belongs to.
    pub fn tenant_id(&self) -> &str {
        &self.tenant.tenant_id
    }
}

/// Implement [`Model`] for an entity that embeds a [`DefaultModel`] or
/// [`DefaultTenantModel`] field, delegating identity and the timestamp hooks
/// to it.
///
/// ```rust
/// use mdu_mongodb::{DefaultModel, impl_model};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Product {
///     #[serde(flatten)]
///     base: DefaultModel,
///     name: String,
///     price: i64,
/// }
///
/// impl_model!(Product, base);
/// ```
#[macro_export]
macro_rules! impl_model {
    ($ty:ty, $base:ident) => {
        impl $crate::Model for $ty {
            fn id(&self) -> &str {
                self.$base.id()
            }

            fn set_id(&mut self, id: ::std::string::String) {
                self.$base.set_id(id);
            }

            fn prepare_id(&self, candidate: &str) -> $crate::MduResult<::std::string::String> {
                self.$base.prepare_id(candidate)
            }

            fn as_creating(&mut self) -> ::std::option::Option<&mut dyn $crate::hooks::Creating> {
                ::std::option::Option::Some(&mut self.$base)
            }

            fn as_saving(&mut self) -> ::std::option::Option<&mut dyn $crate::hooks::Saving> {
                ::std::option::Option::Some(&mut self.$base)
            }
        }
    };
}
