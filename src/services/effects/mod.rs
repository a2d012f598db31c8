//! Entity-specific translation of an approved request into catalog and
//! membership mutations.
//!
//! Handlers run inside the approval's unit of work and never touch the request
//! record itself. Ids minted during `create` are handed back as a payload patch
//! which the approval merges into the request before finalising it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus};
use crate::db::models::requests::{ChangeRequest, Payload, RequestEntity};
use crate::db::models::store::Store;
use crate::db::repository::UnitOfWork;
use crate::utils::error::{AppError, AppResult};

pub mod category;
pub mod product;
pub mod topping;

pub use category::CategoryEffects;
pub use product::ProductEffects;
pub use topping::ToppingEffects;

#[async_trait]
pub trait EffectHandler: Send + Sync {
    /// Apply `request` to the catalog and to `store`'s membership list.
    ///
    /// Returns fields to merge into the request payload, if any.
    async fn apply(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &ChangeRequest,
        store: &Store,
    ) -> AppResult<Option<Payload>>;
}

/// Effect handler for `entity`. Order and payment requests have none yet.
pub fn handler_for(entity: RequestEntity) -> AppResult<&'static dyn EffectHandler> {
    match entity {
        RequestEntity::Product => Ok(&ProductEffects),
        RequestEntity::Category => Ok(&CategoryEffects),
        RequestEntity::Topping => Ok(&ToppingEffects),
        RequestEntity::Order | RequestEntity::Payment => Err(AppError::validation(format!(
            "Entity '{}' is not supported",
            entity.as_str()
        ))),
    }
}

pub(crate) fn require_target(request: &ChangeRequest) -> AppResult<Uuid> {
    request.target_id.ok_or_else(|| {
        AppError::validation(format!(
            "targetId is required to {} a {}",
            request.action.as_str(),
            request.entity.as_str()
        ))
    })
}

pub(crate) fn unsupported_action(request: &ChangeRequest) -> AppError {
    AppError::validation(format!(
        "Unsupported action '{}' for entity '{}'",
        request.action.as_str(),
        request.entity.as_str()
    ))
}

/// A store may only offer a record as `available` while it is globally available.
pub(crate) fn ensure_store_status(
    kind: CatalogKind,
    global: CatalogStatus,
    store_status: CatalogStatus,
) -> AppResult<()> {
    if store_status == CatalogStatus::Available && !global.permits_store_available() {
        return Err(AppError::validation(format!(
            "Cannot make {} available in store while it is globally {}",
            kind.as_str(),
            global.as_str()
        )));
    }
    Ok(())
}

/// Set the store-scoped status of an existing membership entry.
pub(crate) async fn set_store_status(
    uow: &mut dyn UnitOfWork,
    store: &Store,
    kind: CatalogKind,
    entity_id: Uuid,
    global: CatalogStatus,
    store_status: CatalogStatus,
    now: DateTime<Utc>,
) -> AppResult<()> {
    ensure_store_status(kind, global, store_status)?;
    let touched = uow
        .touch_membership(store.id, kind, entity_id, Some(store_status), now)
        .await?;
    if !touched {
        return Err(AppError::not_found(format!(
            "{} {} is not linked to store {}",
            kind.as_str(),
            entity_id,
            store.id
        )));
    }
    Ok(())
}

/// Pull `entity_id` from the store's list; a missing entry is not an error.
pub(crate) async fn unlink(
    uow: &mut dyn UnitOfWork,
    store: &Store,
    kind: CatalogKind,
    entity_id: Uuid,
) -> AppResult<()> {
    if !uow.remove_membership(store.id, kind, entity_id).await? {
        tracing::warn!(
            "{} {} was already absent from store {}",
            kind.as_str(),
            entity_id,
            store.id
        );
    }
    Ok(())
}
