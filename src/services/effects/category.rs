use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::db::models::catalog::{CatalogKind, CatalogStatus, Category};
use crate::db::models::requests::{ChangeRequest, Payload, RequestAction, RequestEntity};
use crate::db::models::store::Store;
use crate::db::repository::UnitOfWork;
use crate::services::effects::{
    ensure_store_status, require_target, set_store_status, unlink, unsupported_action, EffectHandler,
};
use crate::services::validation::{parse_payload, CategoryPayload};
use crate::utils::error::{AppError, AppResult};

pub struct CategoryEffects;

#[async_trait]
impl EffectHandler for CategoryEffects {
    async fn apply(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &ChangeRequest,
        store: &Store,
    ) -> AppResult<Option<Payload>> {
        match request.action {
            RequestAction::Create => create(uow, request, store).await,
            RequestAction::Update => update(uow, request, store).await.map(|_| None),
            RequestAction::Delete => {
                // the global category stays untouched
                let target = require_target(request)?;
                unlink(uow, store, CatalogKind::Category, target).await?;
                Ok(None)
            }
            _ => Err(unsupported_action(request)),
        }
    }
}

async fn load(uow: &mut dyn UnitOfWork, id: uuid::Uuid) -> AppResult<Category> {
    uow.find_category_for_update(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {} not found", id)))
}

/// Either links an existing global category (`categoryId` given) or creates one.
async fn create(
    uow: &mut dyn UnitOfWork,
    request: &ChangeRequest,
    store: &Store,
) -> AppResult<Option<Payload>> {
    let data: CategoryPayload = parse_payload(RequestEntity::Category, &request.payload)?;

    let (category, patch) = match data.category_id {
        Some(existing) => (load(uow, existing).await?, None),
        None => {
            let name = data
                .name
                .ok_or_else(|| AppError::validation("name is required to create a category"))?;
            let mut category = Category::new(name.trim());
            category.description = data.description;
            category.status = data.status.unwrap_or_default();
            uow.insert_category(&category).await?;

            let mut patch = Payload::new();
            patch.insert("categoryId".to_string(), json!(category.id));
            (category, Some(patch))
        }
    };

    let store_status = data.store_status.unwrap_or(CatalogStatus::Available);
    ensure_store_status(CatalogKind::Category, category.status, store_status)?;
    uow.upsert_membership(store.id, CatalogKind::Category, category.id, store_status, Utc::now())
        .await?;

    tracing::info!("Linked category {} to store {}", category.id, store.id);
    Ok(patch)
}

/// Global fields and the store-scoped status are applied independently.
async fn update(uow: &mut dyn UnitOfWork, request: &ChangeRequest, store: &Store) -> AppResult<()> {
    let target = require_target(request)?;
    let data: CategoryPayload = parse_payload(RequestEntity::Category, &request.payload)?;
    let payload = &request.payload;
    let now = Utc::now();

    let touches_global = payload.contains_key("name")
        || payload.contains_key("description")
        || payload.contains_key("status");

    let mut category = load(uow, target).await?;

    if touches_global {
        if let Some(name) = data.name {
            category.name = name.trim().to_string();
        }
        if payload.contains_key("description") {
            category.description = data.description;
        }
        if let Some(status) = data.status {
            category.status = status;
        }
        category.updated_at = now;
        if !uow.update_category(&category).await? {
            return Err(AppError::not_found(format!("Category {} not found", target)));
        }
    }

    if let Some(store_status) = data.store_status {
        set_store_status(uow, store, CatalogKind::Category, target, category.status, store_status, now)
            .await?;
    }
    Ok(())
}
