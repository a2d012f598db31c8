use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus, Topping};
use crate::db::models::requests::{ChangeRequest, Payload, RequestAction, RequestEntity};
use crate::db::models::store::Store;
use crate::db::repository::UnitOfWork;
use crate::services::effects::{
    ensure_store_status, require_target, set_store_status, unlink, unsupported_action, EffectHandler,
};
use crate::services::validation::{parse_payload, ToppingPayload};
use crate::utils::error::{AppError, AppResult};

pub struct ToppingEffects;

#[async_trait]
impl EffectHandler for ToppingEffects {
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
                // membership only; the topping itself remains
                let target = require_target(request)?;
                unlink(uow, store, CatalogKind::Topping, target).await?;
                Ok(None)
            }
            _ => Err(unsupported_action(request)),
        }
    }
}

async fn load(uow: &mut dyn UnitOfWork, id: Uuid) -> AppResult<Topping> {
    uow.find_topping_for_update(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Topping {} not found", id)))
}

async fn create(
    uow: &mut dyn UnitOfWork,
    request: &ChangeRequest,
    store: &Store,
) -> AppResult<Option<Payload>> {
    let data: ToppingPayload = parse_payload(RequestEntity::Topping, &request.payload)?;

    let (topping, patch) = match data.topping_id {
        Some(existing) => (load(uow, existing).await?, None),
        None => {
            let name = data
                .name
                .ok_or_else(|| AppError::validation("name is required to create a topping"))?;
            let mut topping = Topping::new(name.trim(), data.extra_price.unwrap_or(0));
            topping.description = data.description;
            topping.status = data.status.unwrap_or_default();
            uow.insert_topping(&topping).await?;

            let mut patch = Payload::new();
            patch.insert("toppingId".to_string(), json!(topping.id));
            (topping, Some(patch))
        }
    };

    let store_status = data.store_status.unwrap_or(CatalogStatus::Available);
    ensure_store_status(CatalogKind::Topping, topping.status, store_status)?;
    uow.upsert_membership(store.id, CatalogKind::Topping, topping.id, store_status, Utc::now())
        .await?;

    tracing::info!("Linked topping {} to store {}", topping.id, store.id);
    Ok(patch)
}

async fn update(uow: &mut dyn UnitOfWork, request: &ChangeRequest, store: &Store) -> AppResult<()> {
    let target = require_target(request)?;
    let data: ToppingPayload = parse_payload(RequestEntity::Topping, &request.payload)?;
    let payload = &request.payload;
    let now = Utc::now();

    let touches_global = ["name", "description", "extraPrice", "status"]
        .iter()
        .any(|field| payload.contains_key(*field));

    let mut topping = load(uow, target).await?;

    if touches_global {
        if let Some(name) = data.name {
            topping.name = name.trim().to_string();
        }
        if payload.contains_key("description") {
            topping.description = data.description;
        }
        if let Some(extra_price) = data.extra_price {
            topping.extra_price = extra_price;
        }
        if let Some(status) = data.status {
            topping.status = status;
        }
        topping.updated_at = now;
        if !uow.update_topping(&topping).await? {
            return Err(AppError::not_found(format!("Topping {} not found", target)));
        }
    }

    if let Some(store_status) = data.store_status {
        set_store_status(uow, store, CatalogKind::Topping, target, topping.status, store_status, now)
            .await?;
    }
    Ok(())
}
