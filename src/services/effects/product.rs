use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::db::models::catalog::{CatalogKind, CatalogStatus, Product};
use crate::db::models::requests::{ChangeRequest, Payload, RequestAction, RequestEntity};
use crate::db::models::store::Store;
use crate::db::repository::UnitOfWork;
use crate::services::effects::{ensure_store_status, require_target, unlink, unsupported_action, EffectHandler};
use crate::services::validation::{parse_payload, CategoryRef, ProductPayload};
use crate::utils::error::{AppError, AppResult};

pub struct ProductEffects;

#[async_trait]
impl EffectHandler for ProductEffects {
    async fn apply(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &ChangeRequest,
        store: &Store,
    ) -> AppResult<Option<Payload>> {
        match request.action {
            RequestAction::Create => create(uow, request, store).await.map(Some),
            RequestAction::Update => update(uow, request, store).await.map(|_| None),
            RequestAction::Delete => delete(uow, request, store).await.map(|_| None),
            _ => Err(unsupported_action(request)),
        }
    }
}

async fn ensure_category_exists(uow: &mut dyn UnitOfWork, category: CategoryRef) -> AppResult<()> {
    if uow.find_category(category.id()).await?.is_none() {
        return Err(AppError::not_found(format!("Category {} not found", category.id())));
    }
    Ok(())
}

async fn create(uow: &mut dyn UnitOfWork, request: &ChangeRequest, store: &Store) -> AppResult<Payload> {
    let data: ProductPayload = parse_payload(RequestEntity::Product, &request.payload)?;
    let name = data
        .name
        .ok_or_else(|| AppError::validation("name is required to create a product"))?;
    let price = data
        .price
        .ok_or_else(|| AppError::validation("price is required to create a product"))?;

    if let Some(category) = data.category {
        ensure_category_exists(uow, category).await?;
    }

    let mut product = Product::new(name.trim(), price);
    product.description = data.description;
    product.category_id = data.category.map(CategoryRef::id);
    product.images = data.images.unwrap_or_default();
    product.size_options = data.size_options.unwrap_or_default();
    product.status = data.status.unwrap_or_default();
    uow.insert_product(&product).await?;

    let store_status = data.status.unwrap_or(CatalogStatus::Available);
    ensure_store_status(CatalogKind::Product, product.status, store_status)?;
    uow.upsert_membership(store.id, CatalogKind::Product, product.id, store_status, product.created_at)
        .await?;

    tracing::info!("Created product {} for store {}", product.id, store.id);

    let mut patch = Payload::new();
    patch.insert("productId".to_string(), json!(product.id));
    Ok(patch)
}

async fn update(uow: &mut dyn UnitOfWork, request: &ChangeRequest, store: &Store) -> AppResult<()> {
    let target = require_target(request)?;
    let data: ProductPayload = parse_payload(RequestEntity::Product, &request.payload)?;
    let payload = &request.payload;

    let mut product = uow
        .find_product_for_update(target)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", target)))?;

    if let Some(name) = data.name {
        product.name = name.trim().to_string();
    }
    if payload.contains_key("description") {
        product.description = data.description;
    }
    if let Some(price) = data.price {
        product.price = price;
    }
    if let Some(size_options) = data.size_options {
        product.size_options = size_options;
    }
    if let Some(images) = data.images {
        product.images = images;
    }
    match payload.get("category") {
        Some(Value::Null) => product.category_id = None,
        Some(_) => {
            if let Some(category) = data.category {
                ensure_category_exists(uow, category).await?;
                product.category_id = Some(category.id());
            }
        }
        None => {}
    }
    if let Some(status) = data.status {
        product.status = status;
    }

    let now = Utc::now();
    product.updated_at = now;
    if !uow.update_product(&product).await? {
        return Err(AppError::not_found(format!("Product {} not found", target)));
    }

    if !uow
        .touch_membership(store.id, CatalogKind::Product, target, None, now)
        .await?
    {
        tracing::warn!("Product {} has no membership entry in store {}", target, store.id);
    }
    Ok(())
}

/// Unlinks from the store and deactivates the product globally.
async fn delete(uow: &mut dyn UnitOfWork, request: &ChangeRequest, store: &Store) -> AppResult<()> {
    let target = require_target(request)?;

    unlink(uow, store, CatalogKind::Product, target).await?;

    let mut product = uow
        .find_product_for_update(target)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", target)))?;
    product.status = CatalogStatus::Unavailable;
    product.updated_at = Utc::now();
    uow.update_product(&product).await?;

    tracing::info!("Product {} removed from store {} and marked unavailable", target, store.id);
    Ok(())
}
