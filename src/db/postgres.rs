use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus, Category, Product, Topping};
use crate::db::models::requests::{ChangeRequest, PendingKey, RequestFilter};
use crate::db::models::store::{MembershipEntry, Store};
use crate::db::queries::{catalog, requests, stores};
use crate::db::repository::{Repository, UnitOfWork};
use crate::utils::error::{AppError, AppResult};

/// Postgres-backed repository; each unit of work is one database transaction.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Partial unique index guarding one pending request per target.
const PENDING_TARGET_INDEX: &str = "change_requests_one_pending_per_target";

fn is_pending_target_violation(constraint: Option<&str>) -> bool {
    constraint == Some(PENDING_TARGET_INDEX)
}

fn insert_request_error(err: sqlx::Error) -> AppError {
    let duplicate_pending = match &err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && is_pending_target_violation(db_err.constraint())
        }
        _ => false,
    };
    if duplicate_pending {
        AppError::conflict("A pending request already exists for this target")
    } else {
        AppError::from(err)
    }
}

/// Rolls back on drop unless committed.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_request(&mut self, request: &ChangeRequest) -> AppResult<()> {
        requests::insert_request(&mut self.tx, request)
            .await
            .map_err(insert_request_error)
    }

    async fn find_request(&mut self, id: Uuid) -> AppResult<Option<ChangeRequest>> {
        Ok(requests::get_request(&mut self.tx, id, false).await?)
    }

    async fn find_request_for_update(&mut self, id: Uuid) -> AppResult<Option<ChangeRequest>> {
        Ok(requests::get_request(&mut self.tx, id, true).await?)
    }

    async fn list_requests(&mut self, filter: &RequestFilter) -> AppResult<Vec<ChangeRequest>> {
        Ok(requests::list_requests(&mut self.tx, filter).await?)
    }

    async fn pending_exists(&mut self, key: &PendingKey) -> AppResult<bool> {
        Ok(requests::pending_exists(&mut self.tx, key).await?)
    }

    async fn update_pending_request(&mut self, request: &ChangeRequest) -> AppResult<bool> {
        Ok(requests::update_pending_request(&mut self.tx, request).await?)
    }

    async fn find_store(&mut self, id: Uuid) -> AppResult<Option<Store>> {
        Ok(stores::get_store(&mut self.tx, id).await?)
    }

    async fn find_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
    ) -> AppResult<Option<MembershipEntry>> {
        Ok(stores::get_membership(&mut self.tx, store_id, kind, entity_id).await?)
    }

    async fn upsert_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: CatalogStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        Ok(stores::upsert_membership(&mut self.tx, store_id, kind, entity_id, store_status, now).await?)
    }

    async fn touch_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: Option<CatalogStatus>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(stores::touch_membership(&mut self.tx, store_id, kind, entity_id, store_status, now).await?)
    }

    async fn remove_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
    ) -> AppResult<bool> {
        Ok(stores::remove_membership(&mut self.tx, store_id, kind, entity_id).await?)
    }

    async fn insert_product(&mut self, product: &Product) -> AppResult<()> {
        Ok(catalog::insert_product(&mut self.tx, product).await?)
    }

    async fn find_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(catalog::get_product(&mut self.tx, id, false).await?)
    }

    async fn find_product_for_update(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(catalog::get_product(&mut self.tx, id, true).await?)
    }

    async fn update_product(&mut self, product: &Product) -> AppResult<bool> {
        Ok(catalog::update_product(&mut self.tx, product).await?)
    }

    async fn insert_category(&mut self, category: &Category) -> AppResult<()> {
        Ok(catalog::insert_category(&mut self.tx, category).await?)
    }

    async fn find_category(&mut self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(catalog::get_category(&mut self.tx, id, false).await?)
    }

    async fn find_category_for_update(&mut self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(catalog::get_category(&mut self.tx, id, true).await?)
    }

    async fn update_category(&mut self, category: &Category) -> AppResult<bool> {
        Ok(catalog::update_category(&mut self.tx, category).await?)
    }

    async fn insert_topping(&mut self, topping: &Topping) -> AppResult<()> {
        Ok(catalog::insert_topping(&mut self.tx, topping).await?)
    }

    async fn find_topping(&mut self, id: Uuid) -> AppResult<Option<Topping>> {
        Ok(catalog::get_topping(&mut self.tx, id, false).await?)
    }

    async fn find_topping_for_update(&mut self, id: Uuid) -> AppResult<Option<Topping>> {
        Ok(catalog::get_topping(&mut self.tx, id, true).await?)
    }

    async fn update_topping(&mut self, topping: &Topping) -> AppResult<bool> {
        Ok(catalog::update_topping(&mut self.tx, topping).await?)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
