//! Storage contract for the change-request workflow.
//!
//! Every workflow operation opens one [`UnitOfWork`], performs its reads and
//! writes through it and calls [`UnitOfWork::commit`]. Dropping a unit of work
//! without committing discards all of its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus, Category, Product, Topping};
use crate::db::models::requests::{ChangeRequest, PendingKey, RequestFilter};
use crate::db::models::store::{MembershipEntry, Store};
use crate::utils::error::AppResult;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Open a new all-or-nothing unit of work.
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    /// Cheap connectivity check behind `/health/ready`.
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // change requests

    /// Insert a new request. A second pending request for the same
    /// [`PendingKey`] (with a target) fails with `AppError::Conflict`.
    async fn insert_request(&mut self, request: &ChangeRequest) -> AppResult<()>;

    async fn find_request(&mut self, id: Uuid) -> AppResult<Option<ChangeRequest>>;

    /// Like [`find_request`](Self::find_request) but locks the row until the
    /// unit of work ends.
    async fn find_request_for_update(&mut self, id: Uuid) -> AppResult<Option<ChangeRequest>>;

    async fn list_requests(&mut self, filter: &RequestFilter) -> AppResult<Vec<ChangeRequest>>;

    async fn pending_exists(&mut self, key: &PendingKey) -> AppResult<bool>;

    /// Persist every mutable field of `request`, but only if the stored copy is
    /// still pending. Returns `false` when the stored status had already moved on.
    async fn update_pending_request(&mut self, request: &ChangeRequest) -> AppResult<bool>;

    // stores and membership lists

    async fn find_store(&mut self, id: Uuid) -> AppResult<Option<Store>>;

    async fn find_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
    ) -> AppResult<Option<MembershipEntry>>;

    /// Insert the entry, or refresh status and `last_updated` if already present.
    async fn upsert_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: CatalogStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Bump `last_updated` (and optionally `store_status`). Returns `false`
    /// when the store has no entry for `entity_id`.
    async fn touch_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: Option<CatalogStatus>,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Pull the entry out of the store's list. Returns `false` if absent.
    async fn remove_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
    ) -> AppResult<bool>;

    // catalog records; approval reads them with a row lock before writing them back

    async fn insert_product(&mut self, product: &Product) -> AppResult<()>;
    async fn find_product(&mut self, id: Uuid) -> AppResult<Option<Product>>;
    /// Same as `find_product`, but holds a row lock until the unit of work ends.
    async fn find_product_for_update(&mut self, id: Uuid) -> AppResult<Option<Product>>;
    async fn update_product(&mut self, product: &Product) -> AppResult<bool>;

    async fn insert_category(&mut self, category: &Category) -> AppResult<()>;
    async fn find_category(&mut self, id: Uuid) -> AppResult<Option<Category>>;
    async fn find_category_for_update(&mut self, id: Uuid) -> AppResult<Option<Category>>;
    async fn update_category(&mut self, category: &Category) -> AppResult<bool>;

    async fn insert_topping(&mut self, topping: &Topping) -> AppResult<()>;
    async fn find_topping(&mut self, id: Uuid) -> AppResult<Option<Topping>>;
    async fn find_topping_for_update(&mut self, id: Uuid) -> AppResult<Option<Topping>>;
    async fn update_topping(&mut self, topping: &Topping) -> AppResult<bool>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
