//! In-process storage backend.
//!
//! A unit of work takes the single state lock, mutates a private copy and
//! swaps it in on commit, so units of work are serialized and a dropped one
//! leaves no trace. The same uniqueness rules as the Postgres schema apply.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus, Category, Product, Topping};
use crate::db::models::requests::{ChangeRequest, PendingKey, RequestFilter, RequestStatus};
use crate::db::models::store::{MembershipEntry, Store};
use crate::db::repository::{Repository, UnitOfWork};
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    requests: Vec<ChangeRequest>,
    stores: HashMap<Uuid, Store>,
    memberships: HashMap<(Uuid, CatalogKind), Vec<MembershipEntry>>,
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    toppings: HashMap<Uuid, Topping>,
}

impl MemoryState {
    fn request_mut(&mut self, id: Uuid) -> Option<&mut ChangeRequest> {
        self.requests.iter_mut().find(|r| r.id == id)
    }

    fn list_mut(&mut self, store_id: Uuid, kind: CatalogKind) -> &mut Vec<MembershipEntry> {
        self.memberships.entry((store_id, kind)).or_default()
    }

    fn link(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: CatalogStatus,
        now: DateTime<Utc>,
    ) {
        let list = self.list_mut(store_id, kind);
        match list.iter_mut().find(|e| e.entity_id == entity_id) {
            Some(entry) => {
                entry.store_status = store_status;
                entry.last_updated = now;
            }
            None => list.push(MembershipEntry {
                entity_id,
                store_status,
                added_at: now,
                last_updated: now,
            }),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_store(&self, store: Store) {
        self.state.lock().await.stores.insert(store.id, store);
    }

    pub async fn seed_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub async fn seed_category(&self, category: Category) {
        self.state.lock().await.categories.insert(category.id, category);
    }

    pub async fn seed_topping(&self, topping: Topping) {
        self.state.lock().await.toppings.insert(topping.id, topping);
    }

    /// Add `entity_id` to the store's list for `kind`.
    pub async fn seed_membership(
        &self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: CatalogStatus,
    ) {
        self.state
            .lock()
            .await
            .link(store_id, kind, entity_id, store_status, Utc::now());
    }

    /// Entries of a store's membership list, in insertion order.
    pub async fn memberships(&self, store_id: Uuid, kind: CatalogKind) -> Vec<MembershipEntry> {
        self.state
            .lock()
            .await
            .memberships
            .get(&(store_id, kind))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_request(&mut self, request: &ChangeRequest) -> AppResult<()> {
        if self.working.requests.iter().any(|r| r.id == request.id) {
            return Err(AppError::conflict("Request id already exists"));
        }
        // mirrors the partial unique index on pending targeted requests
        if request.status == RequestStatus::Pending && request.target_id.is_some() {
            let key = request.pending_key();
            if self.pending_exists(&key).await? {
                return Err(AppError::conflict(
                    "A pending request already exists for this target",
                ));
            }
        }
        self.working.requests.push(request.clone());
        Ok(())
    }

    async fn find_request(&mut self, id: Uuid) -> AppResult<Option<ChangeRequest>> {
        Ok(self.working.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn find_request_for_update(&mut self, id: Uuid) -> AppResult<Option<ChangeRequest>> {
        // the unit of work already holds the global lock
        self.find_request(id).await
    }

    async fn list_requests(&mut self, filter: &RequestFilter) -> AppResult<Vec<ChangeRequest>> {
        let mut matched: Vec<ChangeRequest> = self
            .working
            .requests
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn pending_exists(&mut self, key: &PendingKey) -> AppResult<bool> {
        Ok(self
            .working
            .requests
            .iter()
            .any(|r| r.status == RequestStatus::Pending && r.pending_key() == *key))
    }

    async fn update_pending_request(&mut self, request: &ChangeRequest) -> AppResult<bool> {
        match self.working.request_mut(request.id) {
            Some(stored) if stored.status == RequestStatus::Pending => {
                *stored = request.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_store(&mut self, id: Uuid) -> AppResult<Option<Store>> {
        Ok(self.working.stores.get(&id).cloned())
    }

    async fn find_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
    ) -> AppResult<Option<MembershipEntry>> {
        Ok(self
            .working
            .memberships
            .get(&(store_id, kind))
            .and_then(|list| list.iter().find(|e| e.entity_id == entity_id))
            .cloned())
    }

    async fn upsert_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: CatalogStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.working.link(store_id, kind, entity_id, store_status, now);
        Ok(())
    }

    async fn touch_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
        store_status: Option<CatalogStatus>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let list = self.working.list_mut(store_id, kind);
        match list.iter_mut().find(|e| e.entity_id == entity_id) {
            Some(entry) => {
                if let Some(status) = store_status {
                    entry.store_status = status;
                }
                entry.last_updated = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_membership(
        &mut self,
        store_id: Uuid,
        kind: CatalogKind,
        entity_id: Uuid,
    ) -> AppResult<bool> {
        let list = self.working.list_mut(store_id, kind);
        let before = list.len();
        list.retain(|e| e.entity_id != entity_id);
        Ok(list.len() < before)
    }

    async fn insert_product(&mut self, product: &Product) -> AppResult<()> {
        if self.working.products.contains_key(&product.id) {
            return Err(AppError::conflict("Product id already exists"));
        }
        self.working.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn find_product_for_update(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        self.find_product(id).await
    }

    async fn update_product(&mut self, product: &Product) -> AppResult<bool> {
        match self.working.products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_category(&mut self, category: &Category) -> AppResult<()> {
        if self.working.categories.contains_key(&category.id) {
            return Err(AppError::conflict("Category id already exists"));
        }
        self.working.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_category(&mut self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn find_category_for_update(&mut self, id: Uuid) -> AppResult<Option<Category>> {
        self.find_category(id).await
    }

    async fn update_category(&mut self, category: &Category) -> AppResult<bool> {
        match self.working.categories.get_mut(&category.id) {
            Some(stored) => {
                *stored = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_topping(&mut self, topping: &Topping) -> AppResult<()> {
        if self.working.toppings.contains_key(&topping.id) {
            return Err(AppError::conflict("Topping id already exists"));
        }
        self.working.toppings.insert(topping.id, topping.clone());
        Ok(())
    }

    async fn find_topping(&mut self, id: Uuid) -> AppResult<Option<Topping>> {
        Ok(self.working.toppings.get(&id).cloned())
    }

    async fn find_topping_for_update(&mut self, id: Uuid) -> AppResult<Option<Topping>> {
        self.find_topping(id).await
    }

    async fn update_topping(&mut self, topping: &Topping) -> AppResult<bool> {
        match self.working.toppings.get_mut(&topping.id) {
            Some(stored) => {
                *stored = topping.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
