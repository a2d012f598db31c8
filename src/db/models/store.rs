use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::catalog::CatalogStatus;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn new(name: impl Into<String>, manager_id: Option<Uuid>) -> Self {
        Store {
            id: Uuid::new_v4(),
            name: name.into(),
            manager_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_managed_by(&self, user_id: Uuid) -> bool {
        self.manager_id == Some(user_id)
    }
}

/// Links a global catalog record to one store with a store-local status.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipEntry {
    pub entity_id: Uuid,
    pub store_status: CatalogStatus,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}
