use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The three catalog record kinds a store keeps a membership list for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Product,
    Category,
    Topping,
}

impl CatalogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Category => "category",
            CatalogKind::Topping => "topping",
        }
    }

    /// `out_of_stock` only exists for products.
    pub fn supports_status(self, status: CatalogStatus) -> bool {
        status != CatalogStatus::OutOfStock || self == CatalogKind::Product
    }
}

/// Lifecycle status, used both for global records and store memberships.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "catalog_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    Available,
    Paused,
    Unavailable,
    OutOfStock,
}

impl Default for CatalogStatus {
    fn default() -> Self {
        CatalogStatus::Available
    }
}

impl CatalogStatus {
    /// Whether a store may offer the record as `available` under this global status.
    pub fn permits_store_available(self) -> bool {
        self == CatalogStatus::Available
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogStatus::Available => "available",
            CatalogStatus::Paused => "paused",
            CatalogStatus::Unavailable => "unavailable",
            CatalogStatus::OutOfStock => "out_of_stock",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct SizeOption {
    pub size: String,
    pub price: i64,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category_id: Option<Uuid>,
    pub images: Vec<String>,
    #[sqlx(json)]
    pub size_options: Vec<SizeOption>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Topping {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub extra_price: i64,
    pub status: CatalogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            price,
            category_id: None,
            images: Vec::new(),
            size_options: Vec::new(),
            status: CatalogStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            status: CatalogStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Topping {
    pub fn new(name: impl Into<String>, extra_price: i64) -> Self {
        let now = Utc::now();
        Topping {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            extra_price,
            status: CatalogStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }
}
