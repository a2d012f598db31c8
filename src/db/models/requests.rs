// src/db/models/requests.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::models::catalog::CatalogKind;

/// Proposed field values, keyed by field name.
pub type Payload = Map<String, Value>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_entity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestEntity {
    Product,
    Category,
    Topping,
    Order,
    Payment,
}

impl RequestEntity {
    /// Catalog kind whose store membership list this entity lives in, if any.
    pub fn catalog_kind(self) -> Option<CatalogKind> {
        match self {
            RequestEntity::Product => Some(CatalogKind::Product),
            RequestEntity::Category => Some(CatalogKind::Category),
            RequestEntity::Topping => Some(CatalogKind::Topping),
            RequestEntity::Order | RequestEntity::Payment => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestEntity::Product => "product",
            RequestEntity::Category => "category",
            RequestEntity::Topping => "topping",
            RequestEntity::Order => "order",
            RequestEntity::Payment => "payment",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Create,
    Update,
    Delete,
    CancelOrder,
    RefundFull,
    RefundPartial,
    PriceAdjustment,
    ReassignStore,
    EnableMethod,
    DisableMethod,
    UpdateCredentials,
    UpdateSettlement,
    UpdateFee,
}

impl RequestAction {
    /// `update` and `delete` operate on an existing record and need a target.
    pub fn requires_target(self) -> bool {
        matches!(self, RequestAction::Update | RequestAction::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestAction::Create => "create",
            RequestAction::Update => "update",
            RequestAction::Delete => "delete",
            RequestAction::CancelOrder => "cancel_order",
            RequestAction::RefundFull => "refund_full",
            RequestAction::RefundPartial => "refund_partial",
            RequestAction::PriceAdjustment => "price_adjustment",
            RequestAction::ReassignStore => "reassign_store",
            RequestAction::EnableMethod => "enable_method",
            RequestAction::DisableMethod => "disable_method",
            RequestAction::UpdateCredentials => "update_credentials",
            RequestAction::UpdateSettlement => "update_settlement",
            RequestAction::UpdateFee => "update_fee",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimelineAction {
    Submit,
    Approve,
    Reject,
    Cancel,
    Update,
}

/// One audit record in a request's append-only timeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub by: Uuid,
    pub action: TimelineAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A single changed field between the original snapshot and the payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct DiffEntry {
    pub field: String,
    #[schema(value_type = Object)]
    pub from: Value,
    #[schema(value_type = Object)]
    pub to: Value,
}

/// A manager's proposed catalog change awaiting (or past) admin review.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub approver_id: Option<Uuid>,
    pub entity: RequestEntity,
    pub action: RequestAction,
    pub target_id: Option<Uuid>,
    #[sqlx(json)]
    #[schema(value_type = Object)]
    pub payload: Payload,
    #[sqlx(json)]
    #[schema(value_type = Object)]
    pub original: Payload,
    #[sqlx(json)]
    pub diff: Vec<DiffEntry>,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub attachments: Vec<String>,
    pub tags: Vec<String>,
    #[sqlx(json)]
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn push_timeline(&mut self, by: Uuid, action: TimelineAction, note: Option<String>) {
        let at = Utc::now();
        self.timeline.push(TimelineEntry { at, by, action, note });
        self.updated_at = at;
    }

    pub fn pending_key(&self) -> PendingKey {
        PendingKey {
            store_id: self.store_id,
            entity: self.entity,
            action: self.action,
            target_id: self.target_id,
        }
    }
}

/// Tuple over which at most one request may be pending at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey {
    pub store_id: Uuid,
    pub entity: RequestEntity,
    pub action: RequestAction,
    pub target_id: Option<Uuid>,
}

/// Body of the generic submit endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewChangeRequest {
    pub entity: RequestEntity,
    pub action: RequestAction,
    pub store_id: Uuid,
    #[serde(default)]
    pub target_id: Option<Uuid>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Payload,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub original: Option<Payload>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `POST /requests/create`.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCreate {
    pub entity: RequestEntity,
    pub store_id: Uuid,
    #[schema(value_type = Object)]
    pub payload: Payload,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `POST /requests/update` and `POST /requests/delete`.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTargeted {
    pub entity: RequestEntity,
    pub store_id: Uuid,
    pub target_id: Uuid,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Payload,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub original: Option<Payload>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SubmitCreate {
    pub fn into_new(self) -> NewChangeRequest {
        NewChangeRequest {
            entity: self.entity,
            action: RequestAction::Create,
            store_id: self.store_id,
            target_id: None,
            payload: self.payload,
            original: None,
            reason: self.reason,
            attachments: self.attachments,
            tags: self.tags,
        }
    }
}

impl SubmitTargeted {
    pub fn into_new(self, action: RequestAction) -> NewChangeRequest {
        NewChangeRequest {
            entity: self.entity,
            action,
            store_id: self.store_id,
            target_id: Some(self.target_id),
            payload: self.payload,
            original: self.original,
            reason: self.reason,
            attachments: self.attachments,
            tags: self.tags,
        }
    }
}

/// Revision of a still-pending request by its submitter. Absent fields are kept.
#[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChangeRequest {
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Payload>,
    #[schema(value_type = Option<Object>)]
    pub original: Option<Payload>,
    pub reason: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub note: Option<String>,
}

impl UpdateChangeRequest {
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
            && self.original.is_none()
            && self.reason.is_none()
            && self.attachments.is_none()
            && self.tags.is_none()
    }
}

/// Optional note attached to approve / reject / cancel.
#[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
pub struct DecisionNote {
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `POST /requests/preview-diff`. With `entity` and `action` set, the
/// payload is normalized exactly as a submission would be before diffing.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct PreviewDiff {
    #[serde(default)]
    pub entity: Option<RequestEntity>,
    #[serde(default)]
    pub action: Option<RequestAction>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub original: Option<Payload>,
    #[schema(value_type = Object)]
    pub payload: Payload,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Listing filter shared by the manager and admin listings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub entity: Option<RequestEntity>,
    pub store_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RequestFilter {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn matches(&self, request: &ChangeRequest) -> bool {
        self.status.map_or(true, |s| s == request.status)
            && self.entity.map_or(true, |e| e == request.entity)
            && self.store_id.map_or(true, |id| id == request.store_id)
            && self.user_id.map_or(true, |id| id == request.user_id)
    }
}
