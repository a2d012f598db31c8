use chrono::Utc;
use uuid::Uuid;

use crate::db::models::requests::{
    ChangeRequest, DiffEntry, NewChangeRequest, PendingKey, PreviewDiff, RequestAction,
    RequestFilter, RequestStatus, SubmitCreate, SubmitTargeted, TimelineAction, UpdateChangeRequest,
};
use crate::middleware::auth::Actor;
use crate::services::diff::compute_diff;
use crate::services::policy::ensure_allowed;
use crate::services::validation::{normalize_tags, validate_attachments, validate_payload};
use crate::services::RequestService;
use crate::utils::error::{AppError, AppResult};

impl RequestService {
    /// Record a new pending request. Nothing in the catalog changes.
    pub async fn submit(&self, actor: &Actor, new: NewChangeRequest) -> AppResult<ChangeRequest> {
        ensure_allowed(new.entity, new.action)?;

        let target_id = match new.action {
            RequestAction::Create => None,
            action if action.requires_target() => Some(new.target_id.ok_or_else(|| {
                AppError::validation(format!("targetId is required for {}", action.as_str()))
            })?),
            _ => new.target_id,
        };

        let mut uow = self.repo.begin().await?;

        let store = uow
            .find_store(new.store_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Store {} not found", new.store_id)))?;

        if let Some(target) = target_id.filter(|_| new.action.requires_target()) {
            if !store.is_managed_by(actor.user_id) {
                tracing::warn!(
                    "User {} tried to {} a {} in store {} they do not manage",
                    actor.user_id,
                    new.action.as_str(),
                    new.entity.as_str(),
                    store.id
                );
                return Err(AppError::forbidden("You do not manage this store"));
            }
            if let Some(kind) = new.entity.catalog_kind() {
                if uow.find_membership(store.id, kind, target).await?.is_none() {
                    return Err(AppError::not_found(format!(
                        "{} {} does not belong to store {}",
                        kind.as_str(),
                        target,
                        store.id
                    )));
                }
            }
        }

        let key = PendingKey {
            store_id: store.id,
            entity: new.entity,
            action: new.action,
            target_id,
        };
        if target_id.is_some() && uow.pending_exists(&key).await? {
            return Err(AppError::conflict("A pending request already exists for this target"));
        }

        let payload = validate_payload(new.entity, new.action, &new.payload)?;
        validate_attachments(&new.attachments)?;

        let original = new.original.unwrap_or_default();
        let diff = compute_diff(&original, &payload);
        let now = Utc::now();

        let mut request = ChangeRequest {
            id: Uuid::new_v4(),
            store_id: store.id,
            user_id: actor.user_id,
            approver_id: None,
            entity: new.entity,
            action: new.action,
            target_id,
            payload,
            original,
            diff,
            status: RequestStatus::Pending,
            reason: new.reason,
            attachments: new.attachments,
            tags: normalize_tags(new.tags),
            timeline: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        request.push_timeline(actor.user_id, TimelineAction::Submit, None);

        uow.insert_request(&request).await?;
        uow.commit().await?;

        tracing::info!(
            "Request {} submitted: {} {} in store {} by {}",
            request.id,
            request.action.as_str(),
            request.entity.as_str(),
            request.store_id,
            actor.user_id
        );
        Ok(request)
    }

    pub async fn submit_create(&self, actor: &Actor, body: SubmitCreate) -> AppResult<ChangeRequest> {
        self.submit(actor, body.into_new()).await
    }

    pub async fn submit_update(&self, actor: &Actor, body: SubmitTargeted) -> AppResult<ChangeRequest> {
        self.submit(actor, body.into_new(RequestAction::Update)).await
    }

    pub async fn submit_delete(&self, actor: &Actor, body: SubmitTargeted) -> AppResult<ChangeRequest> {
        self.submit(actor, body.into_new(RequestAction::Delete)).await
    }

    /// What a submission would record as its diff, without storing anything.
    pub fn preview_diff(&self, preview: &PreviewDiff) -> AppResult<Vec<DiffEntry>> {
        let original = preview.original.clone().unwrap_or_default();
        let payload = match (preview.entity, preview.action) {
            (Some(entity), Some(action)) => {
                ensure_allowed(entity, action)?;
                validate_payload(entity, action, &preview.payload)?
            }
            _ => preview.payload.clone(),
        };
        Ok(compute_diff(&original, &payload))
    }

    pub async fn list_mine(&self, actor: &Actor, filter: RequestFilter) -> AppResult<Vec<ChangeRequest>> {
        let filter = RequestFilter {
            user_id: Some(actor.user_id),
            ..filter
        };
        let mut uow = self.repo.begin().await?;
        let requests = uow.list_requests(&filter).await?;
        uow.commit().await?;
        Ok(requests)
    }

    /// Someone else's request reads as not found.
    pub async fn get_mine(&self, actor: &Actor, id: Uuid) -> AppResult<ChangeRequest> {
        let mut uow = self.repo.begin().await?;
        let request = uow
            .find_request(id)
            .await?
            .filter(|r| r.user_id == actor.user_id)
            .ok_or_else(|| AppError::not_found(format!("Request {} not found", id)))?;
        uow.commit().await?;
        Ok(request)
    }

    /// Revise a pending request. The diff is recomputed from the revised pair.
    pub async fn update_mine(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateChangeRequest,
    ) -> AppResult<ChangeRequest> {
        if changes.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }

        let mut uow = self.repo.begin().await?;
        let mut request = uow
            .find_request_for_update(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Request {} not found", id)))?;

        if request.user_id != actor.user_id {
            return Err(AppError::forbidden("Only the submitter can update this request"));
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::state("Only pending requests can be updated"));
        }

        if let Some(payload) = changes.payload {
            request.payload = validate_payload(request.entity, request.action, &payload)?;
        }
        if let Some(original) = changes.original {
            request.original = original;
        }
        if let Some(reason) = changes.reason {
            request.reason = Some(reason);
        }
        if let Some(attachments) = changes.attachments {
            validate_attachments(&attachments)?;
            request.attachments = attachments;
        }
        if let Some(tags) = changes.tags {
            request.tags = normalize_tags(tags);
        }

        request.diff = compute_diff(&request.original, &request.payload);
        request.push_timeline(actor.user_id, TimelineAction::Update, changes.note);

        if !uow.update_pending_request(&request).await? {
            return Err(AppError::state("Only pending requests can be updated"));
        }
        uow.commit().await?;

        tracing::info!("Request {} revised by {}", request.id, actor.user_id);
        Ok(request)
    }
}

