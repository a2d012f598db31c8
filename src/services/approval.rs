use uuid::Uuid;

use crate::db::models::requests::{
    ChangeRequest, Payload, RequestFilter, RequestStatus, TimelineAction,
};
use crate::db::repository::UnitOfWork;
use crate::middleware::auth::Actor;
use crate::services::effects::handler_for;
use crate::services::policy::ensure_allowed;
use crate::services::RequestService;
use crate::utils::error::{AppError, AppResult};

fn require_admin(actor: &Actor) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!("User {} attempted an admin-only request operation", actor.user_id);
        Err(AppError::forbidden("Admin role required"))
    }
}

async fn load_for_update(uow: &mut dyn UnitOfWork, id: Uuid) -> AppResult<ChangeRequest> {
    uow.find_request_for_update(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Request {} not found", id)))
}

/// Persist a status transition; the stored copy must still be pending.
async fn save_transition(uow: &mut dyn UnitOfWork, request: &ChangeRequest) -> AppResult<()> {
    if uow.update_pending_request(request).await? {
        Ok(())
    } else {
        Err(AppError::state(format!(
            "Request {} is no longer pending",
            request.id
        )))
    }
}

fn merge_payload(base: &mut Payload, patch: Payload) {
    for (key, value) in patch {
        base.insert(key, value);
    }
}

impl RequestService {
    pub async fn list_all(&self, actor: &Actor, filter: RequestFilter) -> AppResult<Vec<ChangeRequest>> {
        require_admin(actor)?;
        let mut uow = self.repo.begin().await?;
        let requests = uow.list_requests(&filter).await?;
        uow.commit().await?;
        Ok(requests)
    }

    pub async fn get_by_id(&self, actor: &Actor, id: Uuid) -> AppResult<ChangeRequest> {
        require_admin(actor)?;
        let mut uow = self.repo.begin().await?;
        let request = uow
            .find_request(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Request {} not found", id)))?;
        uow.commit().await?;
        Ok(request)
    }

    /// Apply the request's effect and mark it approved, all in one unit of work.
    ///
    /// Any failure, including one raised by the effect handler, leaves both
    /// the catalog and the request exactly as they were. The stored diff is
    /// not recomputed.
    pub async fn approve(
        &self,
        actor: &Actor,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<ChangeRequest> {
        require_admin(actor)?;

        let result = self.approve_in_unit(actor, id, note).await;
        match &result {
            Ok(request) => tracing::info!(
                "Request {} approved by {}: {} {} in store {}",
                request.id,
                actor.user_id,
                request.action.as_str(),
                request.entity.as_str(),
                request.store_id
            ),
            Err(err) if err.status_code().is_server_error() => {
                tracing::error!("Approval of request {} failed: {}", id, err)
            }
            Err(err) => tracing::warn!("Approval of request {} rejected: {}", id, err),
        }
        result
    }

    async fn approve_in_unit(
        &self,
        actor: &Actor,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<ChangeRequest> {
        let mut uow = self.repo.begin().await?;
        let mut request = load_for_update(uow.as_mut(), id).await?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::state("Only pending requests can be approved"));
        }
        ensure_allowed(request.entity, request.action)?;

        let store = uow
            .find_store(request.store_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Store {} not found", request.store_id)))?;

        let handler = handler_for(request.entity)?;
        if let Some(patch) = handler.apply(uow.as_mut(), &request, &store).await? {
            merge_payload(&mut request.payload, patch);
        }

        request.status = RequestStatus::Approved;
        request.approver_id = Some(actor.user_id);
        request.push_timeline(actor.user_id, TimelineAction::Approve, note);

        save_transition(uow.as_mut(), &request).await?;
        uow.commit().await?;
        Ok(request)
    }

    /// Close a pending request without touching the catalog.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<ChangeRequest> {
        require_admin(actor)?;

        let mut uow = self.repo.begin().await?;
        let mut request = load_for_update(uow.as_mut(), id).await?;
        if request.status != RequestStatus::Pending {
            return Err(AppError::state("Only pending requests can be rejected"));
        }

        request.status = RequestStatus::Rejected;
        request.approver_id = Some(actor.user_id);
        request.push_timeline(actor.user_id, TimelineAction::Reject, note);

        save_transition(uow.as_mut(), &request).await?;
        uow.commit().await?;

        tracing::info!("Request {} rejected by {}", request.id, actor.user_id);
        Ok(request)
    }

    /// Withdraw a pending request. Only its submitter may do this.
    pub async fn cancel_mine(
        &self,
        actor: &Actor,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<ChangeRequest> {
        let mut uow = self.repo.begin().await?;
        let mut request = load_for_update(uow.as_mut(), id).await?;

        if request.user_id != actor.user_id {
            return Err(AppError::forbidden("Only the submitter can cancel this request"));
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::state("Only pending requests can be cancelled"));
        }

        request.status = RequestStatus::Cancelled;
        request.push_timeline(actor.user_id, TimelineAction::Cancel, note);

        save_transition(uow.as_mut(), &request).await?;
        uow.commit().await?;

        tracing::info!("Request {} cancelled by its submitter", request.id);
        Ok(request)
    }
}
