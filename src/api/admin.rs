use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::api::extract::{AppJson, AppPath, AppQuery};
use crate::app_state::AppState;
use crate::db::models::requests::{ChangeRequest, DecisionNote, RequestFilter};
use crate::middleware::auth::Actor;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::AppError;

/// Admin review routes
pub fn admin_request_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/requests", get(list_all))
        .route("/admin/requests/{request_id}", get(get_by_id))
        .route("/admin/requests/{request_id}/approve", post(approve_request))
        .route("/admin/requests/{request_id}/reject", post(reject_request))
}

#[utoipa::path(
    get,
    path = "/admin/requests",
    params(RequestFilter),
    responses(
        (status = 200, description = "Change requests, newest first", body = Vec<ChangeRequest>),
        (status = 403, description = "Admin role required")
    ),
    tag = "Admin Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_all(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppQuery(filter): AppQuery<RequestFilter>,
) -> Result<ApiResponse<Vec<ChangeRequest>>, AppError> {
    let requests = state.requests.list_all(&actor, filter).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change requests", requests))
}

#[utoipa::path(
    get,
    path = "/admin/requests/{request_id}",
    params(("request_id" = Uuid, Path, description = "Change request ID")),
    responses(
        (status = 200, description = "Change request retrieved", body = ChangeRequest),
        (status = 404, description = "Change request not found")
    ),
    tag = "Admin Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(request_id): AppPath<Uuid>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.get_by_id(&actor, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change request retrieved", request))
}

#[utoipa::path(
    post,
    path = "/admin/requests/{request_id}/approve",
    params(("request_id" = Uuid, Path, description = "Change request ID")),
    request_body = DecisionNote,
    responses(
        (status = 200, description = "Change applied and request approved", body = ChangeRequest),
        (status = 400, description = "Request not pending, entity unsupported or payload invalid"),
        (status = 404, description = "Request, store or target not found"),
        (status = 500, description = "Transaction failed; nothing was applied")
    ),
    tag = "Admin Requests",
    security(("bearerAuth" = []))
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(body): AppJson<DecisionNote>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.approve(&actor, request_id, body.note).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change request approved", request))
}

#[utoipa::path(
    post,
    path = "/admin/requests/{request_id}/reject",
    params(("request_id" = Uuid, Path, description = "Change request ID")),
    request_body = DecisionNote,
    responses(
        (status = 200, description = "Request rejected", body = ChangeRequest),
        (status = 400, description = "Request not pending"),
        (status = 404, description = "Change request not found")
    ),
    tag = "Admin Requests",
    security(("bearerAuth" = []))
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(body): AppJson<DecisionNote>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.reject(&actor, request_id, body.note).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change request rejected", request))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_all, get_by_id, approve_request, reject_request),
    tags(
        (name = "Admin Requests", description = "Admin review of store change requests")
    )
)]
pub struct AdminRequestDoc;
