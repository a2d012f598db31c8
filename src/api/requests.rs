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
use crate::db::models::requests::{
    ChangeRequest, DecisionNote, DiffEntry, NewChangeRequest, PreviewDiff, RequestAction,
    RequestEntity, RequestFilter, RequestStatus, SubmitCreate, SubmitTargeted, TimelineAction,
    TimelineEntry, UpdateChangeRequest,
};
use crate::middleware::auth::Actor;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::AppError;

/// Manager-facing change request routes
pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(submit_request))
        .route("/requests/create", post(submit_create))
        .route("/requests/update", post(submit_update))
        .route("/requests/delete", post(submit_delete))
        .route("/requests/preview-diff", post(preview_diff))
        .route("/requests/mine", get(list_mine))
        .route("/requests/mine/{request_id}", get(get_mine).patch(update_mine))
        .route("/requests/mine/{request_id}/cancel", post(cancel_mine))
}

#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewChangeRequest,
    responses(
        (status = 201, description = "Change request submitted", body = ChangeRequest),
        (status = 400, description = "Action not supported for entity or invalid payload"),
        (status = 403, description = "Caller does not manage the store"),
        (status = 404, description = "Store or target not found"),
        (status = 409, description = "Duplicate request already pending")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppJson(body): AppJson<NewChangeRequest>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.submit(&actor, body).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Change request submitted", request))
}

#[utoipa::path(
    post,
    path = "/requests/create",
    request_body = SubmitCreate,
    responses(
        (status = 201, description = "Create request submitted", body = ChangeRequest),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Store not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppJson(body): AppJson<SubmitCreate>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.submit_create(&actor, body).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Create request submitted", request))
}

#[utoipa::path(
    post,
    path = "/requests/update",
    request_body = SubmitTargeted,
    responses(
        (status = 201, description = "Update request submitted", body = ChangeRequest),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller does not manage the store"),
        (status = 404, description = "Target does not belong to store"),
        (status = 409, description = "Duplicate request already pending")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppJson(body): AppJson<SubmitTargeted>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.submit_update(&actor, body).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Update request submitted", request))
}

#[utoipa::path(
    post,
    path = "/requests/delete",
    request_body = SubmitTargeted,
    responses(
        (status = 201, description = "Delete request submitted", body = ChangeRequest),
        (status = 403, description = "Caller does not manage the store"),
        (status = 404, description = "Target does not belong to store"),
        (status = 409, description = "Duplicate request already pending")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppJson(body): AppJson<SubmitTargeted>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.submit_delete(&actor, body).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Delete request submitted", request))
}

#[utoipa::path(
    post,
    path = "/requests/preview-diff",
    request_body = PreviewDiff,
    responses(
        (status = 200, description = "Diff between original and payload", body = Vec<DiffEntry>),
        (status = 400, description = "Payload invalid for the given entity and action")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn preview_diff(
    State(state): State<AppState>,
    AppJson(body): AppJson<PreviewDiff>,
) -> Result<ApiResponse<Vec<DiffEntry>>, AppError> {
    let diff = state.requests.preview_diff(&body)?;
    Ok(ApiResponse::success(StatusCode::OK, "Diff preview", diff))
}

#[utoipa::path(
    get,
    path = "/requests/mine",
    params(RequestFilter),
    responses(
        (status = 200, description = "Caller's change requests, newest first", body = Vec<ChangeRequest>)
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppQuery(filter): AppQuery<RequestFilter>,
) -> Result<ApiResponse<Vec<ChangeRequest>>, AppError> {
    let requests = state.requests.list_mine(&actor, filter).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Your change requests", requests))
}

#[utoipa::path(
    get,
    path = "/requests/mine/{request_id}",
    params(("request_id" = Uuid, Path, description = "Change request ID")),
    responses(
        (status = 200, description = "Change request retrieved", body = ChangeRequest),
        (status = 404, description = "Change request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(request_id): AppPath<Uuid>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.get_mine(&actor, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change request retrieved", request))
}

#[utoipa::path(
    patch,
    path = "/requests/mine/{request_id}",
    params(("request_id" = Uuid, Path, description = "Change request ID")),
    request_body = UpdateChangeRequest,
    responses(
        (status = 200, description = "Change request updated", body = ChangeRequest),
        (status = 400, description = "Request is no longer pending or payload invalid"),
        (status = 403, description = "Caller is not the submitter"),
        (status = 404, description = "Change request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn update_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateChangeRequest>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.update_mine(&actor, request_id, body).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change request updated", request))
}

#[utoipa::path(
    post,
    path = "/requests/mine/{request_id}/cancel",
    params(("request_id" = Uuid, Path, description = "Change request ID")),
    request_body = DecisionNote,
    responses(
        (status = 200, description = "Change request cancelled", body = ChangeRequest),
        (status = 400, description = "Request is no longer pending"),
        (status = 403, description = "Caller is not the submitter"),
        (status = 404, description = "Change request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn cancel_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(body): AppJson<DecisionNote>,
) -> Result<ApiResponse<ChangeRequest>, AppError> {
    let request = state.requests.cancel_mine(&actor, request_id, body.note).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Change request cancelled", request))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_request,
        submit_create,
        submit_update,
        submit_delete,
        preview_diff,
        list_mine,
        get_mine,
        update_mine,
        cancel_mine
    ),
    components(schemas(
        ChangeRequest,
        NewChangeRequest,
        SubmitCreate,
        SubmitTargeted,
        UpdateChangeRequest,
        PreviewDiff,
        DecisionNote,
        DiffEntry,
        TimelineEntry,
        TimelineAction,
        RequestEntity,
        RequestAction,
        RequestStatus
    )),
    tags(
        (name = "Requests", description = "Store managers proposing catalog changes")
    )
)]
pub struct RequestDoc;
