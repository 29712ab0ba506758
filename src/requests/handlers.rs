use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::repo::Role,
    auth::services::{AdminUser, AuthUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::{
    AdminListQuery, CreateRequestBody, Pagination, RequestResponse, StatusUpdateBody,
};
use super::repo;
use super::services;

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request).get(list_my_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/status", patch(update_status))
        .route("/admin/requests", get(admin_list_requests))
}

#[instrument(skip(state, user, body))]
pub async fn create_request(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateRequestBody>,
) -> ApiResult<(StatusCode, Json<RequestResponse>)> {
    let request = services::create_request(&state, &user, body).await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

#[instrument(skip(state, user))]
pub async fn list_my_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<RequestResponse>>> {
    let requests = repo::list_by_user(&state.db, user.id, p.limit, p.offset).await?;
    Ok(Json(requests.into_iter().map(RequestResponse::from).collect()))
}

#[instrument(skip(state, user))]
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RequestResponse>> {
    let request = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;
    if request.user_id != user.id && user.role != Role::Admin {
        return Err(ApiError::Forbidden("Not your request".into()));
    }
    Ok(Json(request.into()))
}

#[instrument(skip(state, user))]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdateBody>,
) -> ApiResult<Json<RequestResponse>> {
    if body.status == repo::RequestStatus::Pending {
        return Err(ApiError::BadRequest("Cannot move a request back to pending".into()));
    }
    let request = services::change_status(&state, &user, id, body.status).await?;
    Ok(Json(request.into()))
}

#[instrument(skip(state))]
pub async fn admin_list_requests(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(q): Query<AdminListQuery>,
) -> ApiResult<Json<Vec<RequestResponse>>> {
    let requests = repo::list_all(&state.db, q.status, q.limit, q.offset).await?;
    Ok(Json(requests.into_iter().map(RequestResponse::from).collect()))
}
