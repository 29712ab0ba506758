use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::services::{is_valid_email, AdminUser},
    error::{ApiError, ApiResult},
    mailer,
    state::AppState,
};

use super::dto::{ContactMessageResponse, ContactRequest, Pagination};
use super::repo;

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/admin/contact", get(list_messages))
}

#[instrument(skip(state, payload))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactMessageResponse>)> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    if payload.body.trim().is_empty() {
        return Err(ApiError::BadRequest("Message body is required".into()));
    }

    let message = repo::insert(
        &state.db,
        payload.name.trim(),
        &email,
        payload.subject.as_deref(),
        payload.body.trim(),
    )
    .await?;
    info!(message_id = %message.id, "contact message stored");

    // Forwarded copy is best-effort; the stored row is the source of truth
    let inbox = &state.config.mail.admin_inbox;
    if !inbox.is_empty() {
        let html = mailer::contact_copy_html(
            &message.name,
            &message.email,
            message.subject.as_deref(),
            &message.body,
        );
        if let Err(e) = state.mailer.send(inbox, "New contact message", &html).await {
            warn!(error = %e, message_id = %message.id, "contact copy email failed");
        }
    }

    Ok((StatusCode::CREATED, Json(message.into())))
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<ContactMessageResponse>>> {
    let messages = repo::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(ContactMessageResponse::from)
            .collect(),
    ))
}
