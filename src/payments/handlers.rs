use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::repo::{Role, User},
    auth::services::{is_valid_phone, AuthUser},
    error::{ApiError, ApiResult},
    requests::repo::{self as requests_repo, RequestStatus},
    state::AppState,
};

use super::dto::{webhook_status, InitiatePaymentRequest, PaymentResponse, WebhookPayload};
use super::gateway::{new_tx_ref, ChargeRequest};
use super::repo::{self, NewPayment, PaymentStatus};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/initiate", post(initiate_payment))
        .route("/payments/:id", get(get_payment))
        .route("/payments/webhook", post(payment_webhook))
}

#[instrument(skip(state, user, body))]
pub async fn initiate_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<InitiatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    if !is_valid_phone(&body.phone) {
        return Err(ApiError::BadRequest("Invalid phone number".into()));
    }

    let request = requests_repo::get(&state.db, body.request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;
    if request.user_id != user.id {
        return Err(ApiError::Forbidden("Not your request".into()));
    }
    if request.status != RequestStatus::Approved {
        return Err(ApiError::BadRequest(
            "Request must be approved before payment".into(),
        ));
    }
    if repo::has_successful_for_request(&state.db, request.id).await? {
        return Err(ApiError::Conflict("Request is already paid".into()));
    }

    let payment = repo::insert(
        &state.db,
        &NewPayment {
            request_id: request.id,
            amount: request.total_amount,
            currency: state.config.gateway.currency.clone(),
            phone: body.phone.clone(),
            tx_ref: new_tx_ref(),
        },
    )
    .await?;

    let email = User::find_by_id(&state.db, user.id)
        .await?
        .map(|u| u.email)
        .unwrap_or_default();
    let charge = ChargeRequest {
        tx_ref: payment.tx_ref.clone(),
        amount: payment.amount,
        currency: payment.currency.clone(),
        phone_number: payment.phone.clone(),
        email,
    };

    let payment = match state.gateway.initiate_charge(&charge).await {
        Ok(outcome) if outcome.accepted => {
            info!(payment_id = %payment.id, tx_ref = %payment.tx_ref, "charge initiated");
            repo::update_status(
                &state.db,
                payment.id,
                PaymentStatus::Pending,
                outcome.provider_tx_id.as_deref(),
            )
            .await?
        }
        Ok(outcome) => {
            warn!(payment_id = %payment.id, message = %outcome.message, "gateway declined charge");
            repo::update_status(
                &state.db,
                payment.id,
                PaymentStatus::Failed,
                outcome.provider_tx_id.as_deref(),
            )
            .await?
        }
        Err(e) => {
            // Gateway unreachable after retries; keep the failure on record
            let _ = repo::update_status(&state.db, payment.id, PaymentStatus::Failed, None).await;
            return Err(ApiError::Internal(e));
        }
    };

    Ok((StatusCode::CREATED, Json(payment.into())))
}

#[instrument(skip(state, user))]
pub async fn get_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let payment = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    let request = requests_repo::get(&state.db, payment.request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;
    if request.user_id != user.id && user.role != Role::Admin {
        return Err(ApiError::Forbidden("Not your payment".into()));
    }

    Ok(Json(payment.into()))
}

/// Gateway callback. Unknown references are acked with 200 so the provider
/// stops retrying; a bad signature is the only rejection.
#[instrument(skip(state, headers, payload))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<StatusCode> {
    let hash = headers
        .get("verif-hash")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if hash != state.config.gateway.webhook_hash {
        return Err(ApiError::Unauthorized("Invalid webhook signature".into()));
    }

    if payload.event != "charge.completed" {
        debug!(event = %payload.event, "ignoring webhook event");
        return Ok(StatusCode::OK);
    }
    let Some(data) = payload.data else {
        debug!("charge.completed without data payload");
        return Ok(StatusCode::OK);
    };

    match repo::find_by_tx_ref(&state.db, &data.tx_ref).await? {
        Some(payment) => {
            let status = webhook_status(data.status.as_deref().unwrap_or(""));
            let provider = data.id.map(|id| id.to_string());
            repo::update_status(&state.db, payment.id, status, provider.as_deref()).await?;
            info!(payment_id = %payment.id, status = ?status, "payment updated from webhook");
        }
        None => {
            warn!(tx_ref = %data.tx_ref, "webhook for unknown tx_ref");
        }
    }

    Ok(StatusCode::OK)
}
