use std::collections::HashMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{auth::services::AdminUser, error::ApiResult, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/stats", get(dashboard_stats))
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub users_total: i64,
    pub cars_by_availability: HashMap<String, i64>,
    pub requests_by_status: HashMap<String, i64>,
    /// Sum of successful payments.
    pub revenue: i64,
}

#[instrument(skip(state))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> ApiResult<Json<DashboardStats>> {
    let (users_total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;

    let cars: Vec<(String, i64)> = sqlx::query_as(
        "SELECT availability_status::TEXT, COUNT(*) FROM cars GROUP BY availability_status",
    )
    .fetch_all(&state.db)
    .await?;

    let requests: Vec<(String, i64)> =
        sqlx::query_as("SELECT status::TEXT, COUNT(*) FROM requests GROUP BY status")
            .fetch_all(&state.db)
            .await?;

    let (revenue,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments WHERE status = 'successful'",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DashboardStats {
        users_total,
        cars_by_availability: cars.into_iter().collect(),
        requests_by_status: requests.into_iter().collect(),
        revenue,
    }))
}
