use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::services::AdminUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::{
    CarDetails, CarSummary, CreateCarRequest, ListCarsQuery, UpdateCarRequest,
    UploadedImagesResponse,
};
use super::repo::{self, NewCar};
use super::services::{self, UploadItem};

const IMAGE_URL_TTL_SECS: u64 = 30 * 60;
const REDIRECT_URL_TTL_SECS: u64 = 600;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars))
        .route("/cars/:id", get(get_car))
        .route("/cars/:id/image", get(get_car_image))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/cars", post(create_car))
        .route("/cars/:id", put(update_car).delete(delete_car))
        .route("/cars/:id/images", post(upload_car_images)) // multipart files[]
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
pub async fn list_cars(
    State(state): State<AppState>,
    Query(q): Query<ListCarsQuery>,
) -> ApiResult<Json<Vec<CarSummary>>> {
    let cars = repo::list(
        &state.db,
        q.car_type,
        q.availability,
        q.event.as_deref(),
        q.limit,
        q.offset,
    )
    .await?;
    Ok(Json(cars.into_iter().map(CarSummary::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CarDetails>> {
    let car = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".into()))?;

    let keys = repo::list_image_keys(&state.db, id)
        .await?
        .into_iter()
        .map(|(_, key)| key)
        .collect();
    let images = services::presign_many(&state, keys, IMAGE_URL_TTL_SECS).await?;

    Ok(Json(CarDetails {
        id: car.id,
        name: car.name,
        model: car.model,
        price_per_day: car.price_per_day,
        sale_price: car.sale_price,
        car_type: car.car_type,
        availability_status: car.availability_status,
        specs: car.specs,
        event_tags: car.event_tags,
        images,
        created_at: car.created_at,
    }))
}

/// 302 to a presigned URL of the first gallery image.
#[instrument(skip(state))]
pub async fn get_car_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    let key = repo::first_image_key(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Image not found".into()))?;
    let url = state.storage.presign_get(&key, REDIRECT_URL_TTL_SECS).await?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, payload))]
pub async fn create_car(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateCarRequest>,
) -> ApiResult<(StatusCode, Json<CarSummary>)> {
    if payload.name.trim().is_empty() || payload.model.trim().is_empty() {
        return Err(ApiError::BadRequest("Name and model are required".into()));
    }
    if payload.price_per_day < 0 || payload.sale_price.is_some_and(|p| p < 0) {
        return Err(ApiError::BadRequest("Prices must not be negative".into()));
    }

    let car = repo::create(
        &state.db,
        &NewCar {
            name: payload.name.trim().to_string(),
            model: payload.model.trim().to_string(),
            price_per_day: payload.price_per_day,
            sale_price: payload.sale_price,
            car_type: payload.car_type,
            specs: payload.specs,
            event_tags: payload.event_tags,
        },
    )
    .await?;

    info!(car_id = %car.id, %admin_id, "car created");
    Ok((StatusCode::CREATED, Json(car.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_car(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCarRequest>,
) -> ApiResult<Json<CarSummary>> {
    let car = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".into()))?;
    info!(car_id = %car.id, %admin_id, "car updated");
    Ok(Json(car.into()))
}

#[instrument(skip(state))]
pub async fn delete_car(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !services::delete_car_with_images(&state, id).await? {
        return Err(ApiError::NotFound("Car not found".into()));
    }
    info!(car_id = %id, %admin_id, "car deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cars/:id/images (multipart). Field: files[] with one or more images.
#[instrument(skip(state, mp))]
pub async fn upload_car_images(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> ApiResult<(StatusCode, HeaderMap, Json<UploadedImagesResponse>)> {
    repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".into()))?;

    let mut files: Vec<UploadItem> = Vec::new();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() == Some("files") || name.as_deref() == Some("files[]") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            files.push(UploadItem {
                body: data,
                content_type,
            });
        }
    }
    if files.is_empty() {
        return Err(ApiError::BadRequest("files[] is required".into()));
    }

    let image_ids = services::upload_and_link_images(&state, id, files).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::LOCATION,
        format!("/api/cars/{}", id)
            .parse()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("bad location header")))?,
    );

    Ok((
        StatusCode::CREATED,
        headers,
        Json(UploadedImagesResponse {
            car_id: id,
            image_ids,
        }),
    ))
}
