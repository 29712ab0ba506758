use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cars::repo::{Car, CarAvailability, CarType};

#[derive(Debug, Deserialize)]
pub struct ListCarsQuery {
    pub car_type: Option<CarType>,
    pub availability: Option<CarAvailability>,
    /// Substring match against the event suitability tags.
    pub event: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCarRequest {
    pub name: String,
    pub model: String,
    pub price_per_day: i64,
    pub sale_price: Option<i64>,
    pub car_type: CarType,
    #[serde(default)]
    pub specs: serde_json::Value,
    #[serde(default)]
    pub event_tags: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCarRequest {
    pub name: Option<String>,
    pub model: Option<String>,
    pub price_per_day: Option<i64>,
    pub sale_price: Option<i64>,
    pub car_type: Option<CarType>,
    pub availability_status: Option<CarAvailability>,
    pub specs: Option<serde_json::Value>,
    pub event_tags: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CarSummary {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub price_per_day: i64,
    pub sale_price: Option<i64>,
    pub car_type: CarType,
    pub availability_status: CarAvailability,
    pub event_tags: serde_json::Value,
}

impl From<Car> for CarSummary {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            name: car.name,
            model: car.model,
            price_per_day: car.price_per_day,
            sale_price: car.sale_price,
            car_type: car.car_type,
            availability_status: car.availability_status,
            event_tags: car.event_tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarDetails {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub price_per_day: i64,
    pub sale_price: Option<i64>,
    pub car_type: CarType,
    pub availability_status: CarAvailability,
    pub specs: serde_json::Value,
    pub event_tags: serde_json::Value,
    /// Presigned GET URLs, first image first.
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct UploadedImagesResponse {
    pub car_id: Uuid,
    pub image_ids: Vec<Uuid>,
}

fn default_limit() -> i64 {
    20
}
