use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cars::repo::CarType;
use crate::requests::repo::{Request, RequestKind, RequestStatus};

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub kind: RequestKind,
    /// Required for rent and buy.
    pub car_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub with_driver: bool,
    pub event_note: Option<String>,
    /// Required for sell.
    pub offered_amount: Option<i64>,
    pub vehicle: Option<SellVehicle>,
}

/// The vehicle a seller is offering to the catalog.
#[derive(Debug, Deserialize)]
pub struct SellVehicle {
    pub name: String,
    pub model: String,
    pub car_type: CarType,
    #[serde(default)]
    pub specs: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateBody {
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<RequestStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub kind: RequestKind,
    pub status: RequestStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub with_driver: bool,
    pub event_note: Option<String>,
    pub amount: i64,
    pub deposit: i64,
    pub driver_fee: i64,
    pub total_amount: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Request> for RequestResponse {
    fn from(r: Request) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            car_id: r.car_id,
            kind: r.kind,
            status: r.status,
            start_date: r.start_date,
            end_date: r.end_date,
            with_driver: r.with_driver,
            event_note: r.event_note,
            amount: r.amount,
            deposit: r.deposit,
            driver_fee: r.driver_fee,
            total_amount: r.total_amount,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn default_limit() -> i64 {
    20
}
