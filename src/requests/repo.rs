use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::SellVehicle;
use crate::cars::repo::specs_or_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_kind", rename_all = "lowercase")]
pub enum RequestKind {
    Rent,
    Buy,
    Sell,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Rent => "rent",
            RequestKind::Buy => "buy",
            RequestKind::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Request {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub with_driver: bool,
    pub event_note: Option<String>,
    pub amount: i64,
    pub deposit: i64,
    pub driver_fee: i64,
    pub total_amount: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewRequest {
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub kind: RequestKind,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub with_driver: bool,
    pub event_note: Option<String>,
    pub amount: i64,
    pub deposit: i64,
    pub driver_fee: i64,
    pub total_amount: i64,
}

const REQUEST_COLUMNS: &str = "id, user_id, car_id, kind, status, start_date, end_date, \
                               with_driver, event_note, amount, deposit, driver_fee, \
                               total_amount, created_at, updated_at";

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewRequest,
) -> anyhow::Result<Request> {
    let request = sqlx::query_as::<_, Request>(&format!(
        r#"
        INSERT INTO requests
            (user_id, car_id, kind, start_date, end_date, with_driver,
             event_note, amount, deposit, driver_fee, total_amount)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(new.user_id)
    .bind(new.car_id)
    .bind(new.kind)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.with_driver)
    .bind(&new.event_note)
    .bind(new.amount)
    .bind(new.deposit)
    .bind(new.driver_fee)
    .bind(new.total_amount)
    .fetch_one(&mut **tx)
    .await?;
    Ok(request)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Request>> {
    let request = sqlx::query_as::<_, Request>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(request)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Request>> {
    let rows = sqlx::query_as::<_, Request>(&format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM requests
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_all(
    db: &PgPool,
    status: Option<RequestStatus>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Request>> {
    let rows = sqlx::query_as::<_, Request>(&format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM requests
        WHERE ($1::request_status IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Status write guarded on the previous value. `None` means another call
/// moved the request first.
pub async fn update_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    from: RequestStatus,
    to: RequestStatus,
) -> anyhow::Result<Option<Request>> {
    let request = sqlx::query_as::<_, Request>(&format!(
        r#"
        UPDATE requests
        SET status = $3, updated_at = now()
        WHERE id = $1 AND status = $2
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(request)
}

/// A sell submission enters the catalog parked in maintenance. Approving the
/// request is what puts it on the lot.
pub async fn insert_offered_car_tx(
    tx: &mut Transaction<'_, Postgres>,
    vehicle: &SellVehicle,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO cars (name, model, price_per_day, car_type, availability_status, specs)
        VALUES ($1, $2, 0, $3, 'maintenance', $4)
        RETURNING id
        "#,
    )
    .bind(&vehicle.name)
    .bind(&vehicle.model)
    .bind(vehicle.car_type)
    .bind(specs_or_default(&vehicle.specs))
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}
