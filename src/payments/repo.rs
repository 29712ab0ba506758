use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatus {
    Initiated,
    Pending,
    Successful,
    Failed,
}

#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub request_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone: String,
    pub tx_ref: String,
    pub provider_tx_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewPayment {
    pub request_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone: String,
    pub tx_ref: String,
}

const PAYMENT_COLUMNS: &str = "id, request_id, amount, currency, phone, tx_ref, \
                               provider_tx_id, status, created_at, updated_at";

pub async fn insert(db: &PgPool, new: &NewPayment) -> anyhow::Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (request_id, amount, currency, phone, tx_ref)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(new.request_id)
    .bind(new.amount)
    .bind(&new.currency)
    .bind(&new.phone)
    .bind(&new.tx_ref)
    .fetch_one(db)
    .await?;
    Ok(payment)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(payment)
}

pub async fn find_by_tx_ref(db: &PgPool, tx_ref: &str) -> anyhow::Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tx_ref = $1"
    ))
    .bind(tx_ref)
    .fetch_optional(db)
    .await?;
    Ok(payment)
}

/// Status write; the provider id is kept once learned.
pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    status: PaymentStatus,
    provider_tx_id: Option<&str>,
) -> anyhow::Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r#"
        UPDATE payments
        SET status = $2,
            provider_tx_id = COALESCE($3, provider_tx_id),
            updated_at = now()
        WHERE id = $1
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(provider_tx_id)
    .fetch_one(db)
    .await?;
    Ok(payment)
}

pub async fn has_successful_for_request(db: &PgPool, request_id: Uuid) -> anyhow::Result<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM payments WHERE request_id = $1 AND status = 'successful')",
    )
    .bind(request_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}
