use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::UpdateCarRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "car_type", rename_all = "lowercase")]
pub enum CarType {
    Sedan,
    Suv,
    Van,
    Truck,
    Luxury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "car_availability", rename_all = "lowercase")]
pub enum CarAvailability {
    Available,
    Rented,
    Sold,
    Maintenance,
}

#[derive(Debug, Clone, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub price_per_day: i64,
    pub sale_price: Option<i64>,
    pub car_type: CarType,
    pub availability_status: CarAvailability,
    pub specs: serde_json::Value,
    pub event_tags: serde_json::Value,
    pub created_at: OffsetDateTime,
}

pub struct NewCar {
    pub name: String,
    pub model: String,
    pub price_per_day: i64,
    pub sale_price: Option<i64>,
    pub car_type: CarType,
    pub specs: serde_json::Value,
    pub event_tags: serde_json::Value,
}

const CAR_COLUMNS: &str = "id, name, model, price_per_day, sale_price, car_type, \
                           availability_status, specs, event_tags, created_at";

pub(crate) fn specs_or_default(v: &serde_json::Value) -> serde_json::Value {
    if v.is_null() {
        serde_json::json!({})
    } else {
        v.clone()
    }
}

pub(crate) fn tags_or_default(v: &serde_json::Value) -> serde_json::Value {
    if v.is_null() {
        serde_json::json!([])
    } else {
        v.clone()
    }
}

/// Catalog listing. When no availability filter is given, cars parked in
/// maintenance stay out of the result.
pub async fn list(
    db: &PgPool,
    car_type: Option<CarType>,
    availability: Option<CarAvailability>,
    event: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Car>> {
    let rows = sqlx::query_as::<_, Car>(&format!(
        r#"
        SELECT {CAR_COLUMNS}
        FROM cars
        WHERE ($1::car_type IS NULL OR car_type = $1)
          AND (CASE WHEN $2::car_availability IS NULL
                    THEN availability_status != 'maintenance'
                    ELSE availability_status = $2 END)
          AND ($3::TEXT IS NULL OR event_tags::TEXT ILIKE '%' || $3 || '%')
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#
    ))
    .bind(car_type)
    .bind(availability)
    .bind(event)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Car>> {
    let car = sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(car)
}

pub async fn create(db: &PgPool, new: &NewCar) -> anyhow::Result<Car> {
    let car = sqlx::query_as::<_, Car>(&format!(
        r#"
        INSERT INTO cars (name, model, price_per_day, sale_price, car_type, specs, event_tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {CAR_COLUMNS}
        "#
    ))
    .bind(&new.name)
    .bind(&new.model)
    .bind(new.price_per_day)
    .bind(new.sale_price)
    .bind(new.car_type)
    .bind(specs_or_default(&new.specs))
    .bind(tags_or_default(&new.event_tags))
    .fetch_one(db)
    .await?;
    Ok(car)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    up: &UpdateCarRequest,
) -> anyhow::Result<Option<Car>> {
    let car = sqlx::query_as::<_, Car>(&format!(
        r#"
        UPDATE cars SET
            name = COALESCE($2, name),
            model = COALESCE($3, model),
            price_per_day = COALESCE($4, price_per_day),
            sale_price = COALESCE($5, sale_price),
            car_type = COALESCE($6, car_type),
            availability_status = COALESCE($7, availability_status),
            specs = COALESCE($8, specs),
            event_tags = COALESCE($9, event_tags)
        WHERE id = $1
        RETURNING {CAR_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&up.name)
    .bind(&up.model)
    .bind(up.price_per_day)
    .bind(up.sale_price)
    .bind(up.car_type)
    .bind(up.availability_status)
    .bind(up.specs.clone())
    .bind(up.event_tags.clone())
    .fetch_optional(db)
    .await?;
    Ok(car)
}

/// Delete the car row. Image rows go with it via ON DELETE CASCADE.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM cars WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---- availability transitions ----

/// Unconditional availability write inside the status-change transaction.
pub async fn set_availability_tx(
    tx: &mut Transaction<'_, Postgres>,
    car_id: Uuid,
    to: CarAvailability,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE cars SET availability_status = $2 WHERE id = $1")
        .bind(car_id)
        .bind(to)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Guarded edge out of `available`. Returns false when another request won
/// the car first, which callers surface as a conflict.
pub async fn set_availability_guarded_tx(
    tx: &mut Transaction<'_, Postgres>,
    car_id: Uuid,
    to: CarAvailability,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE cars SET availability_status = $2 \
         WHERE id = $1 AND availability_status = 'available'",
    )
    .bind(car_id)
    .bind(to)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Put the car back on the lot unless it has been sold.
pub async fn release_availability_tx(
    tx: &mut Transaction<'_, Postgres>,
    car_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE cars SET availability_status = 'available' \
         WHERE id = $1 AND availability_status != 'sold'",
    )
    .bind(car_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ---- images ----

pub async fn insert_image_tx(
    tx: &mut Transaction<'_, Postgres>,
    image_id: Uuid,
    car_id: Uuid,
    s3_key: &str,
) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO car_images (id, car_id, s3_key) VALUES ($1, $2, $3)")
        .bind(image_id)
        .bind(car_id)
        .bind(s3_key)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn list_image_keys(db: &PgPool, car_id: Uuid) -> anyhow::Result<Vec<(Uuid, String)>> {
    let rows = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT id, s3_key
          FROM car_images
         WHERE car_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(car_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn first_image_key(db: &PgPool, car_id: Uuid) -> anyhow::Result<Option<String>> {
    let row = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT s3_key
          FROM car_images
         WHERE car_id = $1
         ORDER BY created_at ASC
         LIMIT 1
        "#,
    )
    .bind(car_id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(|(key,)| key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_specs_become_empty_object() {
        assert_eq!(
            specs_or_default(&serde_json::Value::Null),
            serde_json::json!({})
        );
        let given = serde_json::json!({"seats": 5});
        assert_eq!(specs_or_default(&given), given);
    }

    #[test]
    fn null_tags_become_empty_array() {
        assert_eq!(
            tags_or_default(&serde_json::Value::Null),
            serde_json::json!([])
        );
        let given = serde_json::json!(["wedding"]);
        assert_eq!(tags_or_default(&given), given);
    }
}
