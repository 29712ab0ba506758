use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub body: String,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    name: &str,
    email: &str,
    subject: Option<&str>,
    body: &str,
) -> anyhow::Result<ContactMessage> {
    let message = sqlx::query_as::<_, ContactMessage>(
        r#"
        INSERT INTO contact_messages (name, email, subject, body)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, subject, body, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(subject)
    .bind(body)
    .fetch_one(db)
    .await?;
    Ok(message)
}

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<ContactMessage>> {
    let rows = sqlx::query_as::<_, ContactMessage>(
        r#"
        SELECT id, name, email, subject, body, created_at
        FROM contact_messages
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
