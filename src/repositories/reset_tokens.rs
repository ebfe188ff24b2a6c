use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::models::PasswordResetToken;

const COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at";

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    user_id: &str,
    token_hash: &str,
    expires_at: OffsetDateTime,
    created_at: OffsetDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn find_by_hash(
    executor: impl sqlx::PgExecutor<'_>,
    token_hash: &str,
) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(&format!(
        "SELECT {COLUMNS} FROM password_reset_tokens WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete_expired(pool: &PgPool, now: OffsetDateTime) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
