use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::db::models::User;
use crate::db::types::{AccountStatus, UserRole};

const COLUMNS: &str = "\
    id, fullname, email, hashed_password, role, status, \
    class_name, gender, profile_image, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Whether the email is taken by anyone other than `except_id`.
pub(crate) async fn email_taken(
    pool: &PgPool,
    email: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::text IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) fullname: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) status: AccountStatus,
    pub(crate) class_name: Option<&'a str>,
    pub(crate) gender: Option<&'a str>,
    pub(crate) created_at: OffsetDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, fullname, email, hashed_password, role, status, class_name, gender, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.fullname)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.status)
    .bind(params.class_name)
    .bind(params.gender)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn promote_to_admin(
    pool: &PgPool,
    id: &str,
    hashed_password: Option<String>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            role = $1,
            status = $2,
            hashed_password = COALESCE($3, hashed_password)
         WHERE id = $4",
    )
    .bind(UserRole::Admin)
    .bind(AccountStatus::Approved)
    .bind(hashed_password)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) struct UpdateUser {
    pub(crate) fullname: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) role: Option<UserRole>,
    pub(crate) class_name: Option<String>,
    pub(crate) profile_image: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateUser,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            fullname = COALESCE($1, fullname),
            email = COALESCE($2, email),
            role = COALESCE($3, role),
            class_name = COALESCE($4, class_name),
            profile_image = COALESCE($5, profile_image)
         WHERE id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(params.fullname)
    .bind(params.email)
    .bind(params.role)
    .bind(params.class_name)
    .bind(params.profile_image)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_password(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    hashed_password: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = $1 WHERE id = $2")
        .bind(hashed_password)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Approves a pending teacher; returns `None` when no such teacher exists.
pub(crate) async fn approve_teacher(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET status = $1
         WHERE id = $2 AND role = $3 AND status = $4
         RETURNING {COLUMNS}"
    ))
    .bind(AccountStatus::Approved)
    .bind(id)
    .bind(UserRole::Teacher)
    .bind(AccountStatus::Pending)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_pending_teacher(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = $2 AND status = $3")
        .bind(id)
        .bind(UserRole::Teacher)
        .bind(AccountStatus::Pending)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list(
    pool: &PgPool,
    role: Option<UserRole>,
    status: Option<AccountStatus>,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users WHERE 1=1"));
    if let Some(role) = role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(status) = status {
        builder.push(" AND status = ").push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id");

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count_students_in_class(
    executor: impl sqlx::PgExecutor<'_>,
    class_name: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1 AND class_name = $2")
        .bind(UserRole::Student)
        .bind(class_name)
        .fetch_one(executor)
        .await
}

/// Students in any class the teacher has set an exam for.
pub(crate) async fn count_students_in_teacher_classes(
    pool: &PgPool,
    teacher_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM users
         WHERE role = $1
           AND class_name IN (SELECT DISTINCT class_name FROM exams WHERE teacher_id = $2)",
    )
    .bind(UserRole::Student)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn recent_students_in_teacher_classes(
    pool: &PgPool,
    teacher_id: &str,
    limit: i64,
) -> Result<Vec<(String, OffsetDateTime)>, sqlx::Error> {
    sqlx::query_as::<_, (String, OffsetDateTime)>(
        "SELECT fullname, created_at FROM users
         WHERE role = $1
           AND class_name IN (SELECT DISTINCT class_name FROM exams WHERE teacher_id = $2)
         ORDER BY created_at DESC
         LIMIT $3",
    )
    .bind(UserRole::Student)
    .bind(teacher_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_role(pool: &PgPool) -> Result<Vec<(UserRole, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (UserRole, i64)>("SELECT role, COUNT(*) FROM users GROUP BY role")
        .fetch_all(pool)
        .await
}
