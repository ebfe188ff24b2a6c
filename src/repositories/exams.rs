use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::db::models::Exam;
use crate::db::types::{SubmissionStatus, UserRole};

pub(crate) const COLUMNS: &str = "\
    id, title, description, class_name, duration_minutes, start_time, end_time, \
    teacher_id, randomize_questions, delay_results, created_at";

pub(crate) struct ExamFields<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) class_name: &'a str,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: Option<OffsetDateTime>,
    pub(crate) end_time: Option<OffsetDateTime>,
    pub(crate) randomize_questions: bool,
    pub(crate) delay_results: bool,
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
    fields: ExamFields<'_>,
    created_at: OffsetDateTime,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, class_name, duration_minutes, start_time, end_time,
            teacher_id, randomize_questions, delay_results, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.class_name)
    .bind(fields.duration_minutes)
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(teacher_id)
    .bind(fields.randomize_questions)
    .bind(fields.delay_results)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_for_teacher(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE id = $1 AND teacher_id = $2"
    ))
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn update_for_teacher(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
    fields: ExamFields<'_>,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = $1,
            description = $2,
            class_name = $3,
            duration_minutes = $4,
            start_time = $5,
            end_time = $6,
            randomize_questions = $7,
            delay_results = $8
         WHERE id = $9 AND teacher_id = $10
         RETURNING {COLUMNS}"
    ))
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.class_name)
    .bind(fields.duration_minutes)
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(fields.randomize_questions)
    .bind(fields.delay_results)
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn release_results(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET delay_results = FALSE
         WHERE id = $1 AND teacher_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_for_teacher(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1 AND teacher_id = $2")
        .bind(id)
        .bind(teacher_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_by_class(
    pool: &PgPool,
    class_name: &str,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE class_name = $1 ORDER BY start_time NULLS FIRST, created_at"
    ))
    .bind(class_name)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct ExamWithCounts {
    #[sqlx(flatten)]
    pub(crate) exam: Exam,
    pub(crate) submission_count: i64,
    pub(crate) submitted_students: i64,
    pub(crate) class_size: i64,
}

pub(crate) async fn list_for_teacher_with_counts(
    pool: &PgPool,
    teacher_id: &str,
) -> Result<Vec<ExamWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, ExamWithCounts>(
        "SELECT e.id, e.title, e.description, e.class_name, e.duration_minutes,
                e.start_time, e.end_time, e.teacher_id, e.randomize_questions,
                e.delay_results, e.created_at,
                (SELECT COUNT(*) FROM exam_submissions s
                  WHERE s.exam_id = e.id) AS submission_count,
                (SELECT COUNT(DISTINCT s.student_id) FROM exam_submissions s
                  WHERE s.exam_id = e.id AND s.status = $2) AS submitted_students,
                (SELECT COUNT(*) FROM users u
                  WHERE u.role = $3 AND u.class_name = e.class_name) AS class_size
         FROM exams e
         WHERE e.teacher_id = $1
         ORDER BY e.created_at DESC, e.id DESC",
    )
    .bind(teacher_id)
    .bind(SubmissionStatus::Submitted)
    .bind(UserRole::Student)
    .fetch_all(pool)
    .await
}

pub(crate) async fn recent_for_teacher(
    pool: &PgPool,
    teacher_id: &str,
    limit: i64,
) -> Result<Vec<(String, OffsetDateTime)>, sqlx::Error> {
    sqlx::query_as::<_, (String, OffsetDateTime)>(
        "SELECT title, created_at FROM exams
         WHERE teacher_id = $1
         ORDER BY created_at DESC
         LIMIT $2",
    )
    .bind(teacher_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exams").fetch_one(pool).await
}

pub(crate) async fn owns_any(pool: &PgPool, teacher_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exams WHERE teacher_id = $1)")
        .bind(teacher_id)
        .fetch_one(pool)
        .await
}
