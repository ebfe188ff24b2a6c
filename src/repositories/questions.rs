use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::models::Question;
use crate::db::types::{CorrectAnswer, QuestionOption, QuestionType};

const COLUMNS: &str = "\
    id, exam_id, question_text, image_ref, question_type, options, correct_answer, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) image_ref: Option<&'a str>,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) correct_answer: CorrectAnswer,
    pub(crate) created_at: OffsetDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, question_text, image_ref, question_type, options, correct_answer, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.question_text)
    .bind(params.image_ref)
    .bind(params.question_type)
    .bind(Json(params.options))
    .bind(Json(params.correct_answer))
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Natural order: creation time, then id.
pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY created_at, id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_by_exam(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Looks a question up only if it belongs to an exam owned by `teacher_id`.
pub(crate) async fn find_for_teacher(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT q.id, q.exam_id, q.question_text, q.image_ref, q.question_type,
                q.options, q.correct_answer, q.created_at
         FROM questions q
         JOIN exams e ON e.id = q.exam_id
         WHERE q.id = $1 AND e.teacher_id = $2",
    )
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct UpdateQuestion<'a> {
    pub(crate) question_text: &'a str,
    pub(crate) image_ref: Option<&'a str>,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) correct_answer: CorrectAnswer,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_text = $1,
            image_ref = $2,
            options = $3,
            correct_answer = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.question_text)
    .bind(params.image_ref)
    .bind(Json(params.options))
    .bind(Json(params.correct_answer))
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
