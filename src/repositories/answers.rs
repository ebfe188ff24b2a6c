use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::models::StudentAnswer;

const COLUMNS: &str = "id, submission_id, question_id, answer_text, updated_at";

/// One row per (submission, question); a later save overwrites the text.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    submission_id: &str,
    question_id: &str,
    answer_text: &str,
    updated_at: OffsetDateTime,
) -> Result<StudentAnswer, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "INSERT INTO student_answers (id, submission_id, question_id, answer_text, updated_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (submission_id, question_id)
         DO UPDATE SET answer_text = EXCLUDED.answer_text, updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(submission_id)
    .bind(question_id)
    .bind(answer_text)
    .bind(updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_submission(
    executor: impl sqlx::PgExecutor<'_>,
    submission_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(&format!(
        "SELECT {COLUMNS} FROM student_answers WHERE submission_id = $1"
    ))
    .bind(submission_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(
        "SELECT a.id, a.submission_id, a.question_id, a.answer_text, a.updated_at
         FROM student_answers a
         JOIN exam_submissions s ON s.id = a.submission_id
         WHERE s.exam_id = $1",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
