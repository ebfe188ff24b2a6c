use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use crate::db::models::ExamSubmission;
use crate::db::types::SubmissionStatus;

const COLUMNS: &str = "id, student_id, exam_id, start_time, end_time, score, status";

pub(crate) async fn find_for_student_exam(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    exam_id: &str,
) -> Result<Option<ExamSubmission>, sqlx::Error> {
    sqlx::query_as::<_, ExamSubmission>(&format!(
        "SELECT {COLUMNS} FROM exam_submissions WHERE student_id = $1 AND exam_id = $2"
    ))
    .bind(student_id)
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

/// Inserts the in-progress row unless the pair already has one. Returns
/// whether this call created it.
pub(crate) async fn create_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    exam_id: &str,
    start_time: OffsetDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_submissions (id, student_id, exam_id, start_time, status)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (student_id, exam_id) DO NOTHING",
    )
    .bind(id)
    .bind(student_id)
    .bind(exam_id)
    .bind(start_time)
    .bind(SubmissionStatus::InProgress)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamSubmission>, sqlx::Error> {
    sqlx::query_as::<_, ExamSubmission>(&format!(
        "SELECT {COLUMNS} FROM exam_submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn lock_for_student_exam(
    tx: &mut Transaction<'_, Postgres>,
    student_id: &str,
    exam_id: &str,
) -> Result<Option<ExamSubmission>, sqlx::Error> {
    sqlx::query_as::<_, ExamSubmission>(&format!(
        "SELECT {COLUMNS} FROM exam_submissions
         WHERE student_id = $1 AND exam_id = $2
         FOR UPDATE"
    ))
    .bind(student_id)
    .bind(exam_id)
    .fetch_optional(&mut **tx)
    .await
}

pub(crate) async fn mark_submitted(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    end_time: OffsetDateTime,
    score: f64,
) -> Result<ExamSubmission, sqlx::Error> {
    sqlx::query_as::<_, ExamSubmission>(&format!(
        "UPDATE exam_submissions SET status = $1, end_time = $2, score = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(SubmissionStatus::Submitted)
    .bind(end_time)
    .bind(score)
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct SubmissionWithStudent {
    #[sqlx(flatten)]
    pub(crate) submission: ExamSubmission,
    pub(crate) student_name: String,
}

pub(crate) async fn list_by_exam_with_student(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<SubmissionWithStudent>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionWithStudent>(
        "SELECT s.id, s.student_id, s.exam_id, s.start_time, s.end_time, s.score, s.status,
                u.fullname AS student_name
         FROM exam_submissions s
         JOIN users u ON u.id = s.student_id
         WHERE s.exam_id = $1
         ORDER BY s.end_time NULLS LAST, s.start_time",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, FromRow)]
pub(crate) struct CompletedExam {
    #[sqlx(flatten)]
    pub(crate) submission: ExamSubmission,
    pub(crate) exam_title: String,
    pub(crate) delay_results: bool,
}

pub(crate) async fn list_completed_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<CompletedExam>, sqlx::Error> {
    sqlx::query_as::<_, CompletedExam>(
        "SELECT s.id, s.student_id, s.exam_id, s.start_time, s.end_time, s.score, s.status,
                e.title AS exam_title, e.delay_results
         FROM exam_submissions s
         JOIN exams e ON e.id = s.exam_id
         WHERE s.student_id = $1 AND s.status = $2
         ORDER BY s.end_time DESC",
    )
    .bind(student_id)
    .bind(SubmissionStatus::Submitted)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_students_submitted_for_teacher(
    pool: &PgPool,
    teacher_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(DISTINCT s.student_id)
         FROM exam_submissions s
         JOIN exams e ON e.id = s.exam_id
         WHERE e.teacher_id = $1 AND s.status = $2",
    )
    .bind(teacher_id)
    .bind(SubmissionStatus::Submitted)
    .fetch_one(pool)
    .await
}

/// (student name, exam title, end time) of the latest submissions on the
/// teacher's exams.
pub(crate) async fn recent_for_teacher(
    pool: &PgPool,
    teacher_id: &str,
    limit: i64,
) -> Result<Vec<(String, String, OffsetDateTime)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String, OffsetDateTime)>(
        "SELECT u.fullname, e.title, s.end_time
         FROM exam_submissions s
         JOIN users u ON u.id = s.student_id
         JOIN exams e ON e.id = s.exam_id
         WHERE e.teacher_id = $1 AND s.status = $2 AND s.end_time IS NOT NULL
         ORDER BY s.end_time DESC
         LIMIT $3",
    )
    .bind(teacher_id)
    .bind(SubmissionStatus::Submitted)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_submissions").fetch_one(pool).await
}

pub(crate) async fn average_score(pool: &PgPool) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar("SELECT AVG(score) FROM exam_submissions WHERE score IS NOT NULL")
        .fetch_one(pool)
        .await
}
