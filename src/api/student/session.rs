use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::format_offset;
use crate::repositories;
use crate::schemas::question::StudentQuestion;
use crate::schemas::submission::{
    SaveAnswerRequest, SavedAnswerResponse, SessionResponse, SubmissionResponse,
};
use crate::services::exam_session::{self, StartDecision};
use crate::services::scoring;

const NOT_STARTED: &str = "Exam has not been started";

/// Creates the student's session on first call and hands back the same one
/// afterwards, together with the questions and any saved answers.
pub(super) async fn start_exam(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let exam = super::class_exam(&state, &exam_id, &student).await?;
    let now = state.now();

    let existing =
        repositories::submissions::find_for_student_exam(state.db(), &student.id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?;

    let decision =
        exam_session::start_decision(existing.as_ref().map(|s| s.status), exam.window(), now)?;

    let submission = match (decision, existing) {
        (StartDecision::Resume, Some(submission)) => submission,
        _ => {
            let created = repositories::submissions::create_if_absent(
                state.db(),
                &Uuid::new_v4().to_string(),
                &student.id,
                &exam.id,
                now,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create submission"))?;
            if created {
                metrics::record_exam_started();
                tracing::info!(exam_id = %exam.id, student_id = %student.id, "exam started");
            }

            let submission = repositories::submissions::find_for_student_exam(
                state.db(),
                &student.id,
                &exam.id,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
            .ok_or_else(|| ApiError::Internal("Submission vanished after creation".to_string()))?;
            exam_session::ensure_can_submit(submission.status)?;
            submission
        }
    };

    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let questions =
        exam_session::order_questions(questions, exam.randomize_questions, &mut rand::thread_rng());
    let answers = repositories::answers::list_by_submission(state.db(), &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;

    Ok(Json(SessionResponse {
        submission_id: submission.id,
        exam_id: exam.id,
        exam_title: exam.title,
        status: submission.status,
        start_time: format_offset(submission.start_time),
        duration_minutes: exam.duration_minutes,
        questions: questions.iter().map(StudentQuestion::from_db).collect(),
        answers: answers.into_iter().map(|a| (a.question_id, a.answer_text)).collect(),
    }))
}

pub(super) async fn save_answer(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<Json<SavedAnswerResponse>, ApiError> {
    let exam = super::class_exam(&state, &exam_id, &student).await?;
    let now = state.now();

    let question = repositories::questions::find_by_id(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let submission =
        repositories::submissions::lock_for_student_exam(&mut tx, &student.id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to lock submission"))?
            .ok_or_else(|| ApiError::BadRequest(NOT_STARTED.to_string()))?;

    exam_session::ensure_can_record(submission.status, exam.window(), now)?;
    let answer_text = exam_session::validate_answer(&question, &exam.id, &payload.answer_text)?;

    let answer = repositories::answers::upsert(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        &submission.id,
        &question.id,
        &answer_text,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answer"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;
    metrics::record_answer_saved();

    Ok(Json(SavedAnswerResponse::from_db(answer)))
}

/// Scores and closes the session. Allowed after the window closes so a
/// started attempt can always be handed in; a second submit is rejected.
pub(super) async fn submit_exam(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let exam = super::class_exam(&state, &exam_id, &student).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let submission =
        repositories::submissions::lock_for_student_exam(&mut tx, &student.id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to lock submission"))?
            .ok_or_else(|| ApiError::BadRequest(NOT_STARTED.to_string()))?;

    if let Err(err) = exam_session::ensure_can_submit(submission.status) {
        tracing::warn!(submission_id = %submission.id, "duplicate submit rejected");
        return Err(err.into());
    }

    let questions = repositories::questions::list_by_exam(&mut *tx, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let answers = repositories::answers::list_by_submission(&mut *tx, &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;
    let score = scoring::calculate_score(&questions, &answers);

    let submitted =
        repositories::submissions::mark_submitted(&mut tx, &submission.id, state.now(), score)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to submit exam"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::record_submission(&exam.id, score);
    tracing::info!(
        submission_id = %submitted.id,
        exam_id = %exam.id,
        student_id = %student.id,
        score,
        "exam submitted"
    );

    Ok(Json(SubmissionResponse::from_db(submitted, !exam.delay_results)))
}
