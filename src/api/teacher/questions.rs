use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::question::{
    QuestionCreate, QuestionImportRequest, QuestionImportResponse, QuestionResponse,
    QuestionUpdate,
};
use crate::services::question_bank::{self, QuestionError};

pub(super) async fn create_question(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    if payload.question_text.trim().is_empty() {
        return Err(QuestionError::BlankText.into());
    }
    let exam = super::owned_exam(&state, &exam_id, &teacher.id).await?;

    let definition = question_bank::define(
        payload.question_type,
        payload.options,
        payload.reference_answer.as_deref(),
    )?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            question_text: payload.question_text.trim(),
            image_ref: payload.image_ref.as_deref(),
            question_type: payload.question_type,
            options: definition.options,
            correct_answer: definition.correct_answer,
            created_at: state.now(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

pub(super) async fn update_question(
    Path(question_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    if payload.question_text.trim().is_empty() {
        return Err(QuestionError::BlankText.into());
    }

    let existing = repositories::questions::find_for_teacher(state.db(), &question_id, &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    let definition = question_bank::define(
        existing.question_type,
        payload.options,
        payload.reference_answer.as_deref(),
    )?;

    let question = repositories::questions::update(
        state.db(),
        &existing.id,
        repositories::questions::UpdateQuestion {
            question_text: payload.question_text.trim(),
            image_ref: payload.image_ref.as_deref(),
            options: definition.options,
            correct_answer: definition.correct_answer,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;

    Ok(Json(QuestionResponse::from_db(question)))
}

pub(super) async fn delete_question(
    Path(question_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let existing = repositories::questions::find_for_teacher(state.db(), &question_id, &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    repositories::questions::delete(state.db(), &existing.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Validates every row before writing any; the whole batch lands in one
/// transaction.
pub(super) async fn import_questions(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionImportRequest>,
) -> Result<(StatusCode, Json<QuestionImportResponse>), ApiError> {
    let exam = super::owned_exam(&state, &exam_id, &teacher.id).await?;
    if payload.rows.is_empty() {
        return Err(ApiError::BadRequest("No rows to import".to_string()));
    }

    let imported = question_bank::convert_rows(&payload.rows)?;
    let now = state.now();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // Rows share one request instant; a microsecond step keeps them in file order.
    for (position, question) in (0_i64..).zip(&imported) {
        repositories::questions::create(
            &mut *tx,
            repositories::questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                exam_id: &exam.id,
                question_text: &question.question_text,
                image_ref: None,
                question_type: question.question_type,
                options: question.definition.options.clone(),
                correct_answer: question.definition.correct_answer.clone(),
                created_at: now + Duration::microseconds(position),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to import question"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(exam_id = %exam.id, count = imported.len(), "questions imported");
    Ok((StatusCode::CREATED, Json(QuestionImportResponse { imported: imported.len() })))
}
