use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation::validate_exam_window;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::{ExamDetailResponse, ExamPayload, ExamResponse};
use crate::schemas::question::QuestionResponse;
use crate::schemas::MessageResponse;

pub(super) fn fields(
    payload: &ExamPayload,
) -> Result<repositories::exams::ExamFields<'_>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be blank".to_string()));
    }
    if payload.class_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Class must not be blank".to_string()));
    }
    validate_exam_window(payload.window())?;

    Ok(repositories::exams::ExamFields {
        title: payload.title.trim(),
        description: payload.description.as_deref().map(str::trim).filter(|d| !d.is_empty()),
        class_name: payload.class_name.trim(),
        duration_minutes: payload.duration_minutes,
        start_time: payload.start_time,
        end_time: payload.end_time,
        randomize_questions: payload.randomize_questions,
        delay_results: payload.delay_results,
    })
}

pub(super) async fn create_exam(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ExamPayload>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    let fields = fields(&payload)?;

    let exam = repositories::exams::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &teacher.id,
        fields,
        state.now(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(exam_id = %exam.id, teacher_id = %teacher.id, "exam created");
    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

pub(super) async fn list_exams(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let rows = repositories::exams::list_for_teacher_with_counts(state.db(), &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(rows.into_iter().map(|row| ExamResponse::from_db(row.exam)).collect()))
}

pub(super) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<ExamDetailResponse>, ApiError> {
    let exam = super::owned_exam(&state, &exam_id, &teacher.id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(ExamDetailResponse {
        exam: ExamResponse::from_db(exam),
        questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
    }))
}

pub(super) async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ExamPayload>,
) -> Result<Json<ExamResponse>, ApiError> {
    let fields = fields(&payload)?;

    let exam = repositories::exams::update_for_teacher(state.db(), &exam_id, &teacher.id, fields)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
        .ok_or_else(|| ApiError::not_found("Exam"))?;

    Ok(Json(ExamResponse::from_db(exam)))
}

pub(super) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_for_teacher(state.db(), &exam_id, &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::not_found("Exam"));
    }

    tracing::info!(exam_id = %exam_id, teacher_id = %teacher.id, "exam deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn release_results(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    repositories::exams::release_results(state.db(), &exam_id, &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to release results"))?
        .ok_or_else(|| ApiError::not_found("Exam"))?;

    Ok(Json(MessageResponse::new("Results released")))
}
