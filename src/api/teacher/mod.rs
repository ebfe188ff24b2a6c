mod analytics;
mod exams;
mod questions;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::Exam;
use crate::repositories;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(analytics::dashboard))
        .route("/analytics/completion", get(analytics::completion))
        .route("/exams", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/exams/:exam_id",
            get(exams::get_exam).put(exams::update_exam).delete(exams::delete_exam),
        )
        .route("/exams/:exam_id/release-results", post(exams::release_results))
        .route("/exams/:exam_id/analytics", get(analytics::exam_analytics))
        .route("/exams/:exam_id/questions", post(questions::create_question))
        .route("/exams/:exam_id/questions/import", post(questions::import_questions))
        .route(
            "/questions/:question_id",
            put(questions::update_question).delete(questions::delete_question),
        )
}

/// Another teacher's exam is reported as missing.
async fn owned_exam(state: &AppState, exam_id: &str, teacher_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_for_teacher(state.db(), exam_id, teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::not_found("Exam"))
}
