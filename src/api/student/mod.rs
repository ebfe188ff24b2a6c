mod dashboard;
mod results;
mod session;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{Exam, User};
use crate::repositories;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/exams/:exam_id/instructions", get(dashboard::instructions))
        .route("/exams/:exam_id/start", post(session::start_exam))
        .route("/exams/:exam_id/answers", put(session::save_answer))
        .route("/exams/:exam_id/submit", post(session::submit_exam))
        .route("/exams/:exam_id/results", get(results::exam_results))
}

/// Exams of other classes are reported as missing.
async fn class_exam(state: &AppState, exam_id: &str, student: &User) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::not_found("Exam"))?;

    if student.class_name.as_deref() != Some(exam.class_name.as_str()) {
        return Err(ApiError::not_found("Exam"));
    }
    Ok(exam)
}
