use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::format_offset;
use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::exam::{ExamInstructionsResponse, ExamResponse};
use crate::schemas::submission::{CompletedExamResponse, StudentDashboardResponse};
use crate::services::availability::{classify, student_board};

pub(super) async fn dashboard(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<StudentDashboardResponse>, ApiError> {
    let exams = match student.class_name.as_deref() {
        Some(class_name) => repositories::exams::list_by_class(state.db(), class_name)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list exams"))?,
        None => Vec::new(),
    };
    let completed = repositories::submissions::list_completed_for_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    let submitted: HashSet<String> =
        completed.iter().map(|row| row.submission.exam_id.clone()).collect();
    let board = student_board(exams, &submitted, state.now(), Exam::window);

    Ok(Json(StudentDashboardResponse {
        available: board.available.into_iter().map(ExamResponse::from_db).collect(),
        upcoming: board.upcoming.into_iter().map(ExamResponse::from_db).collect(),
        completed: completed
            .into_iter()
            .map(|row| CompletedExamResponse {
                submission_id: row.submission.id,
                exam_id: row.submission.exam_id,
                exam_title: row.exam_title,
                end_time: row.submission.end_time.map(format_offset),
                results_released: !row.delay_results,
                score: row.submission.score.filter(|_| !row.delay_results),
            })
            .collect(),
    }))
}

pub(super) async fn instructions(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ExamInstructionsResponse>, ApiError> {
    let exam = super::class_exam(&state, &exam_id, &student).await?;
    let question_count = repositories::questions::count_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    let availability = classify(exam.window(), state.now());

    Ok(Json(ExamInstructionsResponse {
        exam: ExamResponse::from_db(exam),
        question_count,
        availability,
    }))
}
