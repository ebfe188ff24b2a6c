use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::schemas::submission::{ResultQuestion, ResultResponse, SubmissionResponse};
use crate::services::analytics::summarize_submission;
use crate::services::scoring;

pub(super) async fn exam_results(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let exam = super::class_exam(&state, &exam_id, &student).await?;

    let submission =
        repositories::submissions::find_for_student_exam(state.db(), &student.id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
            .filter(|submission| submission.status == SubmissionStatus::Submitted)
            .ok_or_else(|| ApiError::BadRequest("Exam has not been submitted".to_string()))?;

    if exam.delay_results {
        return Err(ApiError::Forbidden("Results have not been released yet"));
    }

    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let answers = repositories::answers::list_by_submission(state.db(), &submission.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;

    let summary = summarize_submission(&submission, &questions, &answers);
    let by_question: HashMap<&str, &str> = answers
        .iter()
        .filter(|answer| !answer.answer_text.trim().is_empty())
        .map(|answer| (answer.question_id.as_str(), answer.answer_text.as_str()))
        .collect();

    let breakdown = questions
        .iter()
        .map(|question| {
            let answer_text = by_question.get(question.id.as_str()).copied();
            ResultQuestion {
                question_id: question.id.clone(),
                question_text: question.question_text.clone(),
                question_type: question.question_type,
                options: question.options.0.iter().map(|option| option.text.clone()).collect(),
                answer_text: answer_text.map(str::to_string),
                is_correct: answer_text.is_some_and(|text| scoring::is_correct(question, text)),
            }
        })
        .collect();

    Ok(Json(ResultResponse {
        submission: SubmissionResponse::from_db(submission, true),
        exam_title: exam.title,
        total_questions: summary.total_questions,
        answered: summary.answered,
        unanswered: summary.unanswered,
        correct: summary.correct,
        incorrect: summary.incorrect,
        elapsed_seconds: summary.elapsed_seconds,
        questions: breakdown,
    }))
}
