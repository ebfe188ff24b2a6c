use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_offset;
use crate::db::models::{ExamSubmission, StudentAnswer};
use crate::db::types::{QuestionType, SubmissionStatus};
use crate::schemas::exam::ExamResponse;
use crate::schemas::question::StudentQuestion;

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) submission_id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) start_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) questions: Vec<StudentQuestion>,
    /// Saved answer text by question id.
    pub(crate) answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveAnswerRequest {
    pub(crate) question_id: String,
    #[serde(default)]
    pub(crate) answer_text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SavedAnswerResponse {
    pub(crate) question_id: String,
    pub(crate) answer_text: String,
    pub(crate) updated_at: String,
}

impl SavedAnswerResponse {
    pub(crate) fn from_db(answer: StudentAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            answer_text: answer.answer_text,
            updated_at: format_offset(answer.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    /// Hidden while the exam's results are held back.
    pub(crate) score: Option<f64>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: ExamSubmission, reveal_score: bool) -> Self {
        Self {
            id: submission.id,
            exam_id: submission.exam_id,
            status: submission.status,
            start_time: format_offset(submission.start_time),
            end_time: submission.end_time.map(format_offset),
            score: submission.score.filter(|_| reveal_score),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultQuestion {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) submission: SubmissionResponse,
    pub(crate) exam_title: String,
    pub(crate) total_questions: usize,
    pub(crate) answered: usize,
    pub(crate) unanswered: usize,
    pub(crate) correct: usize,
    pub(crate) incorrect: usize,
    pub(crate) elapsed_seconds: Option<i64>,
    pub(crate) questions: Vec<ResultQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletedExamResponse {
    pub(crate) submission_id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) end_time: Option<String>,
    pub(crate) results_released: bool,
    pub(crate) score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentDashboardResponse {
    pub(crate) available: Vec<ExamResponse>,
    pub(crate) upcoming: Vec<ExamResponse>,
    pub(crate) completed: Vec<CompletedExamResponse>,
}
