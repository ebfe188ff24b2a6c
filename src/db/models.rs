use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::types::{
    AccountStatus, CorrectAnswer, QuestionOption, QuestionType, SubmissionStatus, UserRole,
};
use crate::services::availability::ExamWindow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) fullname: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) status: AccountStatus,
    pub(crate) class_name: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) profile_image: Option<String>,
    pub(crate) created_at: OffsetDateTime,
}

impl User {
    pub(crate) fn is_approved(&self) -> bool {
        self.status == AccountStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) class_name: String,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: Option<OffsetDateTime>,
    pub(crate) end_time: Option<OffsetDateTime>,
    pub(crate) teacher_id: String,
    pub(crate) randomize_questions: bool,
    pub(crate) delay_results: bool,
    pub(crate) created_at: OffsetDateTime,
}

impl Exam {
    pub(crate) fn window(&self) -> ExamWindow {
        ExamWindow { start: self.start_time, end: self.end_time }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) image_ref: Option<String>,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Json<Vec<QuestionOption>>,
    pub(crate) correct_answer: Json<CorrectAnswer>,
    pub(crate) created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSubmission {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) exam_id: String,
    pub(crate) start_time: OffsetDateTime,
    pub(crate) end_time: Option<OffsetDateTime>,
    pub(crate) score: Option<f64>,
    pub(crate) status: SubmissionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentAnswer {
    pub(crate) id: String,
    pub(crate) submission_id: String,
    pub(crate) question_id: String,
    pub(crate) answer_text: String,
    pub(crate) updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct PasswordResetToken {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) token_hash: String,
    pub(crate) expires_at: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
}
