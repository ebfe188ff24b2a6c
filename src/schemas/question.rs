use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_offset;
use crate::db::models::Question;
use crate::db::types::{CorrectAnswer, QuestionOption, QuestionType};
use crate::services::question_bank::ImportRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    #[serde(default)]
    pub(crate) image_ref: Option<String>,
    #[serde(default)]
    pub(crate) options: Vec<QuestionOption>,
    /// Reference answer of a free-text question.
    #[serde(default)]
    pub(crate) reference_answer: Option<String>,
}

/// The question type is fixed once created.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    #[serde(default)]
    pub(crate) image_ref: Option<String>,
    #[serde(default)]
    pub(crate) options: Vec<QuestionOption>,
    #[serde(default)]
    pub(crate) reference_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionImportRequest {
    pub(crate) rows: Vec<ImportRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionImportResponse {
    pub(crate) imported: usize,
}

/// Teacher view, including the answer key.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) image_ref: Option<String>,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) correct_answer: CorrectAnswer,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            question_text: question.question_text,
            image_ref: question.image_ref,
            question_type: question.question_type,
            options: question.options.0,
            correct_answer: question.correct_answer.0,
            created_at: format_offset(question.created_at),
        }
    }
}

/// Student view: option texts only, no key.
#[derive(Debug, Serialize)]
pub(crate) struct StudentQuestion {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) image_ref: Option<String>,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<String>,
}

impl StudentQuestion {
    pub(crate) fn from_db(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            image_ref: question.image_ref.clone(),
            question_type: question.question_type,
            options: question.options.0.iter().map(|option| option.text.clone()).collect(),
        }
    }
}
