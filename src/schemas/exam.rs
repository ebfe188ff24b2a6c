use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_offset;
use crate::db::models::Exam;
use crate::schemas::deserialize_option_datetime;
use crate::schemas::question::QuestionResponse;
use crate::services::availability::{Availability, ExamWindow};

/// Body of both exam create and exam edit; edit replaces every field.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamPayload {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "class")]
    #[validate(length(min = 1, message = "class must not be empty"))]
    pub(crate) class_name: String,
    #[serde(alias = "duration")]
    #[validate(range(min = 1, message = "duration must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) end_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub(crate) randomize_questions: bool,
    #[serde(default)]
    pub(crate) delay_results: bool,
}

impl ExamPayload {
    pub(crate) fn window(&self) -> ExamWindow {
        ExamWindow { start: self.start_time, end: self.end_time }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    #[serde(rename = "class")]
    pub(crate) class_name: String,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) teacher_id: String,
    pub(crate) randomize_questions: bool,
    pub(crate) delay_results: bool,
    pub(crate) created_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            class_name: exam.class_name,
            duration_minutes: exam.duration_minutes,
            start_time: exam.start_time.map(format_offset),
            end_time: exam.end_time.map(format_offset),
            teacher_id: exam.teacher_id,
            randomize_questions: exam.randomize_questions,
            delay_results: exam.delay_results,
            created_at: format_offset(exam.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamDetailResponse {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

/// What a student sees before starting.
#[derive(Debug, Serialize)]
pub(crate) struct ExamInstructionsResponse {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) question_count: i64,
    pub(crate) availability: Availability,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn payload_reads_naive_times_in_canonical_zone() {
        let payload: ExamPayload = serde_json::from_value(serde_json::json!({
            "title": "Algebra",
            "class": "JSS2",
            "duration": 45,
            "start_time": "2025-03-01T10:00",
            "end_time": "2025-03-01T12:00:00+01:00"
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        assert_eq!(payload.start_time, Some(datetime!(2025-03-01 10:00 +1)));
        assert_eq!(payload.window().end, Some(datetime!(2025-03-01 11:00 UTC)));
        assert!(!payload.randomize_questions);
    }

    #[test]
    fn non_positive_duration_is_invalid() {
        let payload: ExamPayload = serde_json::from_value(serde_json::json!({
            "title": "Algebra",
            "class_name": "JSS2",
            "duration_minutes": 0
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
