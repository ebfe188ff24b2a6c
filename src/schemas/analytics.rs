use serde::Serialize;

use crate::core::time::format_offset;
use crate::schemas::exam::ExamResponse;
use crate::services::analytics::{
    Activity, ActivityKind, DashboardEntry, QuestionSummary, SubmissionSummary,
};

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionRow {
    pub(crate) student_name: String,
    #[serde(flatten)]
    pub(crate) summary: SubmissionSummary,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamAnalyticsResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) submissions: Vec<SubmissionRow>,
    pub(crate) questions: Vec<QuestionSummary>,
    pub(crate) average_score: f64,
    pub(crate) completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardExam {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) submission_count: i64,
    pub(crate) is_active: bool,
    pub(crate) completion_rate: f64,
}

impl DashboardExam {
    pub(crate) fn from_entry(entry: DashboardEntry) -> Self {
        Self {
            exam: ExamResponse::from_db(entry.exam),
            submission_count: entry.submission_count,
            is_active: entry.is_active,
            completion_rate: entry.completion_rate,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivityResponse {
    pub(crate) kind: ActivityKind,
    pub(crate) title: String,
    pub(crate) time: String,
}

impl ActivityResponse {
    pub(crate) fn from_activity(activity: Activity) -> Self {
        Self { kind: activity.kind, title: activity.title, time: format_offset(activity.at) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherDashboardResponse {
    pub(crate) exams: Vec<DashboardExam>,
    pub(crate) activities: Vec<ActivityResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherCompletionResponse {
    pub(crate) students_submitted: i64,
    pub(crate) students_in_classes: i64,
    pub(crate) completion_rate: f64,
}
