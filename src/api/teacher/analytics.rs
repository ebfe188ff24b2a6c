use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::state::AppState;
use crate::db::models::StudentAnswer;
use crate::repositories;
use crate::schemas::analytics::{
    ActivityResponse, DashboardExam, ExamAnalyticsResponse, SubmissionRow,
    TeacherCompletionResponse, TeacherDashboardResponse,
};
use crate::schemas::exam::ExamResponse;
use crate::services::analytics::{self, Activity, ActivityKind, ExamCounts, ACTIVITY_FEED_LEN};

pub(super) async fn dashboard(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<TeacherDashboardResponse>, ApiError> {
    let rows = repositories::exams::list_for_teacher_with_counts(state.db(), &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;
    let counts = rows
        .into_iter()
        .map(|row| ExamCounts {
            exam: row.exam,
            submission_count: row.submission_count,
            submitted_students: row.submitted_students,
            class_size: row.class_size,
        })
        .collect();
    let entries = analytics::teacher_dashboard(counts, state.now());

    let limit = ACTIVITY_FEED_LEN as i64;
    let created = repositories::exams::recent_for_teacher(state.db(), &teacher.id, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load recent exams"))?;
    let submitted = repositories::submissions::recent_for_teacher(state.db(), &teacher.id, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load recent submissions"))?;
    let joined =
        repositories::users::recent_students_in_teacher_classes(state.db(), &teacher.id, limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load recent students"))?;

    let feed = analytics::activity_feed([
        created
            .into_iter()
            .map(|(title, at)| Activity {
                kind: ActivityKind::ExamCreated,
                title: format!("Exam created: {title}"),
                at,
            })
            .collect::<Vec<_>>(),
        submitted
            .into_iter()
            .map(|(student, exam, at)| Activity {
                kind: ActivityKind::Submission,
                title: format!("{student} submitted {exam}"),
                at,
            })
            .collect::<Vec<_>>(),
        joined
            .into_iter()
            .map(|(student, at)| Activity {
                kind: ActivityKind::NewStudent,
                title: format!("New student: {student}"),
                at,
            })
            .collect::<Vec<_>>(),
    ]);

    Ok(Json(TeacherDashboardResponse {
        exams: entries.into_iter().map(DashboardExam::from_entry).collect(),
        activities: feed.into_iter().map(ActivityResponse::from_activity).collect(),
    }))
}

/// Distinct students who submitted any of the teacher's exams against all
/// students in the classes those exams target.
pub(super) async fn completion(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<TeacherCompletionResponse>, ApiError> {
    let students_submitted =
        repositories::submissions::count_students_submitted_for_teacher(state.db(), &teacher.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count submissions"))?;
    let students_in_classes =
        repositories::users::count_students_in_teacher_classes(state.db(), &teacher.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    Ok(Json(TeacherCompletionResponse {
        students_submitted,
        students_in_classes,
        completion_rate: analytics::completion_rate(students_submitted, students_in_classes),
    }))
}

pub(super) async fn exam_analytics(
    Path(exam_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<ExamAnalyticsResponse>, ApiError> {
    let exam = super::owned_exam(&state, &exam_id, &teacher.id).await?;

    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let submissions = repositories::submissions::list_by_exam_with_student(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;
    let answers = repositories::answers::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;
    let class_size = repositories::users::count_students_in_class(state.db(), &exam.class_name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    let mut by_submission: HashMap<String, Vec<StudentAnswer>> = HashMap::new();
    for answer in answers {
        by_submission.entry(answer.submission_id.clone()).or_default().push(answer);
    }

    let names: HashMap<String, String> = submissions
        .iter()
        .map(|row| (row.submission.id.clone(), row.student_name.clone()))
        .collect();
    let attempts: Vec<_> = submissions
        .into_iter()
        .map(|row| {
            let answers = by_submission.remove(&row.submission.id).unwrap_or_default();
            (row.submission, answers)
        })
        .collect();

    let report = analytics::exam_analytics(&questions, &attempts, class_size);

    Ok(Json(ExamAnalyticsResponse {
        exam: ExamResponse::from_db(exam),
        submissions: report
            .submissions
            .into_iter()
            .map(|summary| SubmissionRow {
                student_name: names.get(&summary.submission_id).cloned().unwrap_or_default(),
                summary,
            })
            .collect(),
        questions: report.questions,
        average_score: report.average_score,
        completion_rate: report.completion_rate,
    }))
}
