use std::collections::{HashMap, HashSet};

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::db::models::{Exam, ExamSubmission, Question, StudentAnswer};
use crate::db::types::SubmissionStatus;
use crate::services::availability::is_open;
use crate::services::scoring::AnswerKey;

pub(crate) const ACTIVITY_FEED_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubmissionSummary {
    pub(crate) submission_id: String,
    pub(crate) student_id: String,
    pub(crate) score: Option<f64>,
    pub(crate) total_questions: usize,
    pub(crate) answered: usize,
    pub(crate) unanswered: usize,
    pub(crate) correct: usize,
    pub(crate) incorrect: usize,
    pub(crate) elapsed_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct QuestionSummary {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) correct_count: usize,
    pub(crate) incorrect_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ExamAnalytics {
    pub(crate) submissions: Vec<SubmissionSummary>,
    pub(crate) questions: Vec<QuestionSummary>,
    pub(crate) average_score: f64,
    pub(crate) completion_rate: f64,
}

/// Display keys by question id. Questions with a broken key are left out and
/// therefore never count as correct.
fn keys_by_question(questions: &[Question]) -> HashMap<&str, AnswerKey> {
    questions
        .iter()
        .filter_map(|question| {
            AnswerKey::from_question(question).ok().map(|key| (question.id.as_str(), key))
        })
        .collect()
}

fn is_answered(answer: &StudentAnswer) -> bool {
    !answer.answer_text.trim().is_empty()
}

pub(crate) fn elapsed(start: OffsetDateTime, end: Option<OffsetDateTime>) -> Option<Duration> {
    end.map(|end| end - start)
}

pub(crate) fn summarize_submission(
    submission: &ExamSubmission,
    questions: &[Question],
    answers: &[StudentAnswer],
) -> SubmissionSummary {
    let keys = keys_by_question(questions);
    let known: HashSet<&str> = questions.iter().map(|question| question.id.as_str()).collect();

    let mut answered = 0;
    let mut correct = 0;
    for answer in answers.iter().filter(|answer| known.contains(answer.question_id.as_str())) {
        if !is_answered(answer) {
            continue;
        }
        answered += 1;
        if keys
            .get(answer.question_id.as_str())
            .is_some_and(|key| key.matches(&answer.answer_text))
        {
            correct += 1;
        }
    }

    SubmissionSummary {
        submission_id: submission.id.clone(),
        student_id: submission.student_id.clone(),
        score: submission.score,
        total_questions: questions.len(),
        answered,
        unanswered: questions.len().saturating_sub(answered),
        correct,
        incorrect: answered - correct,
        elapsed_seconds: elapsed(submission.start_time, submission.end_time)
            .map(|duration| duration.whole_seconds()),
    }
}

/// Per-question correct/incorrect tallies over the given answers. Blank
/// answers are skipped.
pub(crate) fn summarize_questions(
    questions: &[Question],
    answers: &[StudentAnswer],
) -> Vec<QuestionSummary> {
    let keys = keys_by_question(questions);
    let mut tallies: HashMap<&str, (usize, usize)> = HashMap::new();

    for answer in answers.iter().filter(|answer| is_answered(answer)) {
        let hit = keys
            .get(answer.question_id.as_str())
            .is_some_and(|key| key.matches(&answer.answer_text));
        let entry = tallies.entry(answer.question_id.as_str()).or_default();
        if hit {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    questions
        .iter()
        .map(|question| {
            let (correct_count, incorrect_count) =
                tallies.get(question.id.as_str()).copied().unwrap_or_default();
            QuestionSummary {
                question_id: question.id.clone(),
                question_text: question.question_text.clone(),
                correct_count,
                incorrect_count,
            }
        })
        .collect()
}

pub(crate) fn average_score<I>(scores: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = scores
        .into_iter()
        .flatten()
        .fold((0.0, 0_u32), |(sum, count), score| (sum + score, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

pub(crate) fn completion_rate(students_submitted: i64, class_size: i64) -> f64 {
    if class_size <= 0 {
        return 0.0;
    }
    (students_submitted as f64 / class_size as f64 * 100.0).min(100.0)
}

/// `submissions` pairs each attempt with its answers; attempts still in
/// progress are ignored.
pub(crate) fn exam_analytics(
    questions: &[Question],
    submissions: &[(ExamSubmission, Vec<StudentAnswer>)],
    class_size: i64,
) -> ExamAnalytics {
    let submitted: Vec<_> = submissions
        .iter()
        .filter(|(submission, _)| submission.status == SubmissionStatus::Submitted)
        .collect();

    let summaries: Vec<_> = submitted
        .iter()
        .map(|(submission, answers)| summarize_submission(submission, questions, answers))
        .collect();

    let all_answers: Vec<StudentAnswer> =
        submitted.iter().flat_map(|(_, answers)| answers.iter().cloned()).collect();

    let students: HashSet<&str> =
        submitted.iter().map(|(submission, _)| submission.student_id.as_str()).collect();

    ExamAnalytics {
        average_score: average_score(summaries.iter().map(|summary| summary.score)),
        completion_rate: completion_rate(students.len() as i64, class_size),
        questions: summarize_questions(questions, &all_answers),
        submissions: summaries,
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DashboardEntry {
    pub(crate) exam: Exam,
    pub(crate) submission_count: i64,
    pub(crate) is_active: bool,
    pub(crate) completion_rate: f64,
}

/// Counts for one exam as loaded by the repository layer.
#[derive(Debug, Clone)]
pub(crate) struct ExamCounts {
    pub(crate) exam: Exam,
    /// Every attempt, in progress or submitted.
    pub(crate) submission_count: i64,
    pub(crate) submitted_students: i64,
    pub(crate) class_size: i64,
}

/// Newest exam first.
pub(crate) fn teacher_dashboard(rows: Vec<ExamCounts>, now: OffsetDateTime) -> Vec<DashboardEntry> {
    let mut entries: Vec<_> = rows
        .into_iter()
        .map(|row| DashboardEntry {
            is_active: is_open(row.exam.window(), now),
            completion_rate: completion_rate(row.submitted_students, row.class_size),
            submission_count: row.submission_count,
            exam: row.exam,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.exam.created_at.cmp(&a.exam.created_at).then_with(|| b.exam.id.cmp(&a.exam.id))
    });
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ActivityKind {
    ExamCreated,
    Submission,
    NewStudent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Activity {
    pub(crate) kind: ActivityKind,
    pub(crate) title: String,
    pub(crate) at: OffsetDateTime,
}

/// Merges the per-source event lists and keeps the newest few.
pub(crate) fn activity_feed<I>(sources: I) -> Vec<Activity>
where
    I: IntoIterator<Item = Vec<Activity>>,
{
    let mut merged: Vec<Activity> = sources.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.at.cmp(&a.at));
    merged.truncate(ACTIVITY_FEED_LEN);
    merged
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PlatformStats {
    pub(crate) total_users: i64,
    pub(crate) total_teachers: i64,
    pub(crate) total_students: i64,
    pub(crate) total_exams: i64,
    pub(crate) total_submissions: i64,
    pub(crate) average_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::QuestionType;
    use crate::services::scoring::fixtures::{answer, choice, free_text};
    use time::macros::datetime;

    fn submission(id: &str, student: &str, score: Option<f64>, status: SubmissionStatus) -> ExamSubmission {
        let submitted = status == SubmissionStatus::Submitted;
        ExamSubmission {
            id: id.to_string(),
            student_id: student.to_string(),
            exam_id: "exam".to_string(),
            start_time: datetime!(2025-03-01 10:00 +1),
            end_time: submitted.then_some(datetime!(2025-03-01 10:25 +1)),
            score,
            status,
        }
    }

    fn questions() -> Vec<Question> {
        vec![
            choice("q1", QuestionType::SingleChoice, 3, &[1]),
            choice("q2", QuestionType::MultipleChoice, 4, &[0, 3]),
            free_text("q3", "Paris"),
        ]
    }

    #[test]
    fn submission_summary_counts_and_elapsed_time() {
        let sub = submission("s1", "alice", Some(50.0), SubmissionStatus::Submitted);
        let answers = vec![answer("q1", "1"), answer("q2", "0"), answer("q3", " ")];

        let summary = summarize_submission(&sub, &questions(), &answers);

        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.answered, 2);
        assert_eq!(summary.unanswered, 1);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.elapsed_seconds, Some(25 * 60));
    }

    #[test]
    fn elapsed_is_undefined_without_end() {
        let sub = submission("s1", "alice", None, SubmissionStatus::InProgress);
        assert_eq!(summarize_submission(&sub, &questions(), &[]).elapsed_seconds, None);
    }

    #[test]
    fn question_summary_uses_display_rule() {
        let answers = vec![
            answer("q1", "1"),
            answer("q1", "2"),
            answer("q3", "PARIS"),
            answer("q3", "Rome"),
            answer("q2", ""),
        ];

        let summaries = summarize_questions(&questions(), &answers);

        assert_eq!(summaries[0].correct_count, 1);
        assert_eq!(summaries[0].incorrect_count, 1);
        assert_eq!((summaries[1].correct_count, summaries[1].incorrect_count), (0, 0));
        assert_eq!((summaries[2].correct_count, summaries[2].incorrect_count), (1, 1));
    }

    #[test]
    fn average_ignores_missing_scores() {
        assert_eq!(average_score([Some(40.0), None, Some(80.0)]), 60.0);
        assert_eq!(average_score(Vec::<Option<f64>>::new()), 0.0);
        assert_eq!(average_score([None, None]), 0.0);
    }

    #[test]
    fn completion_rate_handles_empty_class_and_caps() {
        assert_eq!(completion_rate(3, 0), 0.0);
        assert_eq!(completion_rate(1, 4), 25.0);
        assert_eq!(completion_rate(5, 4), 100.0);
    }

    #[test]
    fn empty_exam_has_zero_analytics() {
        let result = exam_analytics(&[], &[], 0);
        assert_eq!(result.average_score, 0.0);
        assert_eq!(result.completion_rate, 0.0);
        assert!(result.submissions.is_empty());
        assert!(result.questions.is_empty());
    }

    #[test]
    fn exam_analytics_only_counts_submitted_attempts() {
        let submissions = vec![
            (
                submission("s1", "alice", Some(100.0), SubmissionStatus::Submitted),
                vec![answer("q1", "1"), answer("q2", "0,3")],
            ),
            (
                submission("s2", "bob", Some(0.0), SubmissionStatus::Submitted),
                vec![answer("q1", "0")],
            ),
            (submission("s3", "carol", None, SubmissionStatus::InProgress), vec![answer("q1", "1")]),
        ];

        let result = exam_analytics(&questions(), &submissions, 4);

        assert_eq!(result.submissions.len(), 2);
        assert_eq!(result.average_score, 50.0);
        assert_eq!(result.completion_rate, 50.0);
        assert_eq!(result.questions[0].correct_count, 1);
        assert_eq!(result.questions[0].incorrect_count, 1);
    }

    fn exam(id: &str, created_minute: i64, end: Option<OffsetDateTime>) -> Exam {
        Exam {
            id: id.to_string(),
            title: format!("Exam {id}"),
            description: None,
            class_name: "JSS1".to_string(),
            duration_minutes: 30,
            start_time: None,
            end_time: end,
            teacher_id: "teacher".to_string(),
            randomize_questions: false,
            delay_results: false,
            created_at: datetime!(2025-02-01 08:00 +1) + Duration::minutes(created_minute),
        }
    }

    #[test]
    fn dashboard_orders_newest_first_with_rates() {
        let now = datetime!(2025-03-01 11:00 +1);
        let rows = vec![
            ExamCounts {
                exam: exam("old", 0, None),
                submission_count: 3,
                submitted_students: 2,
                class_size: 4,
            },
            ExamCounts {
                exam: exam("new", 10, Some(datetime!(2025-03-01 10:00 +1))),
                submission_count: 0,
                submitted_students: 0,
                class_size: 0,
            },
        ];

        let entries = teacher_dashboard(rows, now);

        assert_eq!(entries[0].exam.id, "new");
        assert!(!entries[0].is_active);
        assert_eq!(entries[0].completion_rate, 0.0);
        assert_eq!(entries[1].exam.id, "old");
        assert!(entries[1].is_active);
        assert_eq!(entries[1].completion_rate, 50.0);
        assert_eq!(entries[1].submission_count, 3);
    }

    #[test]
    fn feed_keeps_newest_five() {
        let event = |kind, minute: u8| Activity {
            kind,
            title: format!("event {minute}"),
            at: datetime!(2025-03-01 10:00 +1) + Duration::minutes(i64::from(minute)),
        };
        let exams = vec![event(ActivityKind::ExamCreated, 1), event(ActivityKind::ExamCreated, 9)];
        let submissions = vec![event(ActivityKind::Submission, 5), event(ActivityKind::Submission, 7)];
        let students = vec![
            event(ActivityKind::NewStudent, 2),
            event(ActivityKind::NewStudent, 8),
            event(ActivityKind::NewStudent, 3),
        ];

        let feed = activity_feed([exams, submissions, students]);

        let titles: Vec<_> = feed.iter().map(|activity| activity.title.as_str()).collect();
        assert_eq!(titles, vec!["event 9", "event 8", "event 7", "event 5", "event 3"]);
    }
}
