use std::collections::HashSet;

use serde::Serialize;
use time::OffsetDateTime;

/// Optional start/end bounds of an exam. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ExamWindow {
    pub(crate) start: Option<OffsetDateTime>,
    pub(crate) end: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Availability {
    Open,
    Upcoming,
    Closed,
}

/// `OffsetDateTime` compares instants, so mixed offsets are safe here.
pub(crate) fn is_open(window: ExamWindow, now: OffsetDateTime) -> bool {
    let started = window.start.map_or(true, |start| start <= now);
    let not_ended = window.end.map_or(true, |end| now <= end);
    started && not_ended
}

pub(crate) fn is_upcoming(window: ExamWindow, now: OffsetDateTime) -> bool {
    window.start.is_some_and(|start| start > now)
}

pub(crate) fn classify(window: ExamWindow, now: OffsetDateTime) -> Availability {
    if is_upcoming(window, now) {
        Availability::Upcoming
    } else if is_open(window, now) {
        Availability::Open
    } else {
        Availability::Closed
    }
}

#[derive(Debug)]
pub(crate) struct StudentBoard<T> {
    pub(crate) available: Vec<T>,
    pub(crate) upcoming: Vec<T>,
}

/// Splits a student's class exams into takeable and future ones. Exams the
/// student already submitted never show up as available.
pub(crate) fn student_board<T, W>(
    exams: Vec<T>,
    submitted_exam_ids: &HashSet<String>,
    now: OffsetDateTime,
    window_of: W,
) -> StudentBoard<T>
where
    T: HasExamId,
    W: Fn(&T) -> ExamWindow,
{
    let mut board = StudentBoard { available: Vec::new(), upcoming: Vec::new() };

    for exam in exams {
        match classify(window_of(&exam), now) {
            Availability::Open if !submitted_exam_ids.contains(exam.exam_id()) => {
                board.available.push(exam);
            }
            Availability::Upcoming => board.upcoming.push(exam),
            _ => {}
        }
    }

    board
}

pub(crate) trait HasExamId {
    fn exam_id(&self) -> &str;
}

impl HasExamId for crate::db::models::Exam {
    fn exam_id(&self) -> &str {
        &self.id
    }
}
